//! Link destinations that point at local files.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

// Characters escaped when a rewritten path is written back into a link.
const PATH: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'#')
  .add(b'%')
  .add(b'<')
  .add(b'>')
  .add(b'?')
  .add(b'`')
  .add(b'{')
  .add(b'}');

/// A relative link destination split into its parts.
///
/// `path` is percent-decoded; `query` and `fragment` are kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
  pub path:     String,
  pub query:    Option<String>,
  pub fragment: Option<String>,
}

impl Reference {
  /// Splits a link destination, or returns `None` for destinations that
  /// must be left alone: anything with a scheme or a host, and paths with
  /// invalid percent escapes.
  #[must_use]
  pub fn parse(dest: &str) -> Option<Self> {
    match url::Url::parse(dest) {
      Err(url::ParseError::RelativeUrlWithoutBase) => {},
      Ok(_) | Err(_) => return None,
    }
    if dest.starts_with("//") {
      return None;
    }

    let (rest, fragment) = match dest.split_once('#') {
      Some((rest, frag)) => (rest, Some(frag.to_owned())),
      None => (dest, None),
    };
    let (path, query) = match rest.split_once('?') {
      Some((path, query)) => (path, Some(query.to_owned())),
      None => (rest, None),
    };
    let path = percent_decode_str(path).decode_utf8().ok()?.into_owned();

    Some(Self {
      path,
      query,
      fragment,
    })
  }

  /// The fragment with percent escapes decoded, falling back to the raw
  /// text if it isn't valid UTF-8 once decoded.
  #[must_use]
  pub fn decoded_fragment(&self) -> Option<String> {
    self.fragment.as_deref().map(|frag| {
      percent_decode_str(frag)
        .decode_utf8()
        .map_or_else(|_| frag.to_owned(), std::borrow::Cow::into_owned)
    })
  }
}

impl fmt::Display for Reference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", utf8_percent_encode(&self.path, PATH))?;
    if let Some(query) = &self.query {
      write!(f, "?{query}")?;
    }
    if let Some(fragment) = &self.fragment {
      write!(f, "#{fragment}")?;
    }
    Ok(())
  }
}
