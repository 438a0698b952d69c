//! Lexical operations on slash-separated paths.
//!
//! Files are addressed by slash paths relative to the reader root no matter
//! what the host uses, so these helpers never touch the filesystem.

use std::path::MAIN_SEPARATOR;

/// Converts host separators to `/`.
#[must_use]
pub fn to_slash(path: &str) -> String {
  if MAIN_SEPARATOR == '/' {
    path.to_owned()
  } else {
    path.replace(MAIN_SEPARATOR, "/")
  }
}

/// Shortest equivalent of `path`: collapses repeated slashes, drops `.`
/// elements and resolves `..` against preceding elements where possible.
/// Leading `..` elements of a relative path are kept. An empty result is `.`.
#[must_use]
pub fn clean(path: &str) -> String {
  let rooted = path.starts_with('/');
  let mut parts: Vec<&str> = Vec::new();
  for part in path.split('/') {
    match part {
      "" | "." => {},
      ".." => {
        match parts.last() {
          Some(&last) if last != ".." => {
            parts.pop();
          },
          // `/..` is `/`.
          _ if rooted => {},
          _ => parts.push(".."),
        }
      },
      _ => parts.push(part),
    }
  }

  let joined = parts.join("/");
  match (rooted, joined.is_empty()) {
    (true, _) => format!("/{joined}"),
    (false, true) => ".".to_owned(),
    (false, false) => joined,
  }
}

/// Joins non-empty elements with `/` and cleans the result. Returns an empty
/// string if every element is empty.
#[must_use]
pub fn join(parts: &[&str]) -> String {
  let parts: Vec<&str> = parts.iter().copied().filter(|p| !p.is_empty()).collect();
  if parts.is_empty() {
    return String::new();
  }
  clean(&parts.join("/"))
}

/// Everything but the last element of `path`, cleaned. `.` if there is no
/// directory part.
#[must_use]
pub fn dirname(path: &str) -> String {
  match path.rfind('/') {
    Some(idx) => clean(&path[..=idx]),
    None => ".".to_owned(),
  }
}
