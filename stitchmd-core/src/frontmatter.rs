//! Per-file options read from a YAML front matter block.

use serde::Deserialize;

/// Options a Markdown file can set for itself.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
  /// Splice this file's own heading outline into the parent TOC.
  pub absorb: bool,
}

impl FrontMatter {
  /// Decodes a raw front matter block as captured by the parser, including
  /// its `---` delimiter lines. Unknown keys are ignored.
  ///
  /// # Errors
  ///
  /// Returns the YAML error if the block is not a valid mapping.
  pub fn parse(raw: &str) -> Result<Self, serde_yaml::Error> {
    let body = strip_delimiters(raw);
    if body.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(body)
  }
}

fn strip_delimiters(raw: &str) -> &str {
  let raw = raw.trim_end();
  let raw = raw.strip_prefix("---").unwrap_or(raw);
  let raw = raw.strip_suffix("---").unwrap_or(raw);
  raw
}
