//! Byte offset to line/column mapping, and positioned error accumulation.
//!
//! Every source document gets an [`Info`] built once from its text. Errors
//! found while walking a document are pushed into an [`ErrorList`] keyed by
//! byte offset, and resolved to `file:line:col` only when the list is turned
//! into [`Diagnostics`]. This keeps reports in document order regardless of
//! the order in which the tree walk discovered them.

use std::fmt;

/// Human-readable location inside a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
  /// Name of the file. May be empty.
  pub file:   String,
  pub line:   usize,
  pub column: usize,
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if !self.file.is_empty() {
      write!(f, "{}:", self.file)?;
    }
    write!(f, "{}:{}", self.line, self.column)
  }
}

/// Line index for a single source document.
#[derive(Debug, Clone)]
pub struct Info {
  file:  String,
  size:  usize,
  // Offsets at which each line starts. Never empty; lines[0] == 0.
  lines: Vec<usize>,
}

impl Info {
  /// Builds the line index for `src`.
  #[must_use]
  pub fn from_content(filename: impl Into<String>, src: &str) -> Self {
    let mut lines = vec![0];
    lines.extend(
      src
        .bytes()
        .enumerate()
        .filter(|&(idx, b)| b == b'\n' && idx + 1 < src.len())
        .map(|(idx, _)| idx + 1),
    );
    Self {
      file: filename.into(),
      size: src.len(),
      lines,
    }
  }

  #[must_use]
  pub fn filename(&self) -> &str {
    &self.file
  }

  /// Resolves a byte offset to a [`Position`].
  ///
  /// # Panics
  ///
  /// Panics if `offset` lies outside the document. Offsets are derived from
  /// the parser's own source positions, so this only fires on a bug.
  #[must_use]
  #[allow(clippy::panic, reason = "out-of-range offsets are programming errors")]
  pub fn position(&self, offset: usize) -> Position {
    if offset == 0 {
      return Position {
        file:   self.file.clone(),
        line:   1,
        column: 1,
      };
    }
    if offset >= self.size {
      panic!("offset {offset} is out of bounds [0, {})", self.size);
    }

    match self.lines.binary_search(&offset) {
      Ok(idx) => {
        Position {
          file:   self.file.clone(),
          line:   idx + 1,
          column: 1,
        }
      },
      // lines[0] == 0 and offset > 0, so idx >= 1.
      Err(idx) => {
        Position {
          file:   self.file.clone(),
          line:   idx,
          column: offset - self.lines[idx - 1] + 1,
        }
      },
    }
  }

  /// Converts a 1-based line and column (as reported by comrak) back to a
  /// byte offset. Line 0 marks a synthesized node and maps to offset 0.
  #[must_use]
  pub fn offset(&self, line: usize, column: usize) -> usize {
    if line == 0 || self.size == 0 {
      return 0;
    }
    let start = self
      .lines
      .get(line - 1)
      .copied()
      .unwrap_or_else(|| self.lines.last().copied().unwrap_or(0));
    (start + column.saturating_sub(1)).min(self.size - 1)
  }
}

/// A message attached to a resolved position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub position: Position,
  pub message:  String,
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.position, self.message)
  }
}

/// One or more positioned errors, sorted by their location in the source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
  #[must_use]
  pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
    self.0.iter()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for Diagnostics {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, diag) in self.0.iter().enumerate() {
      if idx > 0 {
        f.write_str("\n")?;
      }
      write!(f, "{diag}")?;
    }
    Ok(())
  }
}

/// Mutable collection of errors keyed by byte offset into one document.
#[derive(Debug)]
pub struct ErrorList<'i> {
  info: &'i Info,
  errs: Vec<(usize, String)>,
}

impl<'i> ErrorList<'i> {
  #[must_use]
  pub const fn new(info: &'i Info) -> Self {
    Self {
      info,
      errs: Vec::new(),
    }
  }

  /// Records `msg` at `offset`.
  pub fn push(&mut self, offset: usize, msg: impl fmt::Display) {
    self.errs.push((offset, msg.to_string()));
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.errs.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.errs.is_empty()
  }

  /// Returns every recorded error sorted by offset, or `Ok` if none were
  /// recorded. Errors at the same offset keep their push order.
  pub fn into_result(mut self) -> Result<(), Diagnostics> {
    if self.errs.is_empty() {
      return Ok(());
    }
    self.errs.sort_by_key(|&(offset, _)| offset);
    let info = self.info;
    Err(Diagnostics(
      self
        .errs
        .into_iter()
        .map(|(offset, message)| {
          Diagnostic {
            position: info.position(offset),
            message,
          }
        })
        .collect(),
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn position_maps_line_starts_and_columns() {
    let info = Info::from_content("foo.md", "ab\ncde\n\nf");
    assert_eq!(info.position(0).to_string(), "foo.md:1:1");
    assert_eq!(info.position(1).to_string(), "foo.md:1:2");
    assert_eq!(info.position(3).to_string(), "foo.md:2:1");
    assert_eq!(info.position(5).to_string(), "foo.md:2:3");
    assert_eq!(info.position(7).to_string(), "foo.md:3:1");
    assert_eq!(info.position(8).to_string(), "foo.md:4:1");
  }

  #[test]
  fn position_without_filename() {
    let info = Info::from_content("", "hello\nworld");
    assert_eq!(info.position(7).to_string(), "2:2");
  }

  #[test]
  fn empty_document_offset_zero() {
    let info = Info::from_content("empty.md", "");
    assert_eq!(info.position(0).to_string(), "empty.md:1:1");
    assert_eq!(info.offset(1, 1), 0);
  }

  #[test]
  #[should_panic(expected = "out of bounds")]
  fn position_out_of_range_panics() {
    let info = Info::from_content("foo.md", "abc");
    let _ = info.position(3);
  }

  #[test]
  fn offset_round_trips_with_position() {
    let src = "# Title\n\n- [foo](foo.md)\n";
    let info = Info::from_content("summary.md", src);
    let offset = info.offset(3, 3);
    assert_eq!(&src[offset..=offset], "[");
    let pos = info.position(offset);
    assert_eq!((pos.line, pos.column), (3, 3));
  }

  #[test]
  fn error_list_sorts_by_offset() {
    let info = Info::from_content("a.md", "one\ntwo\nthree\n");
    let mut errs = ErrorList::new(&info);
    errs.push(8, "third");
    errs.push(0, "first");
    errs.push(4, "second");
    errs.push(0, "first again");
    assert_eq!(errs.len(), 4);

    let err = errs.into_result().expect_err("errors were pushed");
    assert_eq!(
      err.to_string(),
      "a.md:1:1:first\na.md:1:1:first again\na.md:2:1:second\na.md:3:1:third"
    );
  }

  #[test]
  fn empty_error_list_is_ok() {
    let info = Info::from_content("a.md", "x");
    assert!(ErrorList::new(&info).into_result().is_ok());
  }
}
