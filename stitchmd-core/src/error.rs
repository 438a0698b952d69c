use std::{fmt, io};

use thiserror::Error;

use crate::pos::Diagnostics;

/// Errors that can occur while stitching a summary into one document.
#[derive(Debug, Error)]
pub enum StitchError {
  /// The summary document does not follow the table-of-contents grammar.
  #[error("error parsing summary\n{0}")]
  Summary(Diagnostics),

  /// One or more files referenced by the summary could not be collected.
  #[error("error reading markdown\n{0}")]
  Collect(Diagnostics),

  #[error(transparent)]
  Render(#[from] RenderError),
}

impl StitchError {
  /// Positioned diagnostics carried by this error, if any.
  #[must_use]
  pub const fn diagnostics(&self) -> Option<&Diagnostics> {
    match self {
      Self::Summary(diags) | Self::Collect(diags) => Some(diags),
      Self::Render(_) => None,
    }
  }
}

/// Failure while serializing Markdown or writing it out.
#[derive(Debug, Error)]
pub enum RenderError {
  #[error("format markdown: {0}")]
  Format(#[from] fmt::Error),

  #[error("write output: {0}")]
  Io(#[from] io::Error),
}

/// Errors from a [`FileReader`](crate::fs::FileReader).
#[derive(Debug, Error)]
pub enum FsError {
  #[error("open {0}: file does not exist")]
  NotFound(String),

  #[error("invalid path {0:?}; did you mean to use --unsafe?")]
  InvalidPath(String),

  #[error("open {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: io::Error,
  },
}

/// Result type for stitching operations.
pub type Result<T> = std::result::Result<T, StitchError>;
