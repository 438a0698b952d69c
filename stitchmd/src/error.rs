use std::{io, path::PathBuf};

use stitchmd_core::StitchError;
use thiserror::Error;

/// Top-level error type for the stitchmd command.
#[derive(Debug, Error)]
pub enum CliError {
  #[error("cannot use -d without -o")]
  DiffWithoutOutput,

  #[error("--preface: {0}")]
  Preface(String),

  #[error("directory does not exist: {}", .0.display())]
  MissingDir(PathBuf),

  #[error("read input: {0}")]
  Input(#[source] io::Error),

  #[error("write output: {0}")]
  Output(#[source] io::Error),

  #[error(transparent)]
  Stitch(#[from] StitchError),

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}
