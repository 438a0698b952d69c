use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

/// When to color diff output.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
  /// Color if stdout is a terminal and the environment allows it
  #[default]
  Auto,
  Always,
  Never,
}

/// Command line interface for stitchmd
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "Stitch together a single Markdown file from a summary of other files"
)]
pub struct Cli {
  /// Summary file listing the files to stitch, or "-" for stdin
  pub input: String,

  /// Write the output here instead of stdout ("-" means stdout)
  #[arg(short, long)]
  pub output: Option<PathBuf>,

  /// Resolve links in the summary relative to this directory. Defaults to
  /// the directory of the summary, or the current directory for stdin
  #[arg(short = 'C', long)]
  pub dir: Option<PathBuf>,

  /// Write the contents of this file before the output
  #[arg(long)]
  pub preface: Option<PathBuf>,

  /// Shift every heading level by this much (may be negative)
  #[arg(long, allow_negative_numbers = true)]
  pub offset: Option<i32>,

  /// Don't render the summary's table of contents
  #[arg(long)]
  pub no_toc: bool,

  /// Allow links that lead outside the input directory
  #[arg(long = "unsafe")]
  pub unsafe_paths: bool,

  /// Print a diff against the output file instead of writing it
  #[arg(short, long)]
  pub diff: bool,

  /// Color the diff output
  #[arg(long, value_enum)]
  pub color: Option<ColorChoice>,

  /// Path to a configuration file (TOML or JSON)
  #[arg(short = 'c', long)]
  pub config: Option<PathBuf>,

  /// Enable verbose debug logging
  #[arg(short, long)]
  pub verbose: bool,
}

impl Cli {
  /// Parse command line arguments into a [`Cli`] struct.
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }

  /// Whether the summary is read from stdin.
  #[must_use]
  pub fn reads_stdin(&self) -> bool {
    self.input == "-"
  }
}
