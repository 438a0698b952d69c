use std::{
  fs,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::{
  cli::{Cli, ColorChoice},
  error::CliError,
};

const fn default_offset() -> i32 {
  0
}

const fn default_color() -> ColorChoice {
  ColorChoice::Auto
}

/// Configuration options for stitchmd
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  /// File written verbatim before the output
  #[serde(default)]
  pub preface: Option<PathBuf>,

  /// Output file. Stdout if unset
  #[serde(default)]
  pub output: Option<PathBuf>,

  /// Directory that summary links resolve against
  #[serde(default)]
  pub dir: Option<PathBuf>,

  /// Flat heading level offset
  #[serde(default = "default_offset")]
  pub offset: i32,

  /// Leave the table of contents out of the output
  #[serde(default)]
  pub no_toc: bool,

  /// Allow links leading outside `dir`
  #[serde(default)]
  pub unsafe_paths: bool,

  /// When to color diff output
  #[serde(default = "default_color")]
  pub color: ColorChoice,

  /// Print a diff instead of writing the output. Command line only.
  #[serde(skip)]
  pub diff: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      preface:      None,
      output:       None,
      dir:          None,
      offset:       default_offset(),
      no_toc:       false,
      unsafe_paths: false,
      color:        default_color(),
      diff:         false,
    }
  }
}

impl Config {
  /// Create a new configuration from a file.
  /// Only TOML and JSON are supported.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| {
      format!("Failed to read config file: {}", path.display())
    })?;

    let ext = path
      .extension()
      .and_then(|ext| ext.to_str())
      .map(str::to_lowercase);
    match ext.as_deref() {
      Some("json") => {
        serde_json::from_str(&content).with_context(|| {
          format!("Failed to parse JSON config from {}", path.display())
        })
      },
      Some("toml") => {
        toml::from_str(&content).with_context(|| {
          format!("Failed to parse TOML config from {}", path.display())
        })
      },
      Some(_) => bail!("Unsupported config file format: {}", path.display()),
      None => bail!("Config file has no extension: {}", path.display()),
    }
  }

  /// Load config from a file, if any, and apply command line arguments on
  /// top of it.
  pub fn load(cli: &Cli) -> Result<Self> {
    let mut config = if let Some(path) = &cli.config {
      Self::from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else if let Some(path) = Self::find_config_file() {
      log::debug!("Using discovered config file: {}", path.display());
      Self::from_file(&path).with_context(|| {
        format!("Failed to load discovered config from {}", path.display())
      })?
    } else {
      Self::default()
    };

    config.merge_with_cli(cli);
    Ok(config)
  }

  /// Merge CLI arguments into this config, prioritizing CLI values when
  /// present.
  pub fn merge_with_cli(&mut self, cli: &Cli) {
    if let Some(preface) = &cli.preface {
      self.preface = Some(preface.clone());
    }
    if let Some(output) = &cli.output {
      self.output = Some(output.clone());
    }
    if let Some(dir) = &cli.dir {
      self.dir = Some(dir.clone());
    }
    if let Some(offset) = cli.offset {
      self.offset = offset;
    }
    if let Some(color) = cli.color {
      self.color = color;
    }
    self.no_toc |= cli.no_toc;
    self.unsafe_paths |= cli.unsafe_paths;
    self.diff = cli.diff;

    // "-" is stdout.
    if self.output.as_deref() == Some(Path::new("-")) {
      self.output = None;
    }
  }

  /// Search the current directory for a config file.
  #[must_use]
  pub fn find_config_file() -> Option<PathBuf> {
    let config_filenames = [
      "stitchmd.toml",
      "stitchmd.json",
      ".stitchmd.toml",
      ".stitchmd.json",
    ];

    let current_dir = std::env::current_dir().ok()?;
    config_filenames
      .iter()
      .map(|filename| current_dir.join(filename))
      .find(|path| path.exists())
  }

  /// Check that the configured paths exist and the options fit together.
  pub fn validate(&self) -> Result<(), CliError> {
    if self.diff && self.output.is_none() {
      return Err(CliError::DiffWithoutOutput);
    }

    if let Some(preface) = &self.preface
      && !preface.is_file()
    {
      return Err(CliError::Preface(format!(
        "{}: file does not exist",
        preface.display()
      )));
    }

    if let Some(dir) = &self.dir
      && !dir.is_dir()
    {
      return Err(CliError::MissingDir(dir.clone()));
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::*;

  fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("stitchmd").chain(args.iter().copied()))
      .expect("valid arguments")
  }

  #[test]
  fn loads_toml_and_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let toml_path = dir.path().join("stitchmd.toml");
    fs::write(&toml_path, "offset = 2\nno_toc = true\ncolor = \"never\"\n").expect("write");
    let config = Config::from_file(&toml_path).expect("toml config");
    assert_eq!(config.offset, 2);
    assert!(config.no_toc);
    assert_eq!(config.color, ColorChoice::Never);

    let json_path = dir.path().join("stitchmd.json");
    fs::write(&json_path, r#"{"output": "README.md", "unsafe_paths": true}"#).expect("write");
    let config = Config::from_file(&json_path).expect("json config");
    assert_eq!(config.output, Some(PathBuf::from("README.md")));
    assert!(config.unsafe_paths);
    assert_eq!(config.offset, 0);
  }

  #[test]
  fn rejects_unknown_formats() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stitchmd.yaml");
    fs::write(&path, "offset: 1\n").expect("write");
    let err = Config::from_file(&path).expect_err("yaml is unsupported");
    assert!(err.to_string().contains("Unsupported config file format"));
  }

  #[test]
  fn cli_overrides_file_values() {
    let mut config = Config {
      offset: 3,
      output: Some(PathBuf::from("from-file.md")),
      ..Config::default()
    };
    config.merge_with_cli(&cli(&["--offset", "-1", "-o", "-", "--no-toc", "summary.md"]));
    assert_eq!(config.offset, -1);
    assert_eq!(config.output, None);
    assert!(config.no_toc);
  }

  #[test]
  fn diff_requires_output() {
    let mut config = Config::default();
    config.merge_with_cli(&cli(&["-d", "summary.md"]));
    let err = config.validate().expect_err("diff without output");
    assert_eq!(err.to_string(), "cannot use -d without -o");

    config.merge_with_cli(&cli(&["-d", "-o", "out.md", "summary.md"]));
    assert!(config.validate().is_ok());
  }

  #[test]
  fn missing_preface_is_reported() {
    let mut config = Config::default();
    config.merge_with_cli(&cli(&["--preface", "does/not/exist.md", "summary.md"]));
    let err = config.validate().expect_err("missing preface");
    assert!(err.to_string().starts_with("--preface: "));
  }
}
