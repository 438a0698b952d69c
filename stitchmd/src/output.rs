//! Where stitched output goes: a file, stdout, or a diff against a file.

use std::{
  fs,
  io::{self, Write},
  path::{Path, PathBuf},
};

use colored::Colorize;
use similar::TextDiff;

use crate::cli::ColorChoice;

/// Decides whether to color output.
///
/// `env` looks up environment variables. In `auto` mode color is off when
/// `NO_COLOR` is set to anything or `TERM` is `dumb`, and otherwise follows
/// whether stdout is a terminal.
#[must_use]
pub fn should_color(
  choice: ColorChoice,
  env: impl Fn(&str) -> Option<String>,
  is_terminal: bool,
) -> bool {
  match choice {
    ColorChoice::Always => true,
    ColorChoice::Never => false,
    ColorChoice::Auto => {
      if env("NO_COLOR").is_some() || env("TERM").as_deref() == Some("dumb") {
        return false;
      }
      is_terminal
    },
  }
}

/// Collects output and compares it with the current contents of a file.
#[derive(Debug)]
pub struct DiffWriter {
  path: PathBuf,
  old:  String,
  new:  Vec<u8>,
}

impl DiffWriter {
  /// Reads the current contents of `path`. A missing file counts as empty.
  ///
  /// # Errors
  ///
  /// Returns any read error other than the file not existing.
  pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
    let path = path.into();
    let old = match fs::read_to_string(&path) {
      Ok(old) => old,
      Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
      Err(err) => return Err(err),
    };
    Ok(Self {
      path,
      old,
      new: Vec::new(),
    })
  }

  #[must_use]
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Writes a unified diff of the file's contents against everything
  /// written so far to `out`. Writes nothing if they are the same.
  /// Returns whether there was a difference.
  ///
  /// # Errors
  ///
  /// Returns errors from writing to `out`.
  pub fn finish(self, out: &mut dyn Write, color: bool) -> io::Result<bool> {
    let new = String::from_utf8_lossy(&self.new);
    if self.old == new {
      return Ok(false);
    }

    let name = self.path.display().to_string();
    let diff = TextDiff::from_lines(self.old.as_str(), &*new);
    let unified = diff
      .unified_diff()
      .context_radius(3)
      .header(&format!("a/{name}"), &format!("b/{name}"))
      .to_string();

    if color {
      // `colored` would otherwise drop escapes when stdout is not a
      // terminal or NO_COLOR is set, even though color was asked for.
      colored::control::set_override(true);
    }
    for line in unified.split_inclusive('\n') {
      if color {
        write!(out, "{}", colorize(line))?;
      } else {
        out.write_all(line.as_bytes())?;
      }
    }
    Ok(true)
  }
}

impl Write for DiffWriter {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.new.extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

fn colorize(line: &str) -> String {
  let (text, newline) = line
    .strip_suffix('\n')
    .map_or((line, ""), |text| (text, "\n"));
  let colored = if text.starts_with("+++") || text.starts_with("---") {
    text.bold()
  } else if text.starts_with("@@") {
    text.cyan()
  } else if text.starts_with('+') {
    text.green()
  } else if text.starts_with('-') {
    text.red()
  } else {
    text.normal()
  };
  format!("{colored}{newline}")
}
