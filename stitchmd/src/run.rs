//! The stitchmd command: resolve paths, stitch, and deliver the output.

use std::{
  fs,
  io::{Read, Write},
  path::{Path, PathBuf},
};

use anyhow::Context;
use stitchmd_core::{DirReader, StitchOptions, Stitcher, paths};

use crate::{
  cli::Cli,
  config::Config,
  error::CliError,
  output::{DiffWriter, should_color},
};

/// Filename reported in diagnostics for a summary read from stdin.
const STDIN_NAME: &str = "<stdin>";

/// Runs stitchmd for `cli`, reading a `-` input from `stdin` and writing to
/// `stdout` unless an output file is configured. `is_terminal` tells
/// whether `stdout` is a terminal, for colored diffs.
///
/// # Errors
///
/// Returns usage errors, I/O errors, and stitching diagnostics. Nothing is
/// written to the output if stitching fails.
pub fn run(
  cli: &Cli,
  stdin: &mut dyn Read,
  stdout: &mut dyn Write,
  is_terminal: bool,
) -> Result<(), CliError> {
  let config = Config::load(cli)?;
  config.validate()?;

  let (filename, source) = if cli.reads_stdin() {
    let mut source = String::new();
    stdin.read_to_string(&mut source).map_err(CliError::Input)?;
    (STDIN_NAME.to_owned(), source)
  } else {
    let source = fs::read_to_string(&cli.input).map_err(CliError::Input)?;
    (cli.input.clone(), source)
  };

  let dir = match &config.dir {
    Some(dir) => dir.clone(),
    None if cli.reads_stdin() => {
      std::env::current_dir().context("get working directory")?
    },
    None => {
      Path::new(&cli.input)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    },
  };
  log::debug!("Reading files relative to {}", dir.display());

  let preface = config
    .preface
    .as_ref()
    .map(|path| {
      fs::read_to_string(path).map_err(|err| CliError::Preface(err.to_string()))
    })
    .transpose()?;

  let mut embed_stack = Vec::new();
  if !cli.reads_stdin()
    && let Some(path) = relative_slash(&dir, Path::new(&cli.input))?
  {
    embed_stack.push(path);
  }

  let input_rel_path = match &config.output {
    Some(output) => {
      let out_dir = output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
      relative_slash(out_dir, &dir)?
        .unwrap_or_else(|| paths::to_slash(&dir.to_string_lossy()))
    },
    None => ".".to_owned(),
  };

  let stitcher = Stitcher::new(StitchOptions {
    offset: config.offset,
    no_toc: config.no_toc,
    preface,
    input_rel_path,
    embed_stack,
  });
  let reader = DirReader::new(&dir).allow_outside(config.unsafe_paths);
  let out = stitcher.stitch_to_string(&reader, &filename, &source)?;

  match &config.output {
    Some(path) if config.diff => {
      let mut writer = DiffWriter::new(path).map_err(CliError::Output)?;
      writer.write_all(out.as_bytes()).map_err(CliError::Output)?;
      let color = should_color(config.color, |key| std::env::var(key).ok(), is_terminal);
      writer.finish(stdout, color).map_err(CliError::Output)?;
    },
    Some(path) => {
      fs::write(path, out)
        .with_context(|| format!("create output {}", path.display()))?;
    },
    None => stdout.write_all(out.as_bytes()).map_err(CliError::Output)?,
  }
  Ok(())
}

/// Slash path leading from directory `base` to `target`, both taken
/// relative to the working directory when not absolute.
fn relative_slash(base: &Path, target: &Path) -> anyhow::Result<Option<String>> {
  let resolve = |path: &Path| {
    std::path::absolute(path)
      .map(|abs| PathBuf::from(paths::clean(&paths::to_slash(&abs.to_string_lossy()))))
      .with_context(|| format!("resolve {}", path.display()))
  };
  let rel = pathdiff::diff_paths(resolve(target)?, resolve(base)?);
  Ok(rel.map(|rel| {
    let rel = paths::to_slash(&rel.to_string_lossy());
    if rel.is_empty() { ".".to_owned() } else { rel }
  }))
}
