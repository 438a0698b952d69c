#![allow(clippy::print_stdout, reason = "Progress output for a dev tool")]

use std::{
  fs,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate_to};
use clap_mangen::Man;
use stitchmd::cli::Cli;

const BIN_NAME: &str = "stitchmd";

#[derive(Parser)]
#[command(author, version, about)]
struct Xtask {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Generate shell completions and the manpage for stitchmd
  Dist {
    /// Output directory for generated files.
    #[arg(short, long, default_value = "dist")]
    output_dir: PathBuf,

    /// Shells to generate completions for. All supported shells if unset.
    #[arg(long, value_enum, value_delimiter = ',')]
    shells: Vec<Shell>,

    /// Only generate shell completions.
    #[arg(long, conflicts_with = "manpage_only")]
    completions_only: bool,

    /// Only generate the manpage.
    #[arg(long, conflicts_with = "completions_only")]
    manpage_only: bool,
  },
}

fn main() -> Result<()> {
  match Xtask::parse().command {
    Commands::Dist {
      output_dir,
      shells,
      completions_only,
      manpage_only,
    } => {
      if !manpage_only {
        generate_completions(&output_dir, &shells)?;
      }
      if !completions_only {
        generate_manpage(&output_dir)?;
      }
    },
  }

  Ok(())
}

fn generate_completions(output_dir: &Path, shells: &[Shell]) -> Result<()> {
  let completions_dir = output_dir.join("completions");
  fs::create_dir_all(&completions_dir).with_context(|| {
    format!("Failed to create {}", completions_dir.display())
  })?;

  let shells = if shells.is_empty() {
    &[Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell][..]
  } else {
    shells
  };
  let mut cmd = Cli::command();
  for &shell in shells {
    let path = generate_to(shell, &mut cmd, BIN_NAME, &completions_dir)
      .with_context(|| format!("Failed to generate {shell} completions"))?;
    println!("Wrote {}", path.display());
  }
  Ok(())
}

fn generate_manpage(output_dir: &Path) -> Result<()> {
  let man_dir = output_dir.join("man");
  fs::create_dir_all(&man_dir)
    .with_context(|| format!("Failed to create {}", man_dir.display()))?;

  let path = man_dir.join(format!("{BIN_NAME}.1"));
  let mut file = fs::File::create(&path)
    .with_context(|| format!("Failed to create manpage at {}", path.display()))?;
  Man::new(Cli::command().name(BIN_NAME))
    .render(&mut file)
    .context("Failed to render manpage")?;
  println!("Wrote {}", path.display());
  Ok(())
}
