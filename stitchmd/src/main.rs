use std::io::{self, IsTerminal};

use color_eyre::eyre::Result;
use log::LevelFilter;
use stitchmd::{cli::Cli, run::run};

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Warn
    })
    .init();

  let stdout = io::stdout();
  let is_terminal = stdout.is_terminal();
  run(&cli, &mut io::stdin().lock(), &mut stdout.lock(), is_terminal)?;
  Ok(())
}
