// region:    --- Modules
mod cli;
mod commands;
mod config;
mod error;
mod loader;
mod supervisor;
mod trace;
mod utils;
mod workers;
// endregion: --- Modules

use crate::cli::args::{Cli, Command};

pub use self::error::{Error, Result};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
	let args = Cli::parse();
	let _log_guard = utils::init_tracing(args.log_file.as_deref());

	match args.command {
		Command::Run(run_args) => commands::run(run_args).await?,
		Command::Kills(kills_args) => commands::kills(kills_args)?,
		Command::Replay(replay_args) => commands::replay(replay_args)?,
	}

	Ok(())
}
