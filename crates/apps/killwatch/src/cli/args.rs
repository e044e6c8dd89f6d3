use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use humantime::Duration;

#[derive(Parser, Debug)]
#[command(name = "killwatch", version, about = "Attribute successful kill() calls to the processes that made them")]
pub struct Cli {
	#[command(subcommand)]
	pub command: Command,

	#[arg(long, global = true, help = "Write logs to this file instead of stderr")]
	pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Load the probes and trace until interrupted or `--time` elapses.
	Run(RunArgs),
	/// Print successful kills from a committed log.
	Kills(KillsArgs),
	/// Feed a recorded raw trace through a fresh tracker.
	Replay(ReplayArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
	#[arg(long, env = "KILLWATCH_BPF_OBJECT", help = "Compiled eBPF object (lib-ebpf build output)")]
	pub bpf_object: PathBuf,

	#[arg(long, default_value = "killwatch-out")]
	pub out: PathBuf,

	#[arg(long, help = "Time duration (e.g., 20s, 5m, 1h). Runs until Ctrl-C when absent")]
	pub time: Option<Duration>,

	#[arg(long)]
	pub config: Option<PathBuf>,

	#[arg(long, help = "Append every decoded raw event to this trace file")]
	pub record_raw: Option<PathBuf>,

	#[arg(long, help = "How long a kill entry waits for its exit (e.g., 5s)")]
	pub staleness: Option<Duration>,

	#[arg(long, help = "Transport queue capacity")]
	pub capacity: Option<usize>,
}

#[derive(Args, Debug)]
pub struct KillsArgs {
	#[arg(long, default_value = "killwatch-out/committed.bin")]
	pub log: PathBuf,

	#[arg(long, help = "Only show the most recent killer of this pid")]
	pub victim: Option<u32>,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
	#[arg(long)]
	pub trace: PathBuf,

	#[arg(long, default_value = "killwatch-replay")]
	pub out: PathBuf,

	#[arg(long)]
	pub config: Option<PathBuf>,
}
