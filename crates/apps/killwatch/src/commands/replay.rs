use std::{fs, path::Path, sync::Arc};

use lib_event::{CounterSnapshot, Counters};
use lib_tracker::Tracker;
use tracing::info;

use crate::{
	cli::args::ReplayArgs,
	commands::log_summary,
	config::{Overrides, Settings},
	trace::read_trace,
	workers::{write_counters, SinkWriter},
	Result,
};

pub fn replay(args: ReplayArgs) -> Result<()> {
	let settings = Settings::load(args.config.as_deref(), Overrides::default())?;
	let tracker = replay_trace(&args.trace, &args.out, &settings)?;
	log_summary(&tracker);
	Ok(())
}

/// Feeds a recorded trace through a fresh tracker, in file order, and writes
/// the sink files into `out`.
pub fn replay_trace(trace: &Path, out: &Path, settings: &Settings) -> Result<Tracker> {
	let events = read_trace(&fs::read(trace)?)?;
	info!(events = events.len(), trace = %trace.display(), "replaying");

	let counters = Arc::new(Counters::new());
	let mut tracker = Tracker::new(settings.correlator.clone(), counters);
	let mut writer = SinkWriter::create(out)?;

	for evt in &events {
		if let Some(committed) = tracker.ingest(evt) {
			writer.append(committed)?;
		}
	}
	tracker.finish();
	writer.flush()?;

	let snapshot: CounterSnapshot = tracker.counters();
	write_counters(out, &snapshot)?;

	Ok(tracker)
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use lib_ebpf_common::{EXEC_ENTER, EXIT_ENTER, KILL_ENTER, KILL_EXIT};
	use lib_tracker::RawEvent;

	use super::*;
	use crate::{trace::RawRecorder, workers::RECORDS_FILE};

	fn raw(kind: u8, tgid: u32, ts: u64) -> RawEvent {
		let mut evt = RawEvent::empty(kind);
		evt.tgid = tgid;
		evt.pid = tgid;
		evt.timestamp = ts;
		evt
	}

	fn write_trace(path: &Path) -> Result<()> {
		let mut kill_enter = raw(KILL_ENTER, 10, 3);
		kill_enter.target_pid = 20;
		kill_enter.invocation = 3;
		let mut kill_exit = raw(KILL_EXIT, 10, 4);
		kill_exit.invocation = 3;

		let mut recorder = RawRecorder::create(path)?;
		for evt in [
			raw(EXEC_ENTER, 10, 1),
			raw(EXEC_ENTER, 20, 2),
			kill_enter,
			kill_exit,
			raw(EXIT_ENTER, 20, 5),
		] {
			recorder.record(&evt)?;
		}
		recorder.flush()?;
		Ok(())
	}

	#[test]
	fn two_replays_write_identical_logs() -> Result<()> {
		// -- Setup & Fixtures
		let dir = tempfile::tempdir()?;
		let trace = dir.path().join("raw.trace");
		write_trace(&trace)?;
		let settings = Settings::default();

		// -- Exec
		let first = replay_trace(&trace, &dir.path().join("a"), &settings)?;
		replay_trace(&trace, &dir.path().join("b"), &settings)?;

		// -- Check
		let a = fs::read(dir.path().join("a").join(RECORDS_FILE))?;
		let b = fs::read(dir.path().join("b").join(RECORDS_FILE))?;
		assert_eq!(a, b);
		assert_eq!(first.log().len(), 4);
		assert_eq!(first.killer_of(20).map(|evt| evt.actor_pid), Some(10));

		Ok(())
	}
}

// endregion: --- Tests
