use std::{
	fs::{self, File},
	io::{BufWriter, Write},
	path::{Path, PathBuf},
};

use lib_event::{trx::Rx, CounterSnapshot};
use lib_tracker::{CommittedEvent, CommittedRecord};
use tracing::{debug, info};

use crate::error::Result;

pub const RECORDS_FILE: &str = "committed.bin";
pub const JSONL_FILE: &str = "process_events.jsonl";
pub const COUNTERS_FILE: &str = "counters.json";

/// Appends committed events to `committed.bin` and `process_events.jsonl`.
pub struct SinkWriter {
	dir: PathBuf,
	records: BufWriter<File>,
	jsonl: BufWriter<File>,
	written: u64,
}

impl SinkWriter {
	pub fn create(dir: &Path) -> Result<Self> {
		fs::create_dir_all(dir)?;

		Ok(Self {
			dir: dir.to_path_buf(),
			records: BufWriter::new(File::create(dir.join(RECORDS_FILE))?),
			jsonl: BufWriter::new(File::create(dir.join(JSONL_FILE))?),
			written: 0,
		})
	}

	pub fn append(&mut self, evt: &CommittedEvent) -> Result<()> {
		CommittedRecord::from(evt).write_to(&mut self.records)?;
		serde_json::to_writer(&mut self.jsonl, evt)?;
		self.jsonl.write_all(b"\n")?;
		self.written += 1;
		Ok(())
	}

	pub fn flush(&mut self) -> Result<()> {
		self.records.flush()?;
		self.jsonl.flush()?;
		debug!(written = self.written, dir = %self.dir.display(), "sink flushed");
		Ok(())
	}

	pub fn written(&self) -> u64 {
		self.written
	}
}

pub fn write_counters(dir: &Path, snapshot: &CounterSnapshot) -> Result<()> {
	let file = File::create(dir.join(COUNTERS_FILE))?;
	serde_json::to_writer_pretty(file, snapshot)?;
	Ok(())
}

pub struct SinkWorker {
	writer: SinkWriter,
	rx: Rx<CommittedEvent>,
}

impl SinkWorker {
	pub fn start(writer: SinkWriter, rx: Rx<CommittedEvent>) -> Result<Self> {
		Ok(Self { writer, rx })
	}

	/// Runs until every sender of the committed channel is gone.
	pub async fn run(mut self) -> Result<()> {
		while let Ok(evt) = self.rx.recv().await {
			self.writer.append(&evt)?;
		}

		self.writer.flush()?;
		info!(written = self.writer.written(), channel = self.rx.name(), "sink closed");
		Ok(())
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use lib_event::trx::new_channel;
	use lib_tracker::{Comm, CommittedKind};

	use super::*;

	fn kill(seq: u64, target: i32) -> CommittedEvent {
		CommittedEvent {
			seq,
			timestamp: 1_000 + seq,
			kind: CommittedKind::KillSucceeded,
			actor_pid: 42,
			actor_comm: Comm::from("pkill"),
			actor_uid: 0,
			actor_generation: Some(0),
			target_pid: Some(target),
			target_generation: None,
		}
	}

	#[test]
	fn writer_produces_both_files() -> Result<()> {
		// -- Setup & Fixtures
		let dir = tempfile::tempdir()?;
		let mut writer = SinkWriter::create(dir.path())?;

		// -- Exec
		writer.append(&kill(0, 7))?;
		writer.append(&kill(1, -1))?;
		writer.flush()?;

		// -- Check
		let records = CommittedRecord::read_all(&fs::read(dir.path().join(RECORDS_FILE))?)?;
		assert_eq!(records.len(), 2);
		assert_eq!(records[1].target_pid(), -1);

		let jsonl = fs::read_to_string(dir.path().join(JSONL_FILE))?;
		let lines: Vec<serde_json::Value> = jsonl
			.lines()
			.map(serde_json::from_str)
			.collect::<core::result::Result<_, _>>()?;
		assert_eq!(lines.len(), 2);
		assert_eq!(lines[0]["kind"], "kill_succeeded");
		assert_eq!(lines[0]["actor_comm"], "pkill");

		Ok(())
	}

	#[tokio::test]
	async fn worker_flushes_when_channel_closes() -> Result<()> {
		// -- Setup & Fixtures
		let dir = tempfile::tempdir()?;
		let (tx, rx) = new_channel::<CommittedEvent>("committed");
		let worker = SinkWorker::start(SinkWriter::create(dir.path())?, rx)?;

		// -- Exec
		tx.send(kill(0, 9)).await?;
		drop(tx);
		worker.run().await?;

		// -- Check
		let bytes = fs::read(dir.path().join(RECORDS_FILE))?;
		assert_eq!(bytes.len(), CommittedRecord::SIZE);

		Ok(())
	}

	#[test]
	fn counters_file_is_json() -> Result<()> {
		// -- Setup & Fixtures
		let dir = tempfile::tempdir()?;
		let snapshot = CounterSnapshot {
			raw_events_dropped: 3,
			..Default::default()
		};

		// -- Exec
		write_counters(dir.path(), &snapshot)?;

		// -- Check
		let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(dir.path().join(COUNTERS_FILE))?)?;
		assert_eq!(value["raw_events_dropped"], 3);
		assert_eq!(value["kill_exits_unattributed"], 0);

		Ok(())
	}
}

// endregion: --- Tests
