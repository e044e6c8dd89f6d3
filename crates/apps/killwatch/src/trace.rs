//! Raw event traces: the decoded ring buffer stream, one 64-byte record per
//! event, in the order the consumer saw them.

use std::{
	fs::File,
	io::{BufWriter, Write},
	path::Path,
};

use lib_tracker::RawEvent;
use zerocopy::{FromBytes, IntoBytes};

use crate::{Error, Result};

const RAW_EVENT_SIZE: usize = core::mem::size_of::<RawEvent>();

pub struct RawRecorder {
	out: BufWriter<File>,
}

impl RawRecorder {
	pub fn create(path: &Path) -> Result<Self> {
		let out = BufWriter::new(File::create(path)?);
		Ok(Self { out })
	}

	pub fn record(&mut self, evt: &RawEvent) -> Result<()> {
		self.out.write_all(evt.as_bytes())?;
		Ok(())
	}

	pub fn flush(&mut self) -> Result<()> {
		self.out.flush()?;
		Ok(())
	}
}

pub fn read_trace(bytes: &[u8]) -> Result<Vec<RawEvent>> {
	if bytes.len() % RAW_EVENT_SIZE != 0 {
		return Err(Error::InvalidTraceSize {
			len: bytes.len(),
			record_size: RAW_EVENT_SIZE,
		});
	}

	bytes
		.chunks_exact(RAW_EVENT_SIZE)
		.map(|chunk| {
			RawEvent::read_from_bytes(chunk).map_err(|_| Error::InvalidTraceSize {
				len: chunk.len(),
				record_size: RAW_EVENT_SIZE,
			})
		})
		.collect()
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use lib_ebpf_common::{EXEC_ENTER, KILL_ENTER};

	use super::*;

	#[test]
	fn recorded_trace_reads_back_in_order() -> Result<()> {
		// -- Setup & Fixtures
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("raw.trace");
		let mut exec = RawEvent::empty(EXEC_ENTER);
		exec.tgid = 10;
		let mut kill = RawEvent::empty(KILL_ENTER);
		kill.target_pid = -7;

		// -- Exec
		let mut recorder = RawRecorder::create(&path)?;
		recorder.record(&exec)?;
		recorder.record(&kill)?;
		recorder.flush()?;
		let events = read_trace(&std::fs::read(&path)?)?;

		// -- Check
		assert_eq!(events, vec![exec, kill]);

		Ok(())
	}

	#[test]
	fn partial_record_is_rejected() -> Result<()> {
		// -- Exec
		let res = read_trace(&[0u8; RAW_EVENT_SIZE + 3]);

		// -- Check
		assert!(matches!(res, Err(Error::InvalidTraceSize { len, .. }) if len == RAW_EVENT_SIZE + 3));

		Ok(())
	}
}

// endregion: --- Tests
