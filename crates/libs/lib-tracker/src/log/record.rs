use std::io::Write;

use lib_ebpf_common::COMM_LEN;
use zerocopy::{FromBytes, IntoBytes};
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Comm, CommittedEvent, CommittedKind, Error, Result};

/// Fixed-layout form of a committed event, as written to `committed.bin`.
///
/// Generations are an in-memory notion and are not part of the record.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct CommittedRecord {
	pub seq: u64,                   // 0..8
	pub timestamp: u64,             // 8..16
	pub kind: u8,                   // 16..17
	pub _pad0: [u8; 3],             // 17..20
	pub actor_pid: u32,             // 20..24
	pub actor_comm: [u8; COMM_LEN], // 24..40
	pub actor_uid: u32,             // 40..44
	pub target_pid: u32,            // 44..48 | kill argument bits, 0 otherwise
}

const _: () = assert!(core::mem::size_of::<CommittedRecord>() == CommittedRecord::SIZE);

impl CommittedRecord {
	pub const SIZE: usize = 48;

	/// Decodes a buffer of concatenated records.
	pub fn read_all(bytes: &[u8]) -> Result<Vec<Self>> {
		if bytes.len() % Self::SIZE != 0 {
			return Err(Error::InvalidRecordSize {
				len: bytes.len(),
				record_size: Self::SIZE,
			});
		}

		bytes
			.chunks_exact(Self::SIZE)
			.map(|chunk| {
				Self::read_from_bytes(chunk).map_err(|_| Error::InvalidRecordSize {
					len: chunk.len(),
					record_size: Self::SIZE,
				})
			})
			.collect()
	}

	pub fn write_to(&self, w: &mut impl Write) -> Result<()> {
		w.write_all(self.as_bytes())?;
		Ok(())
	}

	pub fn kind(&self) -> Result<CommittedKind> {
		CommittedKind::try_from(self.kind)
	}

	pub fn comm(&self) -> Comm {
		Comm::new(self.actor_comm)
	}

	/// The kill argument with its sign restored.
	pub fn target_pid(&self) -> i32 {
		self.target_pid as i32
	}
}

impl From<&CommittedEvent> for CommittedRecord {
	fn from(evt: &CommittedEvent) -> Self {
		Self {
			seq: evt.seq,
			timestamp: evt.timestamp,
			kind: evt.kind as u8,
			_pad0: [0u8; 3],
			actor_pid: evt.actor_pid,
			actor_comm: *evt.actor_comm.as_bytes(),
			actor_uid: evt.actor_uid,
			target_pid: evt.target_pid.unwrap_or(0) as u32,
		}
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	fn kill_event(seq: u64, target: i32) -> CommittedEvent {
		CommittedEvent {
			seq,
			timestamp: 100 + seq,
			kind: CommittedKind::KillSucceeded,
			actor_pid: 10,
			actor_comm: Comm::from("bash"),
			actor_uid: 0,
			actor_generation: Some(0),
			target_pid: Some(target),
			target_generation: None,
		}
	}

	#[test]
	fn field_offsets_match_file_layout() -> Result<()> {
		// -- Setup & Fixtures
		let rec = CommittedRecord::from(&kill_event(7, 20));

		// -- Exec
		let bytes = rec.as_bytes();

		// -- Check
		assert_eq!(bytes.len(), 48);
		assert_eq!(&bytes[0..8], &7u64.to_ne_bytes());
		assert_eq!(bytes[16], 3);
		assert_eq!(&bytes[20..24], &10u32.to_ne_bytes());
		assert_eq!(&bytes[24..28], b"bash");
		assert_eq!(&bytes[44..48], &20u32.to_ne_bytes());

		Ok(())
	}

	#[test]
	fn negative_target_keeps_its_bits() -> Result<()> {
		// -- Setup & Fixtures
		let mut buf = Vec::new();
		CommittedRecord::from(&kill_event(0, -1234)).write_to(&mut buf)?;
		CommittedRecord::from(&kill_event(1, -1)).write_to(&mut buf)?;

		// -- Exec
		let recs = CommittedRecord::read_all(&buf)?;

		// -- Check
		assert_eq!(recs.len(), 2);
		assert_eq!(recs[0].target_pid(), -1234);
		assert_eq!(recs[1].target_pid, u32::MAX);
		assert_eq!(recs[1].kind()?, CommittedKind::KillSucceeded);
		assert_eq!(recs[1].comm().to_string(), "bash");

		Ok(())
	}

	#[test]
	fn truncated_buffer_is_rejected() -> Result<()> {
		// -- Setup & Fixtures
		let mut buf = Vec::new();
		CommittedRecord::from(&kill_event(0, 5)).write_to(&mut buf)?;
		buf.pop();

		// -- Exec
		let res = CommittedRecord::read_all(&buf);

		// -- Check
		assert!(matches!(
			res,
			Err(Error::InvalidRecordSize { len: 47, record_size: 48 })
		));

		Ok(())
	}
}

// endregion: --- Tests
