// region:    --- Modules
mod record;

pub use record::CommittedRecord;
// endregion: --- Modules

use crate::{CommittedEvent, CommittedKind};

/// In-memory append-only committed log, ordered by `seq`.
#[derive(Debug, Default)]
pub struct CommittedLog {
	events: Vec<CommittedEvent>,
}

impl CommittedLog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn append(&mut self, evt: CommittedEvent) -> &CommittedEvent {
		debug_assert!(self.events.last().map_or(true, |last| last.seq < evt.seq));
		self.events.push(evt);
		&self.events[self.events.len() - 1]
	}

	pub fn iter(&self) -> impl Iterator<Item = &CommittedEvent> + '_ {
		self.events.iter()
	}

	pub fn len(&self) -> usize {
		self.events.len()
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty()
	}
}

// region:    --- Queries

impl CommittedLog {
	/// Events with `t0 <= timestamp <= t1`, in `seq` order.
	///
	/// Timestamps come from different CPUs and are not monotonic in `seq`, so
	/// the whole log is scanned rather than bisected.
	pub fn events_between(&self, t0: u64, t1: u64) -> impl Iterator<Item = &CommittedEvent> + '_ {
		self.events
			.iter()
			.filter(move |evt| evt.timestamp >= t0 && evt.timestamp <= t1)
	}

	pub fn kills(&self) -> impl Iterator<Item = &CommittedEvent> + '_ {
		self.events
			.iter()
			.filter(|evt| evt.kind == CommittedKind::KillSucceeded)
	}

	/// Most recent successful kill whose argument named `victim` directly.
	pub fn killer_of(&self, victim: u32) -> Option<&CommittedEvent> {
		let victim = i32::try_from(victim).ok()?;
		self.kills().filter(|evt| evt.target_pid == Some(victim)).last()
	}
}

// endregion: --- Queries

// region:    --- Tests


// endregion: --- Tests
