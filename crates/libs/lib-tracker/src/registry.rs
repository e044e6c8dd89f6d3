use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::Comm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
	Running,
	Exited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRecord {
	pub pid: u32,
	pub generation: u32,
	pub ppid: u32,
	/// Generation of `ppid` that was current when this record started.
	/// `None` when the parent was never observed.
	pub parent_generation: Option<u32>,
	pub uid: u32,
	pub comm: Comm,
	pub first_seen: u64,
	pub last_seen: u64,
	pub state: ProcessState,
	/// Position of this record among all started records.
	pub started_ordinal: u64,
}

/// Process ancestry and lifecycle, built only from committed
/// `ProcessStarted` / `ProcessExited` events.
///
/// Records are never removed. A pid reused after exit gets a new record with
/// the next generation; older generations stay queryable as history.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
	// pid -> records, index == generation
	records: HashMap<u32, Vec<ProcessRecord>>,
	started: u64,
}

impl ProcessRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the generation the started process was recorded under.
	pub fn record_started(&mut self, pid: u32, ppid: u32, uid: u32, comm: Comm, ts: u64) -> u32 {
		let parent_generation = if ppid != pid { self.current_generation(ppid) } else { None };
		let ordinal = self.started;
		let history = self.records.entry(pid).or_default();

		// A second exec inside a live process keeps its identity.
		if let Some(current) = history.last_mut() {
			if current.state == ProcessState::Running {
				current.ppid = ppid;
				current.parent_generation = parent_generation;
				current.uid = uid;
				current.comm = comm;
				current.last_seen = ts;
				return current.generation;
			}
		}

		let generation = history.len() as u32;
		if generation > 0 {
			debug!(pid, generation, "pid reused");
		}

		history.push(ProcessRecord {
			pid,
			generation,
			ppid,
			parent_generation,
			uid,
			comm,
			first_seen: ts,
			last_seen: ts,
			state: ProcessState::Running,
			started_ordinal: ordinal,
		});
		self.started += 1;

		generation
	}

	/// Marks the current generation exited. `None` when no running record
	/// exists, typically a process that predates tracing.
	pub fn record_exited(&mut self, pid: u32, ts: u64) -> Option<u32> {
		let current = self.records.get_mut(&pid)?.last_mut()?;
		if current.state != ProcessState::Running {
			return None;
		}

		current.state = ProcessState::Exited;
		current.last_seen = ts;
		Some(current.generation)
	}

	/// Ancestors of `(pid, generation)`, nearest parent first. Stops at the
	/// first parent that was never observed; an unknown start returns an empty
	/// chain.
	pub fn ancestors_of(&self, pid: u32, generation: u32) -> Vec<&ProcessRecord> {
		let mut chain = Vec::new();
		let Some(mut current) = self.get(pid, generation) else {
			return chain;
		};

		// Each hop goes to a strictly earlier ordinal, so the walk is bounded
		// by the number of started records even if ppid links were bogus.
		while let Some(parent_generation) = current.parent_generation {
			let Some(parent) = self.get(current.ppid, parent_generation) else {
				break;
			};
			if parent.started_ordinal >= current.started_ordinal {
				break;
			}

			chain.push(parent);
			current = parent;
		}

		chain
	}

	pub fn get(&self, pid: u32, generation: u32) -> Option<&ProcessRecord> {
		self.records.get(&pid)?.get(generation as usize)
	}

	/// Latest record for `pid`, running or not.
	pub fn current(&self, pid: u32) -> Option<&ProcessRecord> {
		self.records.get(&pid)?.last()
	}

	pub fn current_generation(&self, pid: u32) -> Option<u32> {
		self.current(pid).map(|r| r.generation)
	}

	/// Number of `ProcessStarted` records ever created.
	pub fn started_count(&self) -> u64 {
		self.started
	}

	/// Number of distinct pids seen.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

// region:    --- Tests


// endregion: --- Tests
