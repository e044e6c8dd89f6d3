use std::sync::Arc;

use lib_ebpf_common::RawEvent;
use lib_event::{CounterSnapshot, Counters};
use tracing::info;

use crate::{
	CommittedEvent, CommittedLog, Correlator, CorrelatorConfig, ProcessRecord, ProcessRegistry,
};

/// Owns everything the single consumer mutates: the correlator, the process
/// registry and the committed log. Counters are shared with the producers.
pub struct Tracker {
	correlator: Correlator,
	registry: ProcessRegistry,
	log: CommittedLog,
	counters: Arc<Counters>,
}

impl Tracker {
	pub fn new(config: CorrelatorConfig, counters: Arc<Counters>) -> Self {
		Self {
			correlator: Correlator::new(config),
			registry: ProcessRegistry::new(),
			log: CommittedLog::new(),
			counters,
		}
	}

	/// Feeds one raw event through the correlator. Returns the event it
	/// committed, if any.
	pub fn ingest(&mut self, evt: &RawEvent) -> Option<&CommittedEvent> {
		let committed = self
			.correlator
			.process(evt, &mut self.registry, &self.counters)?;
		Some(self.log.append(committed))
	}

	/// Evicts stale provisional kills at `now` (monotonic ns).
	pub fn sweep(&mut self, now: u64) -> usize {
		self.correlator.sweep(now, &self.counters)
	}

	/// Discards provisional kills still pending. Called once at shutdown.
	pub fn finish(&mut self) -> usize {
		let discarded = self.correlator.discard_pending();
		if discarded > 0 {
			info!(discarded, "discarded unresolved kill attempts");
		}
		discarded
	}
}

// region:    --- Queries

impl Tracker {
	pub fn ancestors_of(&self, pid: u32, generation: u32) -> Vec<&ProcessRecord> {
		self.registry.ancestors_of(pid, generation)
	}

	pub fn events_between(&self, t0: u64, t1: u64) -> impl Iterator<Item = &CommittedEvent> + '_ {
		self.log.events_between(t0, t1)
	}

	pub fn kills(&self) -> impl Iterator<Item = &CommittedEvent> + '_ {
		self.log.kills()
	}

	pub fn killer_of(&self, victim: u32) -> Option<&CommittedEvent> {
		self.log.killer_of(victim)
	}

	pub fn counters(&self) -> CounterSnapshot {
		self.counters.snapshot()
	}

	pub fn registry(&self) -> &ProcessRegistry {
		&self.registry
	}

	pub fn log(&self) -> &CommittedLog {
		&self.log
	}

	pub fn pending(&self) -> usize {
		self.correlator.pending()
	}
}

// endregion: --- Queries

// region:    --- Tests


// endregion: --- Tests
