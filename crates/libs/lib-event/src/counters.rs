use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Drop and anomaly counters shared by the transport producers and the
/// single consumer. Every counter only ever grows; a non-zero value means
/// reduced confidence in the committed log, never a failure.
#[derive(Debug, Default)]
pub struct Counters {
	kernel_dropped: AtomicU64,
	transport_dropped: AtomicU64,
	kill_exits_unattributed: AtomicU64,
	exits_without_start: AtomicU64,
	probe_faults: AtomicU64,
	provisional_evicted: AtomicU64,
	provisional_replaced: AtomicU64,
	malformed_events: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
	pub raw_events_dropped: u64,
	pub kill_exits_unattributed: u64,
	pub exits_without_start: u64,
	pub probe_faults: u64,
	pub provisional_evicted: u64,
	pub provisional_replaced: u64,
	pub malformed_events: u64,
}

impl Counters {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn snapshot(&self) -> CounterSnapshot {
		CounterSnapshot {
			raw_events_dropped: self.kernel_dropped.load(Ordering::Relaxed)
				+ self.transport_dropped.load(Ordering::Relaxed),
			kill_exits_unattributed: self.kill_exits_unattributed.load(Ordering::Relaxed),
			exits_without_start: self.exits_without_start.load(Ordering::Relaxed),
			probe_faults: self.probe_faults.load(Ordering::Relaxed),
			provisional_evicted: self.provisional_evicted.load(Ordering::Relaxed),
			provisional_replaced: self.provisional_replaced.load(Ordering::Relaxed),
			malformed_events: self.malformed_events.load(Ordering::Relaxed),
		}
	}
}

// region:    --- Increments

impl Counters {
	pub fn transport_dropped(&self) {
		self.transport_dropped.fetch_add(1, Ordering::Relaxed);
	}

	pub fn kill_exit_unattributed(&self) {
		self.kill_exits_unattributed.fetch_add(1, Ordering::Relaxed);
	}

	pub fn exit_without_start(&self) {
		self.exits_without_start.fetch_add(1, Ordering::Relaxed);
	}

	pub fn provisional_evicted(&self, count: u64) {
		self.provisional_evicted.fetch_add(count, Ordering::Relaxed);
	}

	pub fn provisional_replaced(&self) {
		self.provisional_replaced.fetch_add(1, Ordering::Relaxed);
	}

	pub fn malformed_event(&self) {
		self.malformed_events.fetch_add(1, Ordering::Relaxed);
	}
}

// endregion: --- Increments

// region:    --- Kernel totals

// The kernel keeps its own per-CPU totals; the poller stores the latest sum.
// `fetch_max` keeps the value monotonic if a stale read races a fresh one.
impl Counters {
	pub fn set_kernel_dropped(&self, total: u64) {
		self.kernel_dropped.fetch_max(total, Ordering::Relaxed);
	}

	pub fn set_probe_faults(&self, total: u64) {
		self.probe_faults.fetch_max(total, Ordering::Relaxed);
	}
}

// endregion: --- Kernel totals

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	#[test]
	fn raw_drops_sum_kernel_and_transport() -> Result<()> {
		// -- Setup & Fixtures
		let counters = Counters::new();

		// -- Exec
		counters.set_kernel_dropped(4);
		counters.transport_dropped();
		counters.transport_dropped();

		// -- Check
		assert_eq!(counters.snapshot().raw_events_dropped, 6);

		Ok(())
	}

	#[test]
	fn kernel_totals_never_go_backwards() -> Result<()> {
		// -- Setup & Fixtures
		let counters = Counters::new();

		// -- Exec
		counters.set_probe_faults(10);
		counters.set_probe_faults(7);
		counters.set_kernel_dropped(3);
		counters.set_kernel_dropped(1);

		// -- Check
		let snap = counters.snapshot();
		assert_eq!(snap.probe_faults, 10);
		assert_eq!(snap.raw_events_dropped, 3);

		Ok(())
	}
}

// endregion: --- Tests
