use std::time::Duration;

use lib_event::{transport::Drain, trx::Tx};
use lib_tracker::{CommittedEvent, RawEvent, Tracker};
use tracing::{debug, info};

use crate::{error::Result, utils::monotonic_ns};

/// The single consumer. Runs on a blocking thread, owns the [`Tracker`] and
/// hands it back once the transport closes.
pub struct CorrelatorWorker {
	tracker: Tracker,
	drain: Drain<RawEvent>,
	tx: Tx<CommittedEvent>,
	poll_interval: Duration,
}

impl CorrelatorWorker {
	pub fn start(
		tracker: Tracker,
		drain: Drain<RawEvent>,
		tx: Tx<CommittedEvent>,
		poll_interval: Duration,
	) -> Result<Self> {
		Ok(Self {
			tracker,
			drain,
			tx,
			poll_interval,
		})
	}

	pub fn run(mut self) -> Result<Tracker> {
		loop {
			match self.drain.recv_timeout(self.poll_interval) {
				Ok(Some(evt)) => {
					if let Some(committed) = self.tracker.ingest(&evt) {
						self.tx.send_blocking(committed.clone())?;
					}
				}
				Ok(None) => {
					let evicted = self.tracker.sweep(monotonic_ns());
					if evicted > 0 {
						debug!(evicted, "idle sweep");
					}
				}
				Err(lib_event::Error::TransportClosed) => break,
				Err(err) => return Err(err.into()),
			}
		}

		self.tracker.finish();
		info!(
			committed = self.tracker.log().len(),
			processes = self.tracker.registry().len(),
			"correlator stopped"
		);

		// `tx` is dropped with `self`, which lets the sink finish.
		Ok(self.tracker)
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use std::sync::Arc;

	use lib_ebpf_common::{EXEC_ENTER, KILL_ENTER, KILL_EXIT};
	use lib_event::{
		transport::{Publish, Transport},
		trx::new_channel,
		Counters,
	};
	use lib_tracker::{CommittedKind, CorrelatorConfig};

	use super::*;

	fn raw(kind: u8, pid: u32, ts: u64) -> RawEvent {
		let mut evt = RawEvent::empty(kind);
		evt.tgid = pid;
		evt.pid = pid;
		evt.timestamp = ts;
		evt
	}

	#[tokio::test]
	async fn run_commits_until_transport_closes() -> Result<()> {
		// -- Setup & Fixtures
		let counters = Arc::new(Counters::new());
		let tracker = Tracker::new(CorrelatorConfig::default(), counters.clone());
		let (publisher, drain) = Transport::bounded::<RawEvent>(16, counters);
		let (tx, rx) = new_channel::<CommittedEvent>("committed");
		let worker = CorrelatorWorker::start(tracker, drain, tx, Duration::from_millis(5))?;

		let mut kill_enter = raw(KILL_ENTER, 10, 2);
		kill_enter.target_pid = 20;
		kill_enter.invocation = 2;
		let mut kill_exit = raw(KILL_EXIT, 10, 3);
		kill_exit.invocation = 2;
		let mut lone_enter = raw(KILL_ENTER, 10, 4);
		lone_enter.target_pid = 21;
		lone_enter.invocation = 4;

		for evt in [raw(EXEC_ENTER, 10, 1), kill_enter, kill_exit, lone_enter] {
			assert_eq!(publisher.try_publish(evt), Publish::Delivered);
		}
		drop(publisher);

		// -- Exec
		let tracker = worker.run()?;

		// -- Check
		let kinds: Vec<CommittedKind> = tracker.log().iter().map(|e| e.kind).collect();
		assert_eq!(kinds, vec![CommittedKind::ProcessStarted, CommittedKind::KillSucceeded]);
		assert_eq!(tracker.pending(), 0);

		let mut sent = Vec::new();
		while let Ok(evt) = rx.recv().await {
			sent.push(evt.seq);
		}
		let logged: Vec<u64> = tracker.log().iter().map(|e| e.seq).collect();
		assert_eq!(sent, vec![0, 1]);
		assert_eq!(sent, logged);

		Ok(())
	}
}

// endregion: --- Tests
