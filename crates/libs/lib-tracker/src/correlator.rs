use std::{
	collections::{HashMap, VecDeque},
	time::Duration,
};

use lib_ebpf_common::RawEvent;
use lib_event::Counters;
use tracing::{debug, warn};

use crate::{Comm, CommittedEvent, CommittedKind, ProcessRegistry, RawKind, ThreadKey};

// Lazy entries allowed in the eviction order on top of twice the live ones.
const ORDER_SLACK: usize = 64;

#[derive(Debug, Clone)]
pub struct CorrelatorConfig {
	/// How long a `KillEnter` may wait for its `KillExit`.
	pub staleness: Duration,
	/// Minimum event-time distance between two opportunistic sweeps.
	pub sweep_interval: Duration,
	/// Hard cap on pending entries. Must be at least 1.
	pub max_pending: usize,
}

impl Default for CorrelatorConfig {
	fn default() -> Self {
		Self {
			staleness: Duration::from_secs(5),
			sweep_interval: Duration::from_secs(1),
			max_pending: 65_536,
		}
	}
}

/// A `KillEnter` waiting for the matching `KillExit` on the same thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionalKill {
	pub entered_at: u64,
	/// Kernel-assigned id of the call. The exit must carry the same one.
	pub invocation: u64,
	pub actor_pid: u32,
	pub actor_uid: u32,
	pub actor_comm: Comm,
	pub target_pid: i32,
}

/// Single-consumer state machine turning raw probe events into committed
/// events. Exactly one thread drives it, so the provisional table needs no
/// locking.
pub struct Correlator {
	config: CorrelatorConfig,
	provisional: HashMap<ThreadKey, ProvisionalKill>,
	// Insertion order for eviction when full. Entries whose invocation no
	// longer matches the table are skipped and dropped lazily.
	order: VecDeque<(u64, ThreadKey)>,
	next_seq: u64,
	last_sweep: u64,
}

impl Correlator {
	pub fn new(config: CorrelatorConfig) -> Self {
		Self {
			config,
			provisional: HashMap::new(),
			order: VecDeque::new(),
			next_seq: 0,
			last_sweep: 0,
		}
	}

	pub fn process(
		&mut self,
		evt: &RawEvent,
		registry: &mut ProcessRegistry,
		counters: &Counters,
	) -> Option<CommittedEvent> {
		let kind = match RawKind::try_from(evt.kind) {
			Ok(kind) => kind,
			Err(err) => {
				counters.malformed_event();
				debug!("dropping raw event: {err}");
				return None;
			}
		};

		self.maybe_sweep(evt.timestamp, counters);

		match kind {
			RawKind::ExecEnter => Some(self.on_exec(evt, registry)),
			RawKind::ExitEnter => self.on_exit(evt, registry, counters),
			RawKind::KillEnter => {
				self.on_kill_enter(evt, counters);
				None
			}
			RawKind::KillExit => self.on_kill_exit(evt, registry, counters),
		}
	}

	/// Evicts every provisional entry older than the staleness window at
	/// `now` (monotonic ns). Returns the number evicted.
	pub fn sweep(&mut self, now: u64, counters: &Counters) -> usize {
		let staleness = nanos(self.config.staleness);
		let before = self.provisional.len();

		self.provisional
			.retain(|_, p| now.saturating_sub(p.entered_at) <= staleness);
		self.compact_order();
		self.last_sweep = now;

		let evicted = before - self.provisional.len();
		if evicted > 0 {
			counters.provisional_evicted(evicted as u64);
			debug!(evicted, "evicted stale provisional kills");
		}
		evicted
	}

	/// Drops every pending entry. Their exits were never observed and can no
	/// longer be resolved.
	pub fn discard_pending(&mut self) -> usize {
		let pending = self.provisional.len();
		self.provisional.clear();
		self.order.clear();
		pending
	}

	pub fn pending(&self) -> usize {
		self.provisional.len()
	}

	pub fn provisional(&self, key: &ThreadKey) -> Option<&ProvisionalKill> {
		self.provisional.get(key)
	}

	/// Sequence number the next committed event will get.
	pub fn next_seq(&self) -> u64 {
		self.next_seq
	}
}

// region:    --- Handlers

impl Correlator {
	fn on_exec(&mut self, evt: &RawEvent, registry: &mut ProcessRegistry) -> CommittedEvent {
		let comm = Comm::new(evt.comm);
		let generation = registry.record_started(evt.tgid, evt.ppid, evt.uid, comm, evt.timestamp);

		self.commit(evt, CommittedKind::ProcessStarted, Some(generation), None, None)
	}

	fn on_exit(
		&mut self,
		evt: &RawEvent,
		registry: &mut ProcessRegistry,
		counters: &Counters,
	) -> Option<CommittedEvent> {
		// The thread cannot issue another syscall after this point.
		self.provisional.remove(&ThreadKey::from(evt));

		// Only the group leader's exit ends the process.
		if evt.pid != evt.tgid {
			return None;
		}

		let generation = registry.record_exited(evt.tgid, evt.timestamp);
		if generation.is_none() {
			counters.exit_without_start();
			debug!(pid = evt.tgid, "exit without a running record");
		}

		Some(self.commit(evt, CommittedKind::ProcessExited, generation, None, None))
	}

	fn on_kill_enter(&mut self, evt: &RawEvent, counters: &Counters) {
		let key = ThreadKey::from(evt);

		if !self.provisional.contains_key(&key) && self.provisional.len() >= self.config.max_pending {
			self.evict_oldest(counters);
		}
		if self.config.max_pending == 0 {
			return;
		}

		let pending = ProvisionalKill {
			entered_at: evt.timestamp,
			invocation: evt.invocation,
			actor_pid: evt.tgid,
			actor_uid: evt.uid,
			actor_comm: Comm::new(evt.comm),
			target_pid: evt.target_pid,
		};

		if self.provisional.insert(key, pending).is_some() {
			counters.provisional_replaced();
			warn!(tgid = key.tgid, tid = key.tid, "kill entry replaced an unmatched one");
		}
		self.order.push_back((evt.invocation, key));
		if self.order.len() > 2 * self.provisional.len() + ORDER_SLACK {
			self.compact_order();
		}
	}

	fn on_kill_exit(
		&mut self,
		evt: &RawEvent,
		registry: &ProcessRegistry,
		counters: &Counters,
	) -> Option<CommittedEvent> {
		let key = ThreadKey::from(evt);
		let Some(pending) = self.provisional.remove(&key) else {
			counters.kill_exit_unattributed();
			debug!(tgid = key.tgid, tid = key.tid, "kill exit without a matching entry");
			return None;
		};

		// A different call on the same thread: the exit of the pending one and
		// the enter of this one were both lost. Neither can be resolved.
		if evt.invocation == 0 || evt.invocation != pending.invocation {
			counters.kill_exit_unattributed();
			counters.provisional_evicted(1);
			debug!(
				tgid = key.tgid,
				tid = key.tid,
				pending = pending.invocation,
				exit = evt.invocation,
				"kill exit belongs to another call"
			);
			return None;
		}

		if evt.syscall_ret != 0 {
			return None;
		}

		let actor_generation = registry.current_generation(pending.actor_pid);
		let target_generation = u32::try_from(pending.target_pid)
			.ok()
			.filter(|pid| *pid > 0)
			.and_then(|pid| registry.current_generation(pid));

		let seq = self.take_seq();
		Some(CommittedEvent {
			seq,
			timestamp: evt.timestamp,
			kind: CommittedKind::KillSucceeded,
			actor_pid: pending.actor_pid,
			actor_comm: pending.actor_comm,
			actor_uid: pending.actor_uid,
			actor_generation,
			target_pid: Some(pending.target_pid),
			target_generation,
		})
	}
}

// endregion: --- Handlers

// region:    --- Support

impl Correlator {
	fn commit(
		&mut self,
		evt: &RawEvent,
		kind: CommittedKind,
		actor_generation: Option<u32>,
		target_pid: Option<i32>,
		target_generation: Option<u32>,
	) -> CommittedEvent {
		CommittedEvent {
			seq: self.take_seq(),
			timestamp: evt.timestamp,
			kind,
			actor_pid: evt.tgid,
			actor_comm: Comm::new(evt.comm),
			actor_uid: evt.uid,
			actor_generation,
			target_pid,
			target_generation,
		}
	}

	fn take_seq(&mut self) -> u64 {
		let seq = self.next_seq;
		self.next_seq += 1;
		seq
	}

	// Sweeps are driven by event time so a replayed trace evicts exactly the
	// same entries.
	fn maybe_sweep(&mut self, now: u64, counters: &Counters) {
		if now.saturating_sub(self.last_sweep) >= nanos(self.config.sweep_interval) {
			self.sweep(now, counters);
		}
	}

	fn is_live(&self, invocation: u64, key: &ThreadKey) -> bool {
		self.provisional.get(key).is_some_and(|p| p.invocation == invocation)
	}

	// Pops lazily removed entries until the oldest live one is found.
	fn evict_oldest(&mut self, counters: &Counters) {
		while let Some((invocation, key)) = self.order.pop_front() {
			if !self.is_live(invocation, &key) {
				continue;
			}

			self.provisional.remove(&key);
			counters.provisional_evicted(1);
			warn!(tgid = key.tgid, tid = key.tid, "provisional table full, evicted oldest entry");
			return;
		}
	}

	fn compact_order(&mut self) {
		let mut order = std::mem::take(&mut self.order);
		order.retain(|(invocation, key)| self.is_live(*invocation, key));
		self.order = order;
	}
}

fn nanos(duration: Duration) -> u64 {
	u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

// endregion: --- Support

// region:    --- Tests


// endregion: --- Tests
