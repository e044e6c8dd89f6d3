#![no_std]

mod event;

pub use event::*;

/// Ring buffer carrying [`RawEvent`]s from the probes to userspace.
pub const EVT_MAP: &str = "EVT_MAP";
/// Per-CPU count of events the probes failed to push into [`EVT_MAP`].
pub const DROPPED_MAP: &str = "DROPPED";
/// In-flight `kill` calls: `pid_tgid` -> invocation id of the pending entry.
pub const KILL_INVOCATIONS_MAP: &str = "KILL_INVOCATIONS";
/// Per-CPU count of probe invocations skipped on a kernel read failure.
pub const PROBE_FAULTS_MAP: &str = "PROBE_FAULTS";

/// Byte size of the event ring buffer (shared by all CPUs).
pub const EVT_MAP_BYTES: u32 = 256 * 1024;

/// Upper bound on threads tracked inside `kill` at once. LRU evicted.
pub const KILL_INVOCATIONS_MAX: u32 = 16 * 1024;

pub const COMM_LEN: usize = 16;
