use std::fmt;

use lib_ebpf_common::{RawEvent, COMM_LEN, EXEC_ENTER, EXIT_ENTER, KILL_ENTER, KILL_EXIT};
use serde::{Serialize, Serializer};

use crate::{Error, Result};

// region:    --- Raw side

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
	ExecEnter,
	ExitEnter,
	KillEnter,
	KillExit,
}

impl TryFrom<u8> for RawKind {
	type Error = Error;

	fn try_from(val: u8) -> Result<Self> {
		match val {
			EXEC_ENTER => Ok(Self::ExecEnter),
			EXIT_ENTER => Ok(Self::ExitEnter),
			KILL_ENTER => Ok(Self::KillEnter),
			KILL_EXIT => Ok(Self::KillExit),
			other => Err(Error::UnknownEventKind(other)),
		}
	}
}

/// Identity of the calling thread. Syscalls on one thread are serialized, so
/// at most one `kill` can be in flight per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadKey {
	pub tgid: u32,
	pub tid: u32,
}

impl From<&RawEvent> for ThreadKey {
	fn from(evt: &RawEvent) -> Self {
		Self {
			tgid: evt.tgid,
			tid: evt.pid,
		}
	}
}

// endregion: --- Raw side

// region:    --- Comm

/// Kernel task name, NUL padded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Comm([u8; COMM_LEN]);

impl Comm {
	pub fn new(raw: [u8; COMM_LEN]) -> Self {
		Self(raw)
	}

	pub fn as_bytes(&self) -> &[u8; COMM_LEN] {
		&self.0
	}
}

impl From<&str> for Comm {
	fn from(val: &str) -> Self {
		let mut raw = [0u8; COMM_LEN];
		let len = val.len().min(COMM_LEN - 1);
		raw[..len].copy_from_slice(&val.as_bytes()[..len]);
		Self(raw)
	}
}

impl fmt::Display for Comm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let len = self.0.iter().position(|&b| b == 0).unwrap_or(COMM_LEN);
		f.write_str(&String::from_utf8_lossy(&self.0[..len]))
	}
}

impl fmt::Debug for Comm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", self.to_string())
	}
}

impl Serialize for Comm {
	fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

// endregion: --- Comm

// region:    --- Committed side

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommittedKind {
	ProcessStarted = 1,
	ProcessExited = 2,
	KillSucceeded = 3,
}

impl TryFrom<u8> for CommittedKind {
	type Error = Error;

	fn try_from(val: u8) -> Result<Self> {
		match val {
			1 => Ok(Self::ProcessStarted),
			2 => Ok(Self::ProcessExited),
			3 => Ok(Self::KillSucceeded),
			other => Err(Error::UnknownCommittedKind(other)),
		}
	}
}

/// One entry of the ordered, append-only output log.
///
/// `actor_generation` and `target_generation` pin the pids to the registry
/// record that was current when the event was committed, so a later pid reuse
/// cannot re-point them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommittedEvent {
	pub seq: u64,
	pub timestamp: u64,
	pub kind: CommittedKind,
	pub actor_pid: u32,
	pub actor_comm: Comm,
	pub actor_uid: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub actor_generation: Option<u32>,
	/// Raw `kill` argument, `KillSucceeded` only. May be 0, -1 or a negated
	/// process group id.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_pid: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub target_generation: Option<u32>,
}

// endregion: --- Committed side

// region:    --- Tests


// endregion: --- Tests
