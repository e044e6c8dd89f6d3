use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::COMM_LEN;

// 1 => EXEC_ENTER  (sched_process_exec)
// 2 => EXIT_ENTER  (sched_process_exit)
// 3 => KILL_ENTER  (sys_enter_kill)
// 4 => KILL_EXIT   (sys_exit_kill)
pub const EXEC_ENTER: u8 = 1;
pub const EXIT_ENTER: u8 = 2;
pub const KILL_ENTER: u8 = 3;
pub const KILL_EXIT: u8 = 4;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct RawEvent {
	pub timestamp: u64,        // 0..8   | bpf_ktime_get_ns
	pub syscall_ret: i64,      // 8..16  | KILL_EXIT only
	pub invocation: u64,       // 16..24 | KILL_* only, timestamp of the KILL_ENTER
	pub pid: u32,              // 24..28 | thread id
	pub tgid: u32,             // 28..32 | thread-group id
	pub ppid: u32,             // 32..36 | real_parent->tgid
	pub uid: u32,              // 36..40
	pub target_pid: i32,       // 40..44 | KILL_* only, verbatim syscall arg
	pub comm: [u8; COMM_LEN],  // 44..60
	pub kind: u8,              // 60..61
	pub _pad0: [u8; 3],        // 61..64
}

impl RawEvent {
	pub const fn empty(kind: u8) -> Self {
		Self {
			timestamp: 0,
			syscall_ret: 0,
			invocation: 0,
			pid: 0,
			tgid: 0,
			ppid: 0,
			uid: 0,
			target_pid: 0,
			comm: [0u8; COMM_LEN],
			kind,
			_pad0: [0u8; 3],
		}
	}
}

const _: () = assert!(core::mem::size_of::<RawEvent>() == 64);
