use aya_ebpf::helpers::{
	bpf_get_current_comm, bpf_get_current_pid_tgid, bpf_get_current_uid_gid, bpf_ktime_get_ns,
	bpf_probe_read_kernel, r#gen::bpf_get_current_task,
};
use lib_ebpf_common::RawEvent;

use crate::vmlinux::task_struct;

/// Fills the caller identity fields shared by every probe.
pub fn current_event(kind: u8) -> RawEvent {
	let pid_tgid = bpf_get_current_pid_tgid();

	let mut event = RawEvent::empty(kind);
	event.timestamp = unsafe { bpf_ktime_get_ns() };
	event.pid = pid_tgid as u32;
	event.tgid = (pid_tgid >> 32) as u32;
	event.uid = bpf_get_current_uid_gid() as u32;
	event.comm = bpf_get_current_comm().unwrap_or([0u8; 16]);
	event
}

/// `current->real_parent->tgid`. The adopter after reparenting is `parent`,
/// which is not what we want.
pub unsafe fn real_parent_tgid() -> Result<u32, i64> {
	let task = bpf_get_current_task() as *const task_struct;
	if task.is_null() {
		return Err(1);
	}

	let parent = bpf_probe_read_kernel(&(*task).real_parent)?;
	if parent.is_null() {
		return Err(1);
	}

	let tgid = bpf_probe_read_kernel(&(*parent).tgid)?;
	Ok(tgid as u32)
}
