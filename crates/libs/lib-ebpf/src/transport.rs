use aya_ebpf::maps::PerCpuArray;
use lib_ebpf_common::RawEvent;

use crate::{DROPPED, EVT_MAP};

/// Pushes the event into the ring buffer. A full buffer drops the event and
/// bumps the per-CPU drop counter; the traced syscall is never delayed.
pub fn publish(event: &RawEvent) {
	if EVT_MAP.output(event, 0).is_err() {
		bump(&DROPPED);
	}
}

pub fn bump(counter: &PerCpuArray<u64>) {
	if let Some(slot) = counter.get_ptr_mut(0) {
		unsafe { *slot += 1 };
	}
}
