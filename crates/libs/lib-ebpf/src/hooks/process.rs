use aya_ebpf::programs::TracePointContext;
use aya_log_ebpf::debug;
use lib_ebpf_common::{EXEC_ENTER, EXIT_ENTER};

use crate::{
	transport::{bump, publish},
	utils::{current_event, real_parent_tgid},
	PROBE_FAULTS,
};

pub fn try_sched_process_exec(ctx: TracePointContext) -> Result<u32, u32> {
	let mut event = current_event(EXEC_ENTER);

	event.ppid = match unsafe { real_parent_tgid() } {
		Ok(ppid) => ppid,
		Err(e) => {
			bump(&PROBE_FAULTS);
			debug!(&ctx, "exec: real_parent read failed for tgid {}: {}", event.tgid, e);
			return Err(1);
		}
	};

	publish(&event);
	Ok(0)
}

// Fires once per exiting thread; the consumer decides whether the whole
// thread group is gone (pid == tgid).
pub fn try_sched_process_exit(ctx: TracePointContext) -> Result<u32, u32> {
	let mut event = current_event(EXIT_ENTER);

	event.ppid = match unsafe { real_parent_tgid() } {
		Ok(ppid) => ppid,
		Err(e) => {
			bump(&PROBE_FAULTS);
			debug!(&ctx, "exit: real_parent read failed for tgid {}: {}", event.tgid, e);
			return Err(1);
		}
	};

	publish(&event);
	Ok(0)
}
