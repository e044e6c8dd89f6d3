use aya_ebpf::{helpers::bpf_get_current_pid_tgid, programs::TracePointContext};
use lib_ebpf_common::{KILL_ENTER, KILL_EXIT};

use crate::{
	transport::{bump, publish},
	utils::current_event,
	KILL_INVOCATIONS, PROBE_FAULTS,
};

/*
name: sys_enter_kill
format:
	field:unsigned short common_type;	offset:0;	size:2;	signed:0;
	field:unsigned char common_flags;	offset:2;	size:1;	signed:0;
	field:unsigned char common_preempt_count;	offset:3;	size:1;	signed:0;
	field:int common_pid;	offset:4;	size:4;	signed:1;

	field:int __syscall_nr;	offset:8;	size:4;	signed:1;
	field:pid_t pid;	offset:16;	size:8;	signed:0;
	field:int sig;	offset:24;	size:8;	signed:0;

name: sys_exit_kill
format:
	(common fields as above)
	field:int __syscall_nr;	offset:8;	size:4;	signed:1;
	field:long ret;	offset:16;	size:8;	signed:1;
*/
const KILL_PID_OFFSET: usize = 16;
const KILL_RET_OFFSET: usize = 16;

pub fn try_sys_enter_kill(ctx: TracePointContext) -> Result<u32, u32> {
	let target = match unsafe { ctx.read_at::<u64>(KILL_PID_OFFSET) } {
		Ok(val) => val,
		Err(_) => {
			bump(&PROBE_FAULTS);
			return Err(1);
		}
	};

	let mut event = current_event(KILL_ENTER);
	// pid_t is forwarded verbatim: 0, -1 and negative group ids included.
	event.target_pid = target as i32;
	// Identifies this call. The exit hook echoes it back.
	event.invocation = event.timestamp;
	if KILL_INVOCATIONS
		.insert(&bpf_get_current_pid_tgid(), &event.invocation, 0)
		.is_err()
	{
		bump(&PROBE_FAULTS);
	}

	publish(&event);
	Ok(0)
}

pub fn try_sys_exit_kill(ctx: TracePointContext) -> Result<u32, u32> {
	let ret = match unsafe { ctx.read_at::<i64>(KILL_RET_OFFSET) } {
		Ok(val) => val,
		Err(_) => {
			bump(&PROBE_FAULTS);
			return Err(1);
		}
	};

	let pid_tgid = bpf_get_current_pid_tgid();
	let mut event = current_event(KILL_EXIT);
	event.syscall_ret = ret;
	// 0 when the enter was never stashed; userspace treats it as unmatched.
	event.invocation = match unsafe { KILL_INVOCATIONS.get(&pid_tgid) } {
		Some(invocation) => *invocation,
		None => 0,
	};
	let _ = KILL_INVOCATIONS.remove(&pid_tgid);

	publish(&event);
	Ok(0)
}
