#![no_std]
#![no_main]

use aya_ebpf::{
	macros::{map, tracepoint},
	maps::{LruHashMap, PerCpuArray, RingBuf},
	programs::TracePointContext,
};
use lib_ebpf_common::{EVT_MAP_BYTES, KILL_INVOCATIONS_MAX};

mod hooks;
mod transport;
mod utils;
mod vmlinux;

#[map]
static EVT_MAP: RingBuf = RingBuf::with_byte_size(EVT_MAP_BYTES, 0);

#[map]
static KILL_INVOCATIONS: LruHashMap<u64, u64> = LruHashMap::with_max_entries(KILL_INVOCATIONS_MAX, 0);

#[map]
static DROPPED: PerCpuArray<u64> = PerCpuArray::with_max_entries(1, 0);

#[map]
static PROBE_FAULTS: PerCpuArray<u64> = PerCpuArray::with_max_entries(1, 0);

#[tracepoint]
pub fn sched_process_exec(ctx: TracePointContext) -> u32 {
	match hooks::try_sched_process_exec(ctx) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[tracepoint]
pub fn sched_process_exit(ctx: TracePointContext) -> u32 {
	match hooks::try_sched_process_exit(ctx) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[tracepoint]
pub fn sys_enter_kill(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_kill(ctx) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[tracepoint]
pub fn sys_exit_kill(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_exit_kill(ctx) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
	loop {}
}

#[link_section = "license"]
#[no_mangle]
static LICENSE: [u8; 13] = *b"Dual MIT/GPL\0";
