use aya::{
	maps::{MapData, PerCpuArray, RingBuf},
	programs::TracePoint,
	Ebpf,
};
use lib_ebpf_common::{DROPPED_MAP, EVT_MAP, PROBE_FAULTS_MAP};
use tokio::io::unix::AsyncFd;
use tracing::debug;

use crate::{Error, Result};

// (program, category, tracepoint)
const TRACEPOINTS: [(&str, &str, &str); 4] = [
	("sched_process_exec", "sched", "sched_process_exec"),
	("sched_process_exit", "sched", "sched_process_exit"),
	("sys_enter_kill", "syscalls", "sys_enter_kill"),
	("sys_exit_kill", "syscalls", "sys_exit_kill"),
];

/// Userspace handles on the loaded probes' maps.
pub struct Hooks {
	pub ringbuf: AsyncFd<RingBuf<MapData>>,
	pub dropped: PerCpuArray<MapData, u64>,
	pub probe_faults: PerCpuArray<MapData, u64>,
}

/// Attaches every probe. Any missing program or rejected attach is fatal.
pub fn load_hooks(ebpf: &mut Ebpf) -> Result<Hooks> {
	for (prog, category, name) in TRACEPOINTS {
		let tp: &mut TracePoint = ebpf.program_mut(prog).ok_or(Error::EbpfProgNotFound(prog))?.try_into()?;
		tp.load()?;
		tp.attach(category, name)?;
		debug!("attached {category}/{name}");
	}

	let ring_buf = RingBuf::try_from(ebpf.take_map(EVT_MAP).ok_or(Error::EbpfMapNotFound(EVT_MAP))?)?;
	let dropped = PerCpuArray::try_from(ebpf.take_map(DROPPED_MAP).ok_or(Error::EbpfMapNotFound(DROPPED_MAP))?)?;
	let probe_faults = PerCpuArray::try_from(
		ebpf.take_map(PROBE_FAULTS_MAP)
			.ok_or(Error::EbpfMapNotFound(PROBE_FAULTS_MAP))?,
	)?;

	Ok(Hooks {
		ringbuf: AsyncFd::new(ring_buf)?,
		dropped,
		probe_faults,
	})
}
