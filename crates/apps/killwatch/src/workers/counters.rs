use std::{sync::Arc, time::Duration};

use aya::maps::{MapData, PerCpuArray};
use lib_event::Counters;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::Result;

/// Mirrors the probes' per-CPU counters into the shared [`Counters`].
pub struct KernelCountersWorker {
	dropped: PerCpuArray<MapData, u64>,
	probe_faults: PerCpuArray<MapData, u64>,
	counters: Arc<Counters>,
	interval: Duration,
	shutdown: CancellationToken,
}

impl KernelCountersWorker {
	pub fn start(
		dropped: PerCpuArray<MapData, u64>,
		probe_faults: PerCpuArray<MapData, u64>,
		counters: Arc<Counters>,
		interval: Duration,
		shutdown: CancellationToken,
	) -> Result<Self> {
		Ok(Self {
			dropped,
			probe_faults,
			counters,
			interval,
			shutdown,
		})
	}

	pub async fn run(self) -> Result<()> {
		let mut ticker = tokio::time::interval(self.interval);

		loop {
			tokio::select! {
				_ = self.shutdown.cancelled() => break,
				_ = ticker.tick() => self.poll(),
			}
		}

		// Last read so the final snapshot includes drops up to detach.
		self.poll();
		Ok(())
	}

	fn poll(&self) {
		match sum_per_cpu(&self.dropped) {
			Ok(total) => self.counters.set_kernel_dropped(total),
			Err(err) => warn!("reading {} failed: {err}", lib_ebpf_common::DROPPED_MAP),
		}
		match sum_per_cpu(&self.probe_faults) {
			Ok(total) => self.counters.set_probe_faults(total),
			Err(err) => warn!("reading {} failed: {err}", lib_ebpf_common::PROBE_FAULTS_MAP),
		}
	}
}

fn sum_per_cpu(map: &PerCpuArray<MapData, u64>) -> Result<u64> {
	let values = map.get(&0, 0)?;
	Ok(values.iter().sum())
}
