use std::{sync::Arc, time::Duration};

use aya::Ebpf;
use lib_event::{transport::Transport, trx::new_channel, Counters};
use lib_tracker::{CommittedEvent, RawEvent, Tracker};
use tracing::{info, warn};

use crate::{
	cli::args::RunArgs,
	config::{Overrides, Settings},
	loader::load_hooks,
	supervisor::Supervisor,
	trace::RawRecorder,
	utils::{bump_memlock_rlimit, cancel_after, install_signal_handlers},
	workers::{write_counters, CorrelatorWorker, KernelCountersWorker, RingBufWorker, SinkWorker, SinkWriter},
	Result,
};

const COUNTER_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub async fn run(args: RunArgs) -> Result<()> {
	let overrides = Overrides {
		staleness: args.staleness.map(Into::into),
		capacity: args.capacity,
	};
	let settings = Settings::load(args.config.as_deref(), overrides)?;
	info!(?settings, "starting");

	bump_memlock_rlimit();

	let mut ebpf = Ebpf::load_file(&args.bpf_object)?;
	if let Err(e) = aya_log::EbpfLogger::init(&mut ebpf) {
		// This can happen if you remove all log statements from your eBPF program.
		warn!("failed to initialize eBPF logger: {e}");
	}
	let hooks = load_hooks(&mut ebpf)?;

	let counters = Arc::new(Counters::new());
	let (publisher, drain) = Transport::bounded::<RawEvent>(settings.capacity, counters.clone());
	let (commit_tx, commit_rx) = new_channel::<CommittedEvent>("committed");
	let recorder = args.record_raw.as_deref().map(RawRecorder::create).transpose()?;

	let mut supervisor = Supervisor::new();
	install_signal_handlers(supervisor.token())?;
	if let Some(run_time) = args.time {
		cancel_after(supervisor.token(), run_time.into());
	}

	let ringbuf_worker = RingBufWorker::start(
		hooks.ringbuf,
		publisher,
		counters.clone(),
		recorder,
		supervisor.token(),
	)?;
	let counters_worker = KernelCountersWorker::start(
		hooks.dropped,
		hooks.probe_faults,
		counters.clone(),
		COUNTER_POLL_INTERVAL,
		supervisor.token(),
	)?;
	let sink_worker = SinkWorker::start(SinkWriter::create(&args.out)?, commit_rx)?;
	let correlator_worker = CorrelatorWorker::start(
		Tracker::new(settings.correlator.clone(), counters.clone()),
		drain,
		commit_tx,
		settings.poll_interval,
	)?;

	supervisor.spawn(ringbuf_worker.run());
	supervisor.spawn(counters_worker.run());
	supervisor.spawn(sink_worker.run());
	let correlator = tokio::task::spawn_blocking(move || correlator_worker.run());

	info!(out = %args.out.display(), "tracing kill() calls");
	supervisor.token().cancelled().await;

	// The correlator stops once the ring buffer worker drops its publisher,
	// and the sink once the correlator drops its sender.
	let tracker = correlator.await??;
	supervisor.shutdown().await?;
	drop(ebpf);

	let snapshot = counters.snapshot();
	write_counters(&args.out, &snapshot)?;
	log_summary(&tracker);

	Ok(())
}

pub fn log_summary(tracker: &Tracker) {
	for kill in tracker.kills() {
		info!(
			seq = kill.seq,
			actor = kill.actor_pid,
			comm = %kill.actor_comm,
			uid = kill.actor_uid,
			target = ?kill.target_pid,
			"kill succeeded"
		);
	}

	let snapshot = tracker.counters();
	if snapshot != Default::default() {
		warn!(?snapshot, "degraded confidence: some events were dropped or unmatched");
	}
	info!(
		committed = tracker.log().len(),
		kills = tracker.kills().count(),
		"summary"
	);
}
