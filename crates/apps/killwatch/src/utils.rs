use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::EnvFilter;

use crate::Result;

/// Logs to stderr, or to `log_path` when given. The returned guard must be
/// held until exit so buffered lines are flushed.
pub fn init_tracing(log_path: Option<&Path>) -> Option<WorkerGuard> {
	let Some(path) = log_path else {
		tracing_subscriber::fmt()
			.with_target(false)
			.with_env_filter(EnvFilter::from_default_env())
			.init();
		return None;
	};

	let dir = path.parent().unwrap_or(Path::new("."));
	let file = path.file_name().unwrap_or_default();

	let file_appender = rolling::never(dir, file);
	let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

	tracing_subscriber::fmt()
		.with_writer(non_blocking_writer)
		.with_ansi(false)
		.with_target(false)
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	Some(guard)
}

pub fn install_signal_handlers(token: CancellationToken) -> Result<()> {
	let t = token.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			info!("ctrl-c received");
		}
		t.cancel();
	});

	#[cfg(unix)]
	{
		use tokio::signal::unix::{signal, SignalKind};

		let mut sigterm = signal(SignalKind::terminate())?;
		tokio::spawn(async move {
			sigterm.recv().await;
			info!("SIGTERM received");
			token.cancel();
		});
	}
	Ok(())
}

/// Cancels `token` once `run_time` has elapsed, unless it is cancelled first.
pub fn cancel_after(token: CancellationToken, run_time: std::time::Duration) {
	tokio::spawn(async move {
		tokio::select! {
			_ = token.cancelled() => {}
			_ = tokio::time::sleep(run_time) => {
				info!("run time elapsed");
				token.cancel();
			}
		}
	});
}

pub fn bump_memlock_rlimit() {
	// Bump the memlock rlimit. This is needed for older kernels that don't use the
	// new memcg based accounting, see https://lwn.net/Articles/837122/
	let rlim = libc::rlimit {
		rlim_cur: libc::RLIM_INFINITY,
		rlim_max: libc::RLIM_INFINITY,
	};
	let ret = unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlim) };
	if ret != 0 {
		debug!("remove limit on locked memory failed, ret is: {ret}");
	}
}

/// Same clock as `bpf_ktime_get_ns`, so idle sweeps compare against event
/// timestamps.
pub fn monotonic_ns() -> u64 {
	let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
	let ret = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
	if ret != 0 {
		warn!("clock_gettime failed, ret is: {ret}");
		return 0;
	}
	(ts.tv_sec as u64) * 1_000_000_000 + ts.tv_nsec as u64
}

// region:    --- Tests


// endregion: --- Tests
