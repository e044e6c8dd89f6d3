use std::sync::Arc;

use aya::maps::{MapData, RingBuf};
use lib_event::{
	transport::{Publish, Publisher},
	Counters,
};
use lib_tracker::RawEvent;
use tokio::io::unix::AsyncFd;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use zerocopy::FromBytes;

use crate::{error::Result, trace::RawRecorder};

/// Drains the kernel ring buffer into the transport. Never blocks on the
/// consumer: a full transport drops the event.
pub struct RingBufWorker {
	ringbuf_fd: AsyncFd<RingBuf<MapData>>,
	publisher: Publisher<RawEvent>,
	counters: Arc<Counters>,
	recorder: Option<RawRecorder>,
	shutdown: CancellationToken,
}

impl RingBufWorker {
	pub fn start(
		ringbuf_fd: AsyncFd<RingBuf<MapData>>,
		publisher: Publisher<RawEvent>,
		counters: Arc<Counters>,
		recorder: Option<RawRecorder>,
		shutdown: CancellationToken,
	) -> Result<Self> {
		Ok(RingBufWorker {
			ringbuf_fd,
			publisher,
			counters,
			recorder,
			shutdown,
		})
	}

	pub async fn run(self) -> Result<()> {
		let Self {
			mut ringbuf_fd,
			publisher,
			counters,
			mut recorder,
			shutdown,
		} = self;

		loop {
			tokio::select! {
				_ = shutdown.cancelled() => break,

				guard = ringbuf_fd.readable_mut() => {
					let mut guard = guard?;
					drain_ring(guard.get_inner_mut(), &publisher, &counters, recorder.as_mut())?;
					guard.clear_ready();
				}
			}
		}

		// Whatever the probes pushed before detach is still worth delivering.
		let tail = drain_ring(ringbuf_fd.get_mut(), &publisher, &counters, recorder.as_mut())?;
		if let Some(recorder) = recorder.as_mut() {
			recorder.flush()?;
		}
		info!(tail, "ring buffer worker stopped");

		// Dropping the publisher here closes the transport for the consumer.
		Ok(())
	}
}

fn drain_ring(
	ring_buf: &mut RingBuf<MapData>,
	publisher: &Publisher<RawEvent>,
	counters: &Counters,
	mut recorder: Option<&mut RawRecorder>,
) -> Result<usize> {
	let mut read = 0;

	while let Some(item) = ring_buf.next() {
		read += 1;
		let Ok(evt) = RawEvent::read_from_bytes(item.as_ref()) else {
			counters.malformed_event();
			debug!(len = item.len(), "undersized ring buffer record");
			continue;
		};

		if let Some(recorder) = recorder.as_deref_mut() {
			recorder.record(&evt)?;
		}

		if publisher.try_publish(evt) == Publish::Dropped {
			debug!(kind = evt.kind, tgid = evt.tgid, "transport full, raw event dropped");
		}
	}

	Ok(read)
}
