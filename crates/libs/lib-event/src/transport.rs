//! Best-effort, bounded event transport.
//!
//! Many producers publish into one consumer. Producers never block: when the
//! queue is full the event is dropped and counted. Events from a single
//! producer keep their order; nothing is promised across producers.

use std::{sync::Arc, time::Duration};

use flume::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::debug;

use crate::{Counters, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
	Delivered,
	Dropped,
}

pub struct Transport;

impl Transport {
	pub fn bounded<T>(capacity: usize, counters: Arc<Counters>) -> (Publisher<T>, Drain<T>) {
		let (tx, rx) = flume::bounded::<T>(capacity);

		(Publisher { tx, counters }, Drain { rx })
	}
}

pub struct Publisher<T> {
	tx: Sender<T>,
	counters: Arc<Counters>,
}

impl<T> Clone for Publisher<T> {
	fn clone(&self) -> Self {
		Self {
			tx: self.tx.clone(),
			counters: self.counters.clone(),
		}
	}
}

impl<T> Publisher<T> {
	pub fn try_publish(&self, event: T) -> Publish {
		match self.tx.try_send(event) {
			Ok(()) => Publish::Delivered,
			Err(TrySendError::Full(_)) => {
				self.counters.transport_dropped();
				Publish::Dropped
			}
			Err(TrySendError::Disconnected(_)) => {
				self.counters.transport_dropped();
				debug!("transport consumer gone, event dropped");
				Publish::Dropped
			}
		}
	}
}

pub struct Drain<T> {
	rx: Receiver<T>,
}

impl<T> Drain<T> {
	/// Waits at most `timeout` for the next event. `Ok(None)` on timeout,
	/// `Err(Error::TransportClosed)` once every publisher is gone and the
	/// queue is empty.
	pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<T>> {
		match self.rx.recv_timeout(timeout) {
			Ok(evt) => Ok(Some(evt)),
			Err(RecvTimeoutError::Timeout) => Ok(None),
			Err(err @ RecvTimeoutError::Disconnected) => {
				debug!("transport closed, all publishers gone");
				Err(Error::from(err))
			}
		}
	}

	/// Everything currently queued, without waiting.
	pub fn try_iter(&self) -> impl Iterator<Item = T> + '_ {
		self.rx.try_iter()
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use std::{
		io,
		sync::{Arc, Mutex},
	};

	use super::*;

	#[derive(Clone, Default)]
	struct Captured(Arc<Mutex<Vec<u8>>>);

	impl io::Write for Captured {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			let mut out = self.0.lock().map_err(|_| io::Error::other("poisoned"))?;
			out.extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	impl Captured {
		fn text(&self) -> String {
			self.0.lock().map(|out| String::from_utf8_lossy(&out).into_owned()).unwrap_or_default()
		}
	}

	#[test]
	fn overflow_drops_and_counts() -> Result<()> {
		// -- Setup & Fixtures
		let counters = Arc::new(Counters::new());
		let (publisher, drain) = Transport::bounded::<u32>(2, counters.clone());

		// -- Exec
		let results: Vec<Publish> = (0..4).map(|i| publisher.try_publish(i)).collect();

		// -- Check
		assert_eq!(
			results,
			vec![Publish::Delivered, Publish::Delivered, Publish::Dropped, Publish::Dropped]
		);
		assert_eq!(counters.snapshot().raw_events_dropped, 2);
		assert_eq!(drain.try_iter().collect::<Vec<_>>(), vec![0, 1]);

		Ok(())
	}

	#[test]
	fn per_producer_order_is_kept() -> Result<()> {
		// -- Setup & Fixtures
		let counters = Arc::new(Counters::new());
		let (publisher, drain) = Transport::bounded::<(u8, u32)>(64, counters);
		let other = publisher.clone();

		// -- Exec
		for i in 0..10 {
			publisher.try_publish((0, i));
			other.try_publish((1, i));
		}

		// -- Check
		let events: Vec<_> = drain.try_iter().collect();
		for producer in [0u8, 1] {
			let seen: Vec<u32> = events.iter().filter(|(p, _)| *p == producer).map(|(_, i)| *i).collect();
			assert_eq!(seen, (0..10).collect::<Vec<_>>());
		}

		Ok(())
	}

	#[test]
	fn recv_timeout_reports_idle_then_closed() -> Result<()> {
		// -- Setup & Fixtures
		let counters = Arc::new(Counters::new());
		let (publisher, drain) = Transport::bounded::<u32>(4, counters);

		// -- Exec & Check
		assert_eq!(drain.recv_timeout(Duration::from_millis(5))?, None);
		publisher.try_publish(9);
		drop(publisher);
		assert_eq!(drain.recv_timeout(Duration::from_millis(5))?, Some(9));
		assert!(matches!(
			drain.recv_timeout(Duration::from_millis(5)),
			Err(Error::TransportClosed)
		));

		Ok(())
	}

	#[test]
	fn closing_is_logged_at_debug() -> Result<()> {
		// -- Setup & Fixtures
		let captured = Captured::default();
		let writer = captured.clone();
		let subscriber = tracing_subscriber::fmt()
			.with_max_level(tracing::Level::DEBUG)
			.with_writer(move || writer.clone())
			.finish();
		let counters = Arc::new(Counters::new());
		let (publisher, drain) = Transport::bounded::<u32>(4, counters);

		// -- Exec
		let res = tracing::subscriber::with_default(subscriber, || {
			drop(publisher);
			drain.recv_timeout(Duration::from_millis(5))
		});

		// -- Check
		assert!(matches!(res, Err(Error::TransportClosed)));
		assert!(captured.text().contains("transport closed"));

		Ok(())
	}

	#[test]
	fn publishing_to_a_gone_consumer_is_a_drop() -> Result<()> {
		// -- Setup & Fixtures
		let counters = Arc::new(Counters::new());
		let (publisher, drain) = Transport::bounded::<u32>(4, counters.clone());

		// -- Exec
		drop(drain);
		let res = publisher.try_publish(1);

		// -- Check
		assert_eq!(res, Publish::Dropped);
		assert_eq!(counters.snapshot().raw_events_dropped, 1);

		Ok(())
	}
}

// endregion: --- Tests
