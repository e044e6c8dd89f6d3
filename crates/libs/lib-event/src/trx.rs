use flume::{Receiver, Sender};

use crate::{Error, Result};

/// Named async sender. The name only shows up in errors and logs.
pub struct Tx<T> {
	name: &'static str,
	tx: Sender<T>,
}

impl<T> Clone for Tx<T> {
	fn clone(&self) -> Self {
		Self {
			name: self.name,
			tx: self.tx.clone(),
		}
	}
}

impl<T> Tx<T> {
	pub async fn send(&self, item: T) -> Result<()> {
		self.tx
			.send_async(item)
			.await
			.map_err(|_| Error::EventSend { channel: self.name })
	}

	/// For producers running outside the async runtime.
	pub fn send_blocking(&self, item: T) -> Result<()> {
		self.tx.send(item).map_err(|_| Error::EventSend { channel: self.name })
	}
}

pub struct Rx<T> {
	name: &'static str,
	rx: Receiver<T>,
}

impl<T> Rx<T> {
	pub async fn recv(&self) -> Result<T> {
		let res = self.rx.recv_async().await?;
		Ok(res)
	}

	pub fn name(&self) -> &'static str {
		self.name
	}
}

pub fn new_channel<T>(name: &'static str) -> (Tx<T>, Rx<T>) {
	let (tx, rx) = flume::unbounded::<T>();

	(Tx { name, tx }, Rx { name, rx })
}

// region:    --- Tests


// endregion: --- Tests
