use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::Result;

/// Owns the async workers and the token that stops them.
pub struct Supervisor {
	shutdown: CancellationToken,
	tasks: JoinSet<Result<()>>,
}

impl Supervisor {
	pub fn new() -> Self {
		Self {
			shutdown: CancellationToken::new(),
			tasks: JoinSet::new(),
		}
	}

	pub fn token(&self) -> CancellationToken {
		self.shutdown.clone()
	}

	/// A worker that fails cancels the token, so the rest wind down too.
	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = Result<()>> + Send + 'static,
	{
		let token = self.shutdown.clone();
		self.tasks.spawn(async move {
			let res = fut.await;
			if res.is_err() {
				token.cancel();
			}
			res
		});
	}

	/// Cancels the token and waits for every worker. The first worker error
	/// is returned once all of them have stopped.
	pub async fn shutdown(mut self) -> Result<()> {
		info!("supervisor shutdown starting");
		self.shutdown.cancel();

		let mut first_err = None;
		while let Some(res) = self.tasks.join_next().await {
			let res = res.map_err(crate::Error::from).and_then(|res| res);
			if let Err(err) = res {
				warn!("worker failed: {err}");
				first_err.get_or_insert(err);
			}
		}
		info!("supervisor shutdown complete");

		match first_err {
			Some(err) => Err(err),
			None => Ok(()),
		}
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	#[tokio::test]
	async fn shutdown_cancels_and_joins_workers() -> Result<()> {
		// -- Setup & Fixtures
		let mut supervisor = Supervisor::new();
		let token = supervisor.token();
		supervisor.spawn(async move {
			token.cancelled().await;
			Ok(())
		});

		// -- Exec
		let res = supervisor.shutdown().await;

		// -- Check
		assert!(res.is_ok());

		Ok(())
	}

	#[tokio::test]
	async fn worker_error_cancels_and_is_reported() -> Result<()> {
		// -- Setup & Fixtures
		let mut supervisor = Supervisor::new();
		let token = supervisor.token();
		supervisor.spawn(async { Err(crate::Error::custom("boom")) });

		// -- Exec
		token.cancelled().await;
		let res = supervisor.shutdown().await;

		// -- Check
		assert!(matches!(res, Err(crate::Error::Custom(msg)) if msg == "boom"));

		Ok(())
	}
}

// endregion: --- Tests
