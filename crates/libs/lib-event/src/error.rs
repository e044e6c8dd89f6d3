use derive_more::{Display, From};
use flume::{RecvError, RecvTimeoutError};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	#[display("Send on closed channel '{channel}'")]
	EventSend {
		channel: &'static str,
	},
	EventRecv(RecvError),
	#[display("All publishers disconnected")]
	TransportClosed,
}

impl From<RecvError> for Error {
	fn from(err: RecvError) -> Self {
		Self::EventRecv(err)
	}
}

impl From<RecvTimeoutError> for Error {
	fn from(err: RecvTimeoutError) -> Self {
		match err {
			RecvTimeoutError::Disconnected => Self::TransportClosed,
			RecvTimeoutError::Timeout => Self::Custom("receive timed out".to_string()),
		}
	}
}

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
