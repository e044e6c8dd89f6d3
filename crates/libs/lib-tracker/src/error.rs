use derive_more::{Display, From};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	#[display("Unknown raw event kind {_0}")]
	UnknownEventKind(u8),
	#[display("Unknown committed event kind {_0}")]
	UnknownCommittedKind(u8),
	#[display("Input of {len} bytes is not a whole number of {record_size}-byte records")]
	InvalidRecordSize {
		len: usize,
		record_size: usize,
	},

	// -- Externals
	#[from]
	Io(std::io::Error),
}

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
