use derive_more::{Display, From};
use tokio::task::JoinError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	#[display("eBPF program '{_0}' not found in object")]
	EbpfProgNotFound(&'static str),
	#[display("eBPF map '{_0}' not found in object")]
	EbpfMapNotFound(&'static str),
	#[display("Invalid duration for '{field}': {value}")]
	InvalidDuration {
		field: &'static str,
		value: String,
	},
	#[display("'{field}' must be greater than zero")]
	ZeroSetting {
		field: &'static str,
	},
	#[display("Trace of {len} bytes is not a whole number of {record_size}-byte raw events")]
	InvalidTraceSize {
		len: usize,
		record_size: usize,
	},

	// -- Externals
	#[from]
	JoinError(JoinError),
	#[from]
	AyaEbpf(aya::EbpfError),
	#[from]
	AyaMaps(aya::maps::MapError),
	#[from]
	AyaProgram(aya::programs::ProgramError),
	#[from]
	Event(lib_event::Error),
	#[display("Tracker error: {_0}")]
	#[from]
	Tracker(lib_tracker::Error),
	#[from]
	Io(std::io::Error),
	#[from]
	Toml(toml::de::Error),
	#[from]
	Json(serde_json::Error),
}

// region:    --- Custom

impl Error {
	pub fn custom(val: impl Into<String>) -> Self {
		Self::Custom(val.into())
	}
}

// endregion: --- Custom

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
