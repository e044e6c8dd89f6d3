use std::{fs, path::Path, time::Duration};

use lib_tracker::CorrelatorConfig;
use serde::Deserialize;
use tracing::debug;

use crate::{Error, Result};

const DEFAULT_CAPACITY: usize = 65_536;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Effective settings: defaults, then the TOML file, then CLI overrides.
#[derive(Debug, Clone)]
pub struct Settings {
	pub correlator: CorrelatorConfig,
	pub capacity: usize,
	pub poll_interval: Duration,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			correlator: CorrelatorConfig::default(),
			capacity: DEFAULT_CAPACITY,
			poll_interval: DEFAULT_POLL_INTERVAL,
		}
	}
}

#[derive(Debug, Default)]
pub struct Overrides {
	pub staleness: Option<Duration>,
	pub capacity: Option<usize>,
}

// region:    --- File format

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
	tracker: TrackerSection,
	transport: TransportSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TrackerSection {
	staleness: Option<String>,
	sweep_interval: Option<String>,
	max_pending: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TransportSection {
	capacity: Option<usize>,
	poll_interval: Option<String>,
}

// endregion: --- File format

impl Settings {
	pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
		let file = match path {
			Some(path) => {
				debug!(path = %path.display(), "loading config");
				Self::parse_toml(&fs::read_to_string(path)?)?
			}
			None => Self::default(),
		};

		file.apply(overrides)
	}

	fn parse_toml(content: &str) -> Result<Self> {
		let file: FileConfig = toml::from_str(content)?;
		let mut settings = Self::default();

		if let Some(val) = file.tracker.staleness {
			settings.correlator.staleness = parse_duration("tracker.staleness", &val)?;
		}
		if let Some(val) = file.tracker.sweep_interval {
			settings.correlator.sweep_interval = parse_duration("tracker.sweep_interval", &val)?;
		}
		if let Some(val) = file.tracker.max_pending {
			settings.correlator.max_pending = val;
		}
		if let Some(val) = file.transport.capacity {
			settings.capacity = val;
		}
		if let Some(val) = file.transport.poll_interval {
			settings.poll_interval = parse_duration("transport.poll_interval", &val)?;
		}

		settings.validate()?;
		Ok(settings)
	}

	fn apply(mut self, overrides: Overrides) -> Result<Self> {
		if let Some(staleness) = overrides.staleness {
			self.correlator.staleness = staleness;
		}
		if let Some(capacity) = overrides.capacity {
			self.capacity = capacity;
		}

		self.validate()?;
		Ok(self)
	}

	fn validate(&self) -> Result<()> {
		if self.correlator.max_pending == 0 {
			return Err(Error::ZeroSetting {
				field: "tracker.max_pending",
			});
		}
		if self.capacity == 0 {
			return Err(Error::ZeroSetting {
				field: "transport.capacity",
			});
		}
		Ok(())
	}
}

fn parse_duration(field: &'static str, value: &str) -> Result<Duration> {
	humantime::parse_duration(value).map_err(|_| Error::InvalidDuration {
		field,
		value: value.to_string(),
	})
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	#[test]
	fn file_values_override_defaults() -> Result<()> {
		// -- Setup & Fixtures
		let content = r#"
[tracker]
staleness = "2s"
max_pending = 128

[transport]
poll_interval = "250ms"
"#;

		// -- Exec
		let settings = Settings::parse_toml(content)?;

		// -- Check
		assert_eq!(settings.correlator.staleness, Duration::from_secs(2));
		assert_eq!(settings.correlator.max_pending, 128);
		assert_eq!(settings.correlator.sweep_interval, Duration::from_secs(1));
		assert_eq!(settings.poll_interval, Duration::from_millis(250));
		assert_eq!(settings.capacity, DEFAULT_CAPACITY);

		Ok(())
	}

	#[test]
	fn cli_overrides_win() -> Result<()> {
		// -- Setup & Fixtures
		let content = "[tracker]\nstaleness = \"2s\"\n\n[transport]\ncapacity = 10\n";
		let overrides = Overrides {
			staleness: Some(Duration::from_secs(9)),
			capacity: None,
		};

		// -- Exec
		let settings = Settings::parse_toml(content)?.apply(overrides)?;

		// -- Check
		assert_eq!(settings.correlator.staleness, Duration::from_secs(9));
		assert_eq!(settings.capacity, 10);

		Ok(())
	}

	#[test]
	fn bad_duration_names_the_field() -> Result<()> {
		// -- Exec
		let res = Settings::parse_toml("[tracker]\nsweep_interval = \"soon\"\n");

		// -- Check
		assert!(matches!(
			res,
			Err(Error::InvalidDuration {
				field: "tracker.sweep_interval",
				..
			})
		));

		Ok(())
	}

	#[test]
	fn zero_max_pending_is_rejected() -> Result<()> {
		// -- Exec
		let res = Settings::parse_toml("[tracker]\nmax_pending = 0\n");

		// -- Check
		assert!(matches!(
			res,
			Err(Error::ZeroSetting {
				field: "tracker.max_pending"
			})
		));

		Ok(())
	}

	#[test]
	fn zero_capacity_is_rejected_from_file_and_cli() -> Result<()> {
		// -- Setup & Fixtures
		let overrides = Overrides {
			staleness: None,
			capacity: Some(0),
		};

		// -- Exec
		let from_file = Settings::parse_toml("[transport]\ncapacity = 0\n");
		let from_cli = Settings::default().apply(overrides);

		// -- Check
		for res in [from_file, from_cli] {
			assert!(matches!(
				res,
				Err(Error::ZeroSetting {
					field: "transport.capacity"
				})
			));
		}

		Ok(())
	}

	#[test]
	fn unknown_keys_are_rejected() -> Result<()> {
		// -- Exec
		let res = Settings::parse_toml("[tracker]\nstalenes = \"1s\"\n");

		// -- Check
		assert!(matches!(res, Err(Error::Toml(_))));

		Ok(())
	}
}

// endregion: --- Tests
