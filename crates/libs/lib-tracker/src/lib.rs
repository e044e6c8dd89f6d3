// region:    --- Modules
mod correlator;
mod error;
mod event;
mod log;
mod registry;
mod tracker;
// endregion: --- Modules

pub use correlator::{Correlator, CorrelatorConfig, ProvisionalKill};
pub use error::{Error, Result};
pub use event::{Comm, CommittedEvent, CommittedKind, RawKind, ThreadKey};
pub use lib_ebpf_common::RawEvent;
pub use log::{CommittedLog, CommittedRecord};
pub use registry::{ProcessRecord, ProcessRegistry, ProcessState};
pub use tracker::Tracker;
