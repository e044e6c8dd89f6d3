mod counters;
mod error;
pub mod transport;
pub mod trx;

pub use counters::{CounterSnapshot, Counters};
pub use error::{Error, Result};
