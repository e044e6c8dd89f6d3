mod correlator;
mod counters;
mod ringbuf;
mod sink;

pub use correlator::*;
pub use counters::*;
pub use ringbuf::*;
pub use sink::*;
