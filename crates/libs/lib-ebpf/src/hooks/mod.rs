mod kill;
mod process;

pub use kill::*;
pub use process::*;
