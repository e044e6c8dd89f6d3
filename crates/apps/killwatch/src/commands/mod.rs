mod kills;
mod replay;
mod run;

pub use kills::*;
pub use replay::*;
pub use run::*;
