mod clock;
mod command;
pub mod runner;

pub use clock::{Clock, WallClock};
pub use command::Command;
pub use runner::{RealtimeRunner, RunError, RunReport, RunStatus, StopReason};
