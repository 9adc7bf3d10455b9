//! Alternative execution modes and the heartbeat probe used to compare them
//! against chunked execution.

pub mod blocking;
pub mod compare;
pub mod heartbeat;
pub mod worker;

pub use blocking::run_blocking;
pub use compare::{measure, ExecutionMode, ResponsivenessReport};
pub use heartbeat::Heartbeat;
pub use worker::OffloadWorker;
