//! Cooperative chunked execution: a step machine that computes one unit per
//! step, the driver that yields to the Tokio scheduler between steps, and the
//! handle callers use to observe, cancel, and await a run.

pub(crate) mod driver;
pub mod handle;
pub mod run;

pub use handle::{RunHandle, RunOutput, RunSnapshot};
pub use run::{ChunkedRun, RunStatus, StepOutcome};
