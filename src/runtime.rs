//! Runtime glue that wires configs, errors, progress tracking, telemetry, and
//! the runner that owns in-flight runs.

pub mod config;
pub mod error;
pub mod progress;
pub mod runner;
pub mod telemetry;
pub mod workload;
