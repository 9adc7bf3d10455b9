use super::blocking::run_blocking;
use super::heartbeat::Heartbeat;
use super::worker::OffloadWorker;
use crate::chunked::RunOutput;
use crate::runtime::config::RunnerConfig;
use crate::runtime::error::RunError;
use crate::runtime::runner::ChunkedRunner;
use crate::runtime::workload::Workload;
use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Where the units of a run are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Inline on the calling task, no yields.
    Blocking,
    /// On the scheduler, yielding after every unit.
    Chunked,
    /// On a dedicated offload thread.
    Worker,
}

impl ExecutionMode {
    pub const ALL: [ExecutionMode; 3] = [Self::Blocking, Self::Chunked, Self::Worker];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Chunked => "chunked",
            Self::Worker => "worker",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "blocking" => Ok(Self::Blocking),
            "chunked" => Ok(Self::Chunked),
            "worker" => Ok(Self::Worker),
            other => bail!(
                "unknown execution mode '{other}' (expected blocking, chunked, or worker)"
            ),
        }
    }
}

/// How well the scheduler kept servicing the heartbeat during one run.
#[derive(Debug)]
pub struct ResponsivenessReport<T> {
    pub mode: ExecutionMode,
    pub elapsed: Duration,
    pub heartbeat_ticks: u64,
    pub expected_ticks: u64,
    pub outcome: Result<RunOutput<T>, RunError>,
}

impl<T> ResponsivenessReport<T> {
    /// Delivered ticks over expected ticks, in `[0, 1]`. A run shorter than
    /// one heartbeat interval counts as fully responsive.
    pub fn responsiveness(&self) -> f64 {
        if self.expected_ticks == 0 {
            return 1.0;
        }
        (self.heartbeat_ticks as f64 / self.expected_ticks as f64).min(1.0)
    }
}

/// Runs `units` in `mode` while a heartbeat ticks every
/// `config.heartbeat_interval()`.
///
/// The returned `Err` covers infrastructure failures (the offload thread could
/// not be started or joined); run failures land in
/// [`ResponsivenessReport::outcome`].
pub async fn measure<W: Workload>(
    mode: ExecutionMode,
    config: &RunnerConfig,
    workload: Arc<W>,
    units: Vec<W::Spec>,
) -> Result<ResponsivenessReport<W::Output>> {
    let worker = match mode {
        ExecutionMode::Worker => Some(OffloadWorker::spawn(workload.clone(), config.max_units())?),
        _ => None,
    };

    let heartbeat = Heartbeat::spawn(config.heartbeat_interval());
    let started = Instant::now();

    let outcome = match (mode, worker.as_ref()) {
        (ExecutionMode::Worker, Some(worker)) => worker.run(units).await,
        (ExecutionMode::Chunked, _) => {
            let mut runner = ChunkedRunner::with_shared_workload(config.clone(), workload);
            runner.run_to_completion(units).await
        }
        _ => run_blocking(workload.as_ref(), &units, config.max_units()),
    };

    let elapsed = started.elapsed();
    let expected_ticks = heartbeat.expected_ticks();
    let heartbeat_ticks = heartbeat.stop().await;

    if let Some(worker) = worker {
        worker.terminate().await?;
    }

    tracing::info!(
        mode = %mode,
        elapsed_ms = elapsed.as_millis() as u64,
        heartbeat_ticks,
        expected_ticks,
        succeeded = outcome.is_ok(),
        "responsiveness measured"
    );

    Ok(ResponsivenessReport {
        mode,
        elapsed,
        heartbeat_ticks,
        expected_ticks,
        outcome,
    })
}
