use crate::chunked::driver::{drive, DriverContext};
use crate::chunked::{ChunkedRun, RunHandle, RunOutput, RunSnapshot, RunStatus};
use crate::runtime::config::RunnerConfig;
use crate::runtime::error::RunError;
use crate::runtime::telemetry::Telemetry;
use crate::runtime::workload::Workload;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Starts chunked runs on the current Tokio runtime and owns the one run that
/// may be in flight at a time.
///
/// Runs are spawned as ordinary tasks; use a current-thread runtime to keep
/// every unit on the scheduler thread that also services other callbacks.
pub struct ChunkedRunner<W: Workload> {
    config: RunnerConfig,
    workload: Arc<W>,
    telemetry: Arc<Telemetry>,
    next_run_id: u64,
    active: Option<ActiveRun>,
}

struct ActiveRun {
    run_id: u64,
    cancel: CancellationToken,
    snapshots: watch::Receiver<RunSnapshot>,
}

impl<W: Workload> ChunkedRunner<W> {
    pub fn new(config: RunnerConfig, workload: W) -> Self {
        Self::with_shared_workload(config, Arc::new(workload))
    }

    pub fn with_shared_workload(config: RunnerConfig, workload: Arc<W>) -> Self {
        Self {
            config,
            workload,
            telemetry: Arc::new(Telemetry::default()),
            next_run_id: 0,
            active: None,
        }
    }

    /// Replaces the runner's counters with a shared instance (e.g. one watched
    /// by [`spawn_metrics_reporter`](crate::runtime::telemetry::spawn_metrics_reporter)).
    pub fn with_telemetry(mut self, telemetry: Arc<Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    /// Snapshot of the latest run, or an idle snapshot before the first `start`.
    pub fn snapshot(&self) -> RunSnapshot {
        self.active
            .as_ref()
            .map(|active| *active.snapshots.borrow())
            .unwrap_or_else(RunSnapshot::idle)
    }

    pub fn status(&self) -> RunStatus {
        self.snapshot().status
    }

    /// Validates `units` and spawns a new run.
    ///
    /// An invalid list is rejected before anything changes, so an in-flight run
    /// keeps going. A valid list supersedes any run still in flight: that run
    /// is cancelled and its handle resolves with [`RunError::Cancelled`].
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, units: Vec<W::Spec>) -> Result<RunHandle<W::Output>, RunError> {
        let run = ChunkedRun::with_limit(self.workload.clone(), units, self.config.max_units())?;

        self.supersede_active();
        self.next_run_id += 1;
        let run_id = self.next_run_id;
        let total_units = run.total_units();

        let (snapshots_tx, snapshots_rx) = watch::channel(RunSnapshot::of(run_id, &run));
        let (completion_tx, completion_rx) = oneshot::channel();
        let cancel = CancellationToken::new();
        let telemetry = self.telemetry.clone();
        let context = DriverContext::new(run_id, snapshots_tx, cancel.clone(), telemetry);

        self.telemetry.record_run_started();
        tracing::info!(run_id, total_units, "chunked run started");

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = drive(run, &context)
                .await
                .map(|results| RunOutput::new(results, started.elapsed()));
            context.finish(&outcome);
            let _ = completion_tx.send(outcome);
        });

        self.active = Some(ActiveRun {
            run_id,
            cancel: cancel.clone(),
            snapshots: snapshots_rx.clone(),
        });

        Ok(RunHandle::new(run_id, snapshots_rx, cancel, completion_rx))
    }

    /// Cancels the in-flight run. Returns `false` when nothing is running.
    pub fn cancel(&self) -> bool {
        match &self.active {
            Some(active) if !active.snapshots.borrow().status.is_terminal() => {
                active.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Starts a run and waits for it to finish.
    pub async fn run_to_completion(
        &mut self,
        units: Vec<W::Spec>,
    ) -> Result<RunOutput<W::Output>, RunError> {
        self.start(units)?.wait().await
    }

    /// Runs until completion or until a Ctrl-C (SIGINT) cancels the run.
    pub async fn run_until_ctrl_c(
        &mut self,
        units: Vec<W::Spec>,
    ) -> Result<RunOutput<W::Output>, RunError> {
        let handle = self.start(units)?;
        let cancel = handle.cancellation_token();
        let wait = handle.wait();
        tokio::pin!(wait);

        tokio::select! {
            outcome = &mut wait => outcome,
            Ok(()) = signal::ctrl_c() => {
                tracing::info!("Ctrl-C received; cancelling run");
                cancel.cancel();
                wait.await
            }
        }
    }

    fn supersede_active(&mut self) {
        if let Some(active) = self.active.take() {
            if !active.snapshots.borrow().status.is_terminal() {
                tracing::info!(run_id = active.run_id, "superseding in-flight run");
                active.cancel.cancel();
            }
        }
    }
}
