use super::handle::{RunOutput, RunSnapshot};
use super::run::{ChunkedRun, StepOutcome};
use crate::runtime::error::RunError;
use crate::runtime::telemetry::Telemetry;
use crate::runtime::workload::{UnitResult, Workload};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::yield_now;
use tokio_util::sync::CancellationToken;

/// Everything the driver needs besides the run itself.
pub(crate) struct DriverContext {
    run_id: u64,
    snapshots: watch::Sender<RunSnapshot>,
    cancel: CancellationToken,
    telemetry: Arc<Telemetry>,
}

impl DriverContext {
    pub(crate) fn new(
        run_id: u64,
        snapshots: watch::Sender<RunSnapshot>,
        cancel: CancellationToken,
        telemetry: Arc<Telemetry>,
    ) -> Self {
        Self {
            run_id,
            snapshots,
            cancel,
            telemetry,
        }
    }

    fn publish<W: Workload>(&self, run: &ChunkedRun<W>) {
        let snapshot = RunSnapshot::of(self.run_id, run);
        self.snapshots.send_replace(snapshot);
    }

    /// Records the terminal outcome in telemetry and logs it.
    pub(crate) fn finish<T>(&self, outcome: &Result<RunOutput<T>, RunError>) {
        let run_id = self.run_id;
        match outcome {
            Ok(output) => {
                self.telemetry.record_run_completed();
                tracing::info!(
                    run_id,
                    units = output.len(),
                    elapsed_ms = output.elapsed().as_millis() as u64,
                    "chunked run completed"
                );
            }
            Err(RunError::Cancelled) => {
                self.telemetry.record_run_cancelled();
                tracing::info!(run_id, "chunked run cancelled");
            }
            Err(err) => {
                self.telemetry.record_run_failed();
                tracing::error!(run_id, error = %err, "chunked run failed");
            }
        }
    }
}

/// Advances `run` one unit at a time, yielding to the scheduler between units.
///
/// Cancellation is checked before every unit, including the first, so a run
/// cancelled before the driver is first polled computes nothing.
pub(crate) async fn drive<W: Workload>(
    mut run: ChunkedRun<W>,
    context: &DriverContext,
) -> Result<Vec<UnitResult<W::Output>>, RunError> {
    let run_id = context.run_id;

    loop {
        if context.cancel.is_cancelled() {
            run.cancel();
            context.publish(&run);
            tracing::debug!(run_id, cursor = run.cursor(), "cancellation observed");
            return Err(RunError::Cancelled);
        }

        let outcome = run.step();
        context.publish(&run);

        match outcome {
            Ok(StepOutcome::Pending(progress)) => {
                context.telemetry.record_units_completed(1);
                tracing::debug!(
                    run_id,
                    unit_index = ?progress.current_unit_index,
                    percent = progress.percent,
                    "unit completed; yielding"
                );
                context.telemetry.record_yield();
                yield_now().await;
            }
            Ok(StepOutcome::Completed(progress)) => {
                context.telemetry.record_units_completed(1);
                tracing::debug!(
                    run_id,
                    unit_index = ?progress.current_unit_index,
                    "final unit completed"
                );
                return Ok(run.into_completed());
            }
            Ok(StepOutcome::Halted(status)) => {
                tracing::debug!(run_id, status = ?status, "run halted");
                return Err(RunError::Cancelled);
            }
            Err(err) => return Err(err),
        }
    }
}
