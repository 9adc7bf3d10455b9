use crate::runtime::error::RunError;
use crate::runtime::progress::ProgressEvent;
use crate::runtime::workload::{compute_unit, validate_units, UnitResult, Workload};
use serde::Serialize;
use std::sync::Arc;

/// Lifecycle of a run: `Idle -> Running -> {Completed | Cancelled | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Result of a single [`ChunkedRun::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A unit finished and more remain. The caller should yield before stepping again.
    Pending(ProgressEvent),
    /// The last unit finished.
    Completed(ProgressEvent),
    /// The run is no longer running; nothing was computed.
    Halted(RunStatus),
}

/// State of one run, advanced one unit at a time.
///
/// The step machine never suspends on its own; whoever drives it decides
/// where the yield points are. `completed().len() == cursor()` holds between
/// any two calls.
pub struct ChunkedRun<W: Workload> {
    workload: Arc<W>,
    units: Vec<W::Spec>,
    completed: Vec<UnitResult<W::Output>>,
    cursor: usize,
    status: RunStatus,
}

impl<W: Workload> ChunkedRun<W> {
    /// Validates `units` and returns a run in the `Running` state.
    pub fn new(workload: Arc<W>, units: Vec<W::Spec>) -> Result<Self, RunError> {
        Self::with_limit(workload, units, usize::MAX)
    }

    pub fn with_limit(
        workload: Arc<W>,
        units: Vec<W::Spec>,
        max_units: usize,
    ) -> Result<Self, RunError> {
        validate_units(workload.as_ref(), &units, max_units)?;
        let completed = Vec::with_capacity(units.len());
        Ok(Self {
            workload,
            units,
            completed,
            cursor: 0,
            status: RunStatus::Running,
        })
    }

    /// Computes exactly one unit and appends its result.
    ///
    /// A unit error moves the run to `Failed`; the results computed so far stay
    /// readable through [`ChunkedRun::completed`] but are never delivered.
    pub fn step(&mut self) -> Result<StepOutcome, RunError> {
        if self.status != RunStatus::Running {
            return Ok(StepOutcome::Halted(self.status));
        }

        let index = self.cursor;
        let spec = &self.units[index];
        match compute_unit(self.workload.as_ref(), index, spec) {
            Ok(result) => {
                self.completed.push(result);
                self.cursor += 1;
                debug_assert_eq!(self.completed.len(), self.cursor);

                let progress = self.progress();
                if self.cursor == self.units.len() {
                    self.status = RunStatus::Completed;
                    Ok(StepOutcome::Completed(progress))
                } else {
                    Ok(StepOutcome::Pending(progress))
                }
            }
            Err(err) => {
                self.status = RunStatus::Failed;
                Err(err)
            }
        }
    }

    /// Moves a running run to `Cancelled`. Returns `false` if it had already finished.
    pub fn cancel(&mut self) -> bool {
        if self.status != RunStatus::Running {
            return false;
        }
        self.status = RunStatus::Cancelled;
        true
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_units(&self) -> usize {
        self.units.len()
    }

    pub fn completed(&self) -> &[UnitResult<W::Output>] {
        &self.completed
    }

    pub fn progress(&self) -> ProgressEvent {
        ProgressEvent::from_cursor(self.cursor, self.units.len())
    }

    pub(crate) fn into_completed(self) -> Vec<UnitResult<W::Output>> {
        self.completed
    }
}
