use super::run::{ChunkedRun, RunStatus};
use crate::runtime::error::RunError;
use crate::runtime::progress::ProgressEvent;
use crate::runtime::workload::{UnitResult, Workload};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;

/// Point-in-time view of a run, published after every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub run_id: u64,
    pub status: RunStatus,
    pub cursor: usize,
    pub total_units: usize,
    pub progress: ProgressEvent,
}

impl RunSnapshot {
    pub fn idle() -> Self {
        Self {
            run_id: 0,
            status: RunStatus::Idle,
            cursor: 0,
            total_units: 0,
            progress: ProgressEvent::idle(),
        }
    }

    pub(crate) fn of<W: Workload>(run_id: u64, run: &ChunkedRun<W>) -> Self {
        Self {
            run_id,
            status: run.status(),
            cursor: run.cursor(),
            total_units: run.total_units(),
            progress: run.progress(),
        }
    }
}

/// Ordered results of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutput<T> {
    results: Vec<UnitResult<T>>,
    #[serde(skip)]
    elapsed: Duration,
}

impl<T> RunOutput<T> {
    pub fn new(results: Vec<UnitResult<T>>, elapsed: Duration) -> Self {
        Self { results, elapsed }
    }

    pub fn results(&self) -> &[UnitResult<T>] {
        &self.results
    }

    pub fn into_results(self) -> Vec<UnitResult<T>> {
        self.results
    }

    pub fn last(&self) -> Option<&UnitResult<T>> {
        self.results.last()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Wall-clock time from the first unit to the last, yields included.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

pub(crate) type Completion<T> = oneshot::Receiver<Result<RunOutput<T>, RunError>>;

/// Caller side of a started run.
///
/// The completion resolves exactly once: with every result in input order, or
/// with the error that ended the run. Partial results are never delivered.
pub struct RunHandle<T> {
    run_id: u64,
    snapshots: watch::Receiver<RunSnapshot>,
    cancel: CancellationToken,
    completion: Completion<T>,
}

impl<T> RunHandle<T> {
    pub(crate) fn new(
        run_id: u64,
        snapshots: watch::Receiver<RunSnapshot>,
        cancel: CancellationToken,
        completion: Completion<T>,
    ) -> Self {
        Self {
            run_id,
            snapshots,
            cancel,
            completion,
        }
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn snapshot(&self) -> RunSnapshot {
        *self.snapshots.borrow()
    }

    pub fn progress(&self) -> ProgressEvent {
        self.snapshots.borrow().progress
    }

    pub fn status(&self) -> RunStatus {
        self.snapshots.borrow().status
    }

    /// Requests cancellation. Observed before the next unit starts; a unit
    /// already in progress runs to completion first.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Receiver that is updated after every step.
    pub fn subscribe(&self) -> watch::Receiver<RunSnapshot> {
        self.snapshots.clone()
    }

    /// Stream of progress updates: the current value first, then every observed
    /// change, ending after the run reaches a terminal status.
    ///
    /// Updates are coalesced when the consumer falls behind, so intermediate
    /// percentages may be skipped but never go backwards.
    pub fn progress_stream(&self) -> BoxStream<'static, ProgressEvent> {
        let initial = ProgressCursor::Initial(self.snapshots.clone());
        stream::unfold(initial, |state| async move {
            let mut rx = match state {
                ProgressCursor::Initial(rx) => rx,
                ProgressCursor::Watching(mut rx) => {
                    rx.changed().await.ok()?;
                    rx
                }
                ProgressCursor::Done => return None,
            };

            let snapshot = *rx.borrow_and_update();
            let next = if snapshot.status.is_terminal() {
                ProgressCursor::Done
            } else {
                ProgressCursor::Watching(rx)
            };
            Some((snapshot.progress, next))
        })
        .boxed()
    }

    /// Waits for the run to finish.
    ///
    /// A driver that disappears without reporting (runtime shutdown) counts as
    /// a cancellation.
    pub async fn wait(self) -> Result<RunOutput<T>, RunError> {
        match self.completion.await {
            Ok(outcome) => outcome,
            Err(_) => Err(RunError::Cancelled),
        }
    }
}

enum ProgressCursor {
    Initial(watch::Receiver<RunSnapshot>),
    Watching(watch::Receiver<RunSnapshot>),
    Done,
}
