use super::blocking::run_blocking;
use crate::chunked::RunOutput;
use crate::runtime::error::RunError;
use crate::runtime::workload::{validate_units, Workload};
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use std::thread;
use tokio::sync::{mpsc, oneshot};

const REQUEST_QUEUE_DEPTH: usize = 8;

type Reply<T> = oneshot::Sender<Result<RunOutput<T>, RunError>>;

struct WorkerRequest<W: Workload> {
    units: Vec<W::Spec>,
    reply: Reply<W::Output>,
}

/// Dedicated OS thread that runs whole unit lists off the scheduler.
///
/// Requests and results cross the thread boundary as messages; the worker
/// never yields because nothing else shares its thread. Requests are served
/// one at a time in arrival order.
pub struct OffloadWorker<W: Workload> {
    workload: Arc<W>,
    max_units: usize,
    requests: Option<mpsc::Sender<WorkerRequest<W>>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl<W: Workload> OffloadWorker<W> {
    pub fn spawn(workload: Arc<W>, max_units: usize) -> Result<Self> {
        let (requests_tx, mut requests_rx) = mpsc::channel::<WorkerRequest<W>>(REQUEST_QUEUE_DEPTH);
        let thread_workload = workload.clone();

        let thread = thread::Builder::new()
            .name("offload-worker".into())
            .spawn(move || {
                while let Some(request) = requests_rx.blocking_recv() {
                    let total_units = request.units.len();
                    tracing::debug!(total_units, "offload worker picked up request");
                    let outcome =
                        run_blocking(thread_workload.as_ref(), &request.units, usize::MAX);
                    if request.reply.send(outcome).is_err() {
                        tracing::debug!("offload requester went away before the reply");
                    }
                }
                tracing::debug!("offload worker channel closed; exiting");
            })
            .context("failed to spawn offload worker thread")?;

        Ok(Self {
            workload,
            max_units,
            requests: Some(requests_tx),
            thread: Some(thread),
        })
    }

    /// Sends `units` to the worker and waits for the whole result set.
    pub async fn run(&self, units: Vec<W::Spec>) -> Result<RunOutput<W::Output>, RunError> {
        validate_units(self.workload.as_ref(), &units, self.max_units)?;
        let requests = self.requests.as_ref().ok_or(RunError::WorkerUnavailable)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        requests
            .send(WorkerRequest {
                units,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RunError::WorkerUnavailable)?;

        reply_rx.await.map_err(|_| RunError::WorkerUnavailable)?
    }

    /// Closes the request channel and joins the thread once queued requests drain.
    pub async fn terminate(mut self) -> Result<()> {
        self.requests.take();
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        tokio::task::spawn_blocking(move || thread.join())
            .await
            .context("offload worker join task failed")?
            .map_err(|_| anyhow!("offload worker thread panicked"))
    }
}
