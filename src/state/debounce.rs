use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Publishes a value only once it has stayed unchanged for `delay`.
///
/// Every [`Debouncer::set`] restarts the timer, so a burst of updates settles
/// to its last value. Dropping the debouncer stops the background task.
pub struct Debouncer<T> {
    input: watch::Sender<T>,
    settled: watch::Receiver<T>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + Sync + 'static> Debouncer<T> {
    /// Must be called from within a Tokio runtime.
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input_tx, mut input_rx) = watch::channel(initial.clone());
        let (settled_tx, settled_rx) = watch::channel(initial);
        let shutdown = CancellationToken::new();
        let task_shutdown = shutdown.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = task_shutdown.cancelled() => return,
                    changed = input_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }

                loop {
                    tokio::select! {
                        _ = task_shutdown.cancelled() => return,
                        changed = input_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                        _ = sleep(delay) => {
                            let value = input_rx.borrow_and_update().clone();
                            settled_tx.send_replace(value);
                            break;
                        }
                    }
                }
            }
        });

        Self {
            input: input_tx,
            settled: settled_rx,
            shutdown,
            task: Some(task),
        }
    }

    pub fn set(&self, value: T) {
        self.input.send_replace(value);
    }

    /// Last value that survived a full delay without being replaced.
    pub fn settled(&self) -> T {
        self.settled.borrow().clone()
    }

    /// Receiver notified every time a value settles.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.settled.clone()
    }

    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "debounce task panicked");
            }
        }
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
