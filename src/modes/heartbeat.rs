use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Counter task that ticks on a fixed period, the way a UI counter would.
///
/// Missed ticks are skipped rather than replayed, so the count reflects how
/// often the scheduler actually got to run the task.
pub struct Heartbeat {
    ticks: Arc<AtomicU64>,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
    started: Instant,
    interval: Duration,
}

impl Heartbeat {
    /// Spawns the counter. The first tick is due one `interval` from now.
    pub fn spawn(interval: Duration) -> Self {
        let ticks = Arc::new(AtomicU64::new(0));
        let shutdown = CancellationToken::new();
        let started = Instant::now();

        let task_ticks = ticks.clone();
        let task_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(started + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = task_shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        task_ticks.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });

        Self {
            ticks,
            shutdown,
            handle,
            started,
            interval,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Ticks an unobstructed scheduler would have delivered by now.
    pub fn expected_ticks(&self) -> u64 {
        let elapsed = self.started.elapsed().as_nanos();
        (elapsed / self.interval.as_nanos().max(1)) as u64
    }

    /// Stops the counter and returns the final tick count.
    pub async fn stop(self) -> u64 {
        self.shutdown.cancel();
        if let Err(err) = self.handle.await {
            tracing::warn!(error = %err, "heartbeat task panicked");
        }
        self.ticks.load(Ordering::Relaxed)
    }
}
