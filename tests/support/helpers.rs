use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use chunkyield::{ComputeLimits, CpuWorkload, ProgressEvent, RunnerConfig, Workload};
use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

/// Workload whose units are their own indexes, with knobs for failing,
/// panicking, sleeping, and tripping a cancellation token mid-run.
///
/// Every attempted index is recorded, including the one that fails.
#[derive(Default)]
pub struct ScriptedWorkload {
    fail_at: Option<usize>,
    panic_at: Option<usize>,
    cancel_after: Option<usize>,
    per_unit: Duration,
    token: Mutex<Option<CancellationToken>>,
    attempts: Mutex<Vec<usize>>,
}

impl ScriptedWorkload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn panic_at(mut self, index: usize) -> Self {
        self.panic_at = Some(index);
        self
    }

    /// Cancels the armed token once `units` units have finished.
    pub fn cancel_after(mut self, units: usize) -> Self {
        self.cancel_after = Some(units);
        self
    }

    pub fn per_unit(mut self, delay: Duration) -> Self {
        self.per_unit = delay;
        self
    }

    pub fn arm(&self, token: CancellationToken) {
        *self.token.lock().unwrap() = Some(token);
    }

    pub fn attempts(&self) -> Vec<usize> {
        self.attempts.lock().unwrap().clone()
    }
}

impl Workload for ScriptedWorkload {
    type Spec = usize;
    type Output = usize;

    fn compute(&self, index: &usize) -> Result<usize> {
        let index = *index;
        self.attempts.lock().unwrap().push(index);

        if !self.per_unit.is_zero() {
            thread::sleep(self.per_unit);
        }
        if self.panic_at == Some(index) {
            panic!("scripted panic at {index}");
        }
        if self.fail_at == Some(index) {
            bail!("scripted failure at {index}");
        }
        if self.cancel_after == Some(index + 1) {
            if let Some(token) = self.token.lock().unwrap().as_ref() {
                token.cancel();
            }
        }
        Ok(index * 10)
    }
}

pub fn units(count: usize) -> Vec<usize> {
    (0..count).collect()
}

pub fn shared(workload: ScriptedWorkload) -> Arc<ScriptedWorkload> {
    Arc::new(workload)
}

pub fn cpu_workload() -> CpuWorkload {
    CpuWorkload::new(ComputeLimits {
        max_fibonacci_n: 40,
        max_prime_bound: 100_000,
        max_loop_iterations: 100_000,
    })
}

pub fn config_with_heartbeat(interval: Duration) -> Result<RunnerConfig> {
    RunnerConfig::builder()
        .max_fibonacci_n(40)
        .heartbeat_interval(interval)
        .build()
}

pub fn assert_monotonic(events: &[ProgressEvent]) {
    for pair in events.windows(2) {
        assert!(
            pair[0].percent <= pair[1].percent,
            "progress went backwards: {:?} -> {:?}",
            pair[0],
            pair[1]
        );
    }
}
