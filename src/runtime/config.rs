use crate::compute::{ComputeLimits, MAX_FIBONACCI_N};
use crate::runtime::telemetry;
use anyhow::{bail, Result};
use std::time::Duration;

const DEFAULT_MAX_UNITS: usize = 1_024;
const DEFAULT_MAX_FIBONACCI_N: u32 = 50;
const DEFAULT_MAX_PRIME_BOUND: u64 = 50_000_000;
const DEFAULT_MAX_LOOP_ITERATIONS: u64 = 1_000_000_000;
const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 100;

/// Runtime configuration shared by the chunked runner, the offload worker, and
/// the responsiveness probes.
///
/// All instances must be constructed via [`RunnerConfig::builder`] or [`RunnerConfig::new`]
/// so invariants are validated before any consumer observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    max_units: usize,
    max_fibonacci_n: u32,
    max_prime_bound: u64,
    max_loop_iterations: u64,
    heartbeat_interval: Duration,
    metrics_interval: Duration,
}

pub struct RunnerConfigParams {
    pub max_units: usize,
    pub max_fibonacci_n: u32,
    pub max_prime_bound: u64,
    pub max_loop_iterations: u64,
    pub heartbeat_interval: Duration,
    pub metrics_interval: Duration,
}

impl RunnerConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    pub fn new(params: RunnerConfigParams) -> Result<Self> {
        let RunnerConfigParams {
            max_units,
            max_fibonacci_n,
            max_prime_bound,
            max_loop_iterations,
            heartbeat_interval,
            metrics_interval,
        } = params;

        let config = Self {
            max_units,
            max_fibonacci_n,
            max_prime_bound,
            max_loop_iterations,
            heartbeat_interval,
            metrics_interval,
        };

        config.validate()?;
        Ok(config)
    }

    /// Upper bound on the number of units accepted by a single run.
    pub fn max_units(&self) -> usize {
        self.max_units
    }

    /// Largest Fibonacci input the CPU workload accepts.
    pub fn max_fibonacci_n(&self) -> u32 {
        self.max_fibonacci_n
    }

    /// Largest prime search bound the CPU workload accepts.
    pub fn max_prime_bound(&self) -> u64 {
        self.max_prime_bound
    }

    /// Largest iteration count the heavy loop accepts.
    pub fn max_loop_iterations(&self) -> u64 {
        self.max_loop_iterations
    }

    /// Tick period of the responsiveness heartbeat.
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Interval used by the telemetry reporter.
    pub fn metrics_interval(&self) -> Duration {
        self.metrics_interval
    }

    pub fn compute_limits(&self) -> ComputeLimits {
        ComputeLimits {
            max_fibonacci_n: self.max_fibonacci_n,
            max_prime_bound: self.max_prime_bound,
            max_loop_iterations: self.max_loop_iterations,
        }
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        if self.max_units == 0 {
            bail!("max_units must be greater than 0");
        }

        if self.max_fibonacci_n > MAX_FIBONACCI_N {
            bail!(
                "max_fibonacci_n ({}) must be at most {MAX_FIBONACCI_N} so values fit in 64 bits",
                self.max_fibonacci_n
            );
        }

        if self.max_prime_bound < 2 {
            bail!("max_prime_bound must be at least 2");
        }

        if self.max_loop_iterations == 0 {
            bail!("max_loop_iterations must be greater than 0");
        }

        if self.heartbeat_interval.is_zero() {
            bail!("heartbeat_interval must be greater than 0");
        }

        if self.metrics_interval.is_zero() {
            bail!("metrics_interval must be greater than 0");
        }

        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_units: DEFAULT_MAX_UNITS,
            max_fibonacci_n: DEFAULT_MAX_FIBONACCI_N,
            max_prime_bound: DEFAULT_MAX_PRIME_BOUND,
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS),
            metrics_interval: telemetry::DEFAULT_METRICS_INTERVAL,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RunnerConfigBuilder {
    max_units: Option<usize>,
    max_fibonacci_n: Option<u32>,
    max_prime_bound: Option<u64>,
    max_loop_iterations: Option<u64>,
    heartbeat_interval: Option<Duration>,
    metrics_interval: Option<Duration>,
}

impl RunnerConfigBuilder {
    pub fn max_units(mut self, units: usize) -> Self {
        self.max_units = Some(units);
        self
    }

    pub fn max_fibonacci_n(mut self, n: u32) -> Self {
        self.max_fibonacci_n = Some(n);
        self
    }

    pub fn max_prime_bound(mut self, bound: u64) -> Self {
        self.max_prime_bound = Some(bound);
        self
    }

    pub fn max_loop_iterations(mut self, iterations: u64) -> Self {
        self.max_loop_iterations = Some(iterations);
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = Some(interval);
        self
    }

    pub fn metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = Some(interval);
        self
    }

    pub fn build(self) -> Result<RunnerConfig> {
        let defaults = RunnerConfig::default();
        let params = RunnerConfigParams {
            max_units: self.max_units.unwrap_or(defaults.max_units),
            max_fibonacci_n: self.max_fibonacci_n.unwrap_or(defaults.max_fibonacci_n),
            max_prime_bound: self.max_prime_bound.unwrap_or(defaults.max_prime_bound),
            max_loop_iterations: self
                .max_loop_iterations
                .unwrap_or(defaults.max_loop_iterations),
            heartbeat_interval: self
                .heartbeat_interval
                .unwrap_or(defaults.heartbeat_interval),
            metrics_interval: self.metrics_interval.unwrap_or(defaults.metrics_interval),
        };

        RunnerConfig::new(params)
    }
}
