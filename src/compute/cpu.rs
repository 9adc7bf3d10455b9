use super::fibonacci::{fibonacci, MAX_FIBONACCI_N};
use super::heavy_loop::heavy_loop;
use super::primes::prime_summary;
use crate::runtime::workload::Workload;
use anyhow::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

/// One CPU-bound unit of work, tagged the same way worker messages are
/// (`{"type": "fibonacci", "n": 40}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WorkSpec {
    Fibonacci { n: u32 },
    Primes { max: u64 },
    HeavyLoop {
        #[serde(rename = "max", alias = "iterations")]
        iterations: u64,
    },
}

impl WorkSpec {
    /// `count` consecutive Fibonacci units ending at `target`, never starting below 1.
    ///
    /// When `target` is too small to fit the whole window the window is shifted
    /// up instead of shrunk, so exactly `count` units are always produced.
    pub fn fibonacci_window(target: u32, count: usize) -> Vec<WorkSpec> {
        let span = u32::try_from(count.saturating_sub(1)).unwrap_or(u32::MAX);
        let start = target.saturating_sub(span).max(1);
        (0..count)
            .map(|offset| WorkSpec::Fibonacci {
                n: start.saturating_add(offset as u32),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CpuOutput {
    Fibonacci { value: u64 },
    Primes { count: usize, largest: Option<u64> },
    HeavyLoop { sum: f64 },
}

impl CpuOutput {
    pub fn as_fibonacci(&self) -> Option<u64> {
        match self {
            Self::Fibonacci { value } => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputeLimits {
    pub max_fibonacci_n: u32,
    pub max_prime_bound: u64,
    pub max_loop_iterations: u64,
}

/// Workload that evaluates [`WorkSpec`]s within configured limits.
#[derive(Debug, Clone)]
pub struct CpuWorkload {
    limits: ComputeLimits,
}

impl CpuWorkload {
    pub fn new(limits: ComputeLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ComputeLimits {
        self.limits
    }
}

impl Workload for CpuWorkload {
    type Spec = WorkSpec;
    type Output = CpuOutput;

    fn validate(&self, spec: &WorkSpec) -> Result<()> {
        match *spec {
            WorkSpec::Fibonacci { n } => {
                let limit = self.limits.max_fibonacci_n.min(MAX_FIBONACCI_N);
                ensure!(n <= limit, "fibonacci input {n} exceeds limit {limit}");
            }
            WorkSpec::Primes { max } => {
                ensure!(
                    max <= self.limits.max_prime_bound,
                    "prime bound {max} exceeds limit {}",
                    self.limits.max_prime_bound
                );
            }
            WorkSpec::HeavyLoop { iterations } => {
                ensure!(
                    iterations <= self.limits.max_loop_iterations,
                    "loop of {iterations} iterations exceeds limit {}",
                    self.limits.max_loop_iterations
                );
            }
        }
        Ok(())
    }

    fn compute(&self, spec: &WorkSpec) -> Result<CpuOutput> {
        let output = match *spec {
            WorkSpec::Fibonacci { n } => {
                if n > MAX_FIBONACCI_N {
                    bail!("fibonacci({n}) does not fit in 64 bits");
                }
                CpuOutput::Fibonacci {
                    value: fibonacci(n),
                }
            }
            WorkSpec::Primes { max } => {
                let summary = prime_summary(max);
                CpuOutput::Primes {
                    count: summary.count,
                    largest: summary.largest,
                }
            }
            WorkSpec::HeavyLoop { iterations } => {
                let sum = heavy_loop(iterations);
                if !sum.is_finite() {
                    bail!("heavy loop over {iterations} iterations diverged");
                }
                CpuOutput::HeavyLoop { sum }
            }
        };
        Ok(output)
    }
}
