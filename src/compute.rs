//! CPU-bound workloads used to exercise the execution modes: naive recursive
//! Fibonacci, trial-division prime search, and a trigonometric busy loop.

pub mod cpu;
pub mod fibonacci;
pub mod heavy_loop;
pub mod primes;

pub use cpu::{ComputeLimits, CpuOutput, CpuWorkload, WorkSpec};
pub use fibonacci::{fibonacci, MAX_FIBONACCI_N};
pub use heavy_loop::heavy_loop;
pub use primes::{prime_summary, PrimeSummary};
