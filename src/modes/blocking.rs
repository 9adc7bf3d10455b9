use crate::chunked::RunOutput;
use crate::runtime::error::RunError;
use crate::runtime::workload::{compute_unit, validate_units, Workload};
use std::time::Instant;

/// Computes every unit inline without yielding.
///
/// Nothing else on the calling thread makes progress until this returns; on a
/// current-thread runtime timers and other tasks stall for the whole run.
pub fn run_blocking<W: Workload>(
    workload: &W,
    units: &[W::Spec],
    max_units: usize,
) -> Result<RunOutput<W::Output>, RunError> {
    validate_units(workload, units, max_units)?;

    let started = Instant::now();
    let mut results = Vec::with_capacity(units.len());
    for (index, spec) in units.iter().enumerate() {
        results.push(compute_unit(workload, index, spec)?);
    }

    Ok(RunOutput::new(results, started.elapsed()))
}
