use crate::runtime::error::RunError;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Computation applied to every unit of a run.
///
/// Implementations must be pure: a unit's value depends only on its
/// [`Workload::Spec`], so units can be computed on the scheduler thread, inline,
/// or on an offload worker with identical results.
pub trait Workload: Send + Sync + 'static {
    type Spec: Clone + Send + Sync + 'static;
    type Output: Send + 'static;

    /// Rejects malformed specs before a run starts. Accepts everything by default.
    fn validate(&self, _spec: &Self::Spec) -> Result<()> {
        Ok(())
    }

    /// Computes one unit. Runs to completion without yielding.
    fn compute(&self, spec: &Self::Spec) -> Result<Self::Output>;
}

/// Value produced by one unit, stamped with its position and cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitResult<T> {
    unit_index: usize,
    value: T,
    #[serde(rename = "elapsedMillis", serialize_with = "serialize_millis")]
    elapsed: Duration,
}

impl<T> UnitResult<T> {
    pub fn new(unit_index: usize, value: T, elapsed: Duration) -> Self {
        Self {
            unit_index,
            value,
            elapsed,
        }
    }

    pub fn unit_index(&self) -> usize {
        self.unit_index
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1_000.0
    }
}

fn serialize_millis<S: serde::Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64() * 1_000.0)
}

/// Ensures a unit list is non-empty, within `max_units`, and made of specs the
/// workload accepts.
pub(crate) fn validate_units<W: Workload>(
    workload: &W,
    units: &[W::Spec],
    max_units: usize,
) -> Result<(), RunError> {
    if units.is_empty() {
        return Err(RunError::invalid_argument("units must not be empty"));
    }

    if units.len() > max_units {
        return Err(RunError::invalid_argument(format!(
            "{} units requested but at most {max_units} are allowed",
            units.len()
        )));
    }

    for (index, spec) in units.iter().enumerate() {
        workload
            .validate(spec)
            .map_err(|err| RunError::invalid_argument(format!("unit {index}: {err:#}")))?;
    }

    Ok(())
}

/// Computes a single unit, turning both errors and panics into
/// [`RunError::UnitComputation`].
pub(crate) fn compute_unit<W: Workload>(
    workload: &W,
    unit_index: usize,
    spec: &W::Spec,
) -> Result<UnitResult<W::Output>, RunError> {
    let started = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| workload.compute(spec)));
    let elapsed = started.elapsed();

    match outcome {
        Ok(Ok(value)) => Ok(UnitResult::new(unit_index, value, elapsed)),
        Ok(Err(err)) => Err(RunError::unit(unit_index, err)),
        Err(panic_payload) => {
            let source = anyhow!("unit panicked: {}", panic_message(panic_payload.as_ref()));
            Err(RunError::unit(unit_index, source))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
