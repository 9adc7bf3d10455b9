use anyhow::Error as AnyError;

/// Terminal outcome of a run that did not complete.
///
/// `Cancelled` is an expected outcome and is not logged as an error; every
/// other variant is surfaced through the [`RunHandle`](crate::RunHandle)
/// completion channel.
#[derive(Debug)]
pub enum RunError {
    /// The unit list was rejected before any unit ran.
    InvalidArgument(String),
    /// A unit returned an error or panicked; later units were not attempted.
    UnitComputation { unit_index: usize, source: AnyError },
    /// The run was cancelled (explicitly, by a superseding `start`, or by shutdown).
    Cancelled,
    /// The offload worker thread is gone and cannot accept requests.
    WorkerUnavailable,
}

impl RunError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn unit(unit_index: usize, source: AnyError) -> Self {
        Self::UnitComputation { unit_index, source }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Index of the failing unit, when the failure came from a unit.
    pub fn unit_index(&self) -> Option<usize> {
        match self {
            Self::UnitComputation { unit_index, .. } => Some(*unit_index),
            _ => None,
        }
    }
}

impl core::fmt::Display for RunError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::UnitComputation { unit_index, source } => {
                write!(f, "unit {unit_index} failed: {source}")
            }
            Self::Cancelled => f.write_str("run cancelled"),
            Self::WorkerUnavailable => f.write_str("offload worker is not running"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::UnitComputation { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
