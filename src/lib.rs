pub mod chunked;
pub mod compute;
pub mod modes;
pub mod runtime;
pub mod state;

pub use chunked::{ChunkedRun, RunHandle, RunOutput, RunSnapshot, RunStatus, StepOutcome};
pub use compute::{ComputeLimits, CpuOutput, CpuWorkload, WorkSpec};
pub use modes::{
    measure, run_blocking, ExecutionMode, Heartbeat, OffloadWorker, ResponsivenessReport,
};
pub use runtime::config::{RunnerConfig, RunnerConfigBuilder, RunnerConfigParams};
pub use runtime::error::RunError;
pub use runtime::progress::ProgressEvent;
pub use runtime::runner::ChunkedRunner;
pub use runtime::telemetry::{init_tracing, spawn_metrics_reporter, Telemetry, TelemetrySnapshot};
pub use runtime::workload::{UnitResult, Workload};
pub use state::{
    Debouncer, LocalStorage, Memo, MemoCache, Persisted, SessionStore, Store, Theme, ThemeStore,
    User,
};
