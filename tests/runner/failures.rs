use crate::support::helpers::{init_tracing, shared, units, ScriptedWorkload};
use anyhow::Result;
use chunkyield::{ChunkedRunner, RunError, RunStatus, RunnerConfig};
use std::error::Error as _;

#[tokio::test]
async fn failing_unit_stops_the_run_without_partial_results() -> Result<()> {
    init_tracing();
    let workload = shared(ScriptedWorkload::new().fail_at(2));
    let mut runner = ChunkedRunner::with_shared_workload(RunnerConfig::default(), workload.clone());

    let err = runner.run_to_completion(units(5)).await.unwrap_err();
    assert_eq!(err.unit_index(), Some(2));
    assert!(matches!(err, RunError::UnitComputation { .. }));
    let source = err.source().map(ToString::to_string).unwrap_or_default();
    assert!(
        source.contains("scripted failure at 2"),
        "unexpected source: {source}"
    );

    assert_eq!(workload.attempts(), vec![0, 1, 2]);
    let snapshot = runner.snapshot();
    assert_eq!(snapshot.status, RunStatus::Failed);
    assert_eq!(snapshot.cursor, 2);
    assert_eq!(runner.telemetry().snapshot().runs_failed, 1);
    Ok(())
}

#[tokio::test]
async fn panicking_unit_is_reported_as_a_unit_failure() -> Result<()> {
    init_tracing();
    let workload = shared(ScriptedWorkload::new().panic_at(1));
    let mut runner = ChunkedRunner::with_shared_workload(RunnerConfig::default(), workload.clone());

    let err = runner.run_to_completion(units(3)).await.unwrap_err();
    assert_eq!(err.unit_index(), Some(1));
    assert!(format!("{err}").contains("unit 1"));
    assert_eq!(runner.status(), RunStatus::Failed);
    assert_eq!(workload.attempts(), vec![0, 1]);
    Ok(())
}

#[tokio::test]
async fn oversized_unit_lists_are_invalid_arguments() -> Result<()> {
    init_tracing();
    let config = RunnerConfig::builder().max_units(3).build()?;
    let mut runner = ChunkedRunner::new(config, ScriptedWorkload::new());

    let err = runner.start(units(4)).err().expect("over the unit limit");
    assert!(matches!(err, RunError::InvalidArgument(_)));
    assert_eq!(runner.status(), RunStatus::Idle);

    let output = runner.run_to_completion(units(3)).await?;
    assert_eq!(output.len(), 3);
    Ok(())
}
