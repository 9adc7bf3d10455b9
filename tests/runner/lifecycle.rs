use crate::support::helpers::{assert_monotonic, init_tracing, shared, units, ScriptedWorkload};
use anyhow::Result;
use chunkyield::{ChunkedRunner, RunError, RunStatus, RunnerConfig};
use futures::StreamExt;

#[tokio::test]
async fn delivers_every_result_in_input_order() -> Result<()> {
    init_tracing();
    let mut runner = ChunkedRunner::new(RunnerConfig::default(), ScriptedWorkload::new());

    let output = runner.run_to_completion(units(6)).await?;
    let indexes: Vec<usize> = output.results().iter().map(|r| r.unit_index()).collect();
    let values: Vec<usize> = output.results().iter().map(|r| *r.value()).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(values, vec![0, 10, 20, 30, 40, 50]);

    let snapshot = runner.snapshot();
    assert_eq!(snapshot.status, RunStatus::Completed);
    assert_eq!(snapshot.cursor, 6);
    assert_eq!(snapshot.progress.percent, 100);
    assert_eq!(snapshot.progress.current_unit_index, Some(5));
    Ok(())
}

#[tokio::test]
async fn progress_stream_is_monotonic_and_ends_at_100() -> Result<()> {
    init_tracing();
    let mut runner = ChunkedRunner::new(RunnerConfig::default(), ScriptedWorkload::new());

    let handle = runner.start(units(7))?;
    let progress = tokio::spawn(handle.progress_stream().collect::<Vec<_>>());
    let output = handle.wait().await?;
    let events = progress.await?;

    assert_eq!(output.len(), 7);
    assert_eq!(events.last().map(|e| e.percent), Some(100));
    assert!(events[..events.len() - 1].iter().all(|e| e.percent < 100));
    assert_monotonic(&events);
    Ok(())
}

#[tokio::test]
async fn empty_unit_list_is_rejected_and_runner_stays_idle() {
    init_tracing();
    let workload = shared(ScriptedWorkload::new());
    let mut runner = ChunkedRunner::with_shared_workload(RunnerConfig::default(), workload.clone());

    let err = runner.start(Vec::new()).err().expect("empty list");
    assert!(matches!(err, RunError::InvalidArgument(_)));
    assert_eq!(runner.status(), RunStatus::Idle);
    assert!(workload.attempts().is_empty());
}

#[tokio::test]
async fn runner_restarts_after_a_terminal_run() -> Result<()> {
    init_tracing();
    let mut runner = ChunkedRunner::new(RunnerConfig::default(), ScriptedWorkload::new());

    let first = runner.start(units(2))?;
    assert_eq!(first.run_id(), 1);
    first.wait().await?;

    let second = runner.start(units(3))?;
    assert_eq!(second.run_id(), 2);
    let output = second.wait().await?;
    assert_eq!(output.len(), 3);
    assert_eq!(runner.snapshot().run_id, 2);
    assert_eq!(runner.telemetry().snapshot().runs_completed, 2);
    Ok(())
}

#[tokio::test]
async fn starting_again_supersedes_the_run_in_flight() -> Result<()> {
    init_tracing();
    let workload = shared(ScriptedWorkload::new());
    let mut runner = ChunkedRunner::with_shared_workload(RunnerConfig::default(), workload.clone());

    // Neither driver has been polled yet on the current-thread runtime.
    let superseded = runner.start(units(4))?;
    let current = runner.start(vec![7, 8])?;

    let err = superseded.wait().await.unwrap_err();
    assert!(err.is_cancelled());

    let output = current.wait().await?;
    let values: Vec<usize> = output.results().iter().map(|r| *r.value()).collect();
    assert_eq!(values, vec![70, 80]);
    assert_eq!(workload.attempts(), vec![7, 8]);

    let telemetry = runner.telemetry().snapshot();
    assert_eq!(telemetry.runs_started, 2);
    assert_eq!(telemetry.runs_cancelled, 1);
    assert_eq!(telemetry.runs_completed, 1);
    Ok(())
}
