use crate::support::helpers::{init_tracing, shared, units, ScriptedWorkload};
use anyhow::Result;
use chunkyield::{ChunkedRunner, RunStatus, RunnerConfig};

#[tokio::test]
async fn cancel_before_the_first_unit_computes_nothing() -> Result<()> {
    init_tracing();
    let workload = shared(ScriptedWorkload::new());
    let mut runner = ChunkedRunner::with_shared_workload(RunnerConfig::default(), workload.clone());

    let handle = runner.start(units(5))?;
    assert!(runner.cancel());

    let err = handle.wait().await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(workload.attempts().is_empty());

    let snapshot = runner.snapshot();
    assert_eq!(snapshot.status, RunStatus::Cancelled);
    assert_eq!(snapshot.cursor, 0);
    assert!(!runner.cancel());
    Ok(())
}

#[tokio::test]
async fn cancel_after_k_units_stops_at_the_next_yield() -> Result<()> {
    init_tracing();
    let workload = shared(ScriptedWorkload::new().cancel_after(2));
    let mut runner = ChunkedRunner::with_shared_workload(RunnerConfig::default(), workload.clone());

    let handle = runner.start(units(5))?;
    workload.arm(handle.cancellation_token());
    let observer = handle.subscribe();

    let err = handle.wait().await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(workload.attempts(), vec![0, 1]);

    let snapshot = *observer.borrow();
    assert_eq!(snapshot.status, RunStatus::Cancelled);
    assert_eq!(snapshot.cursor, 2);
    assert_eq!(snapshot.progress.percent, 40);
    Ok(())
}

#[tokio::test]
async fn cancel_from_another_task_while_running() -> Result<()> {
    init_tracing();
    let workload = shared(ScriptedWorkload::new());
    let mut runner = ChunkedRunner::with_shared_workload(RunnerConfig::default(), workload.clone());

    let handle = runner.start(units(50))?;
    let mut observer = handle.subscribe();
    let token = handle.cancellation_token();

    let canceller = tokio::spawn(async move {
        while observer.changed().await.is_ok() {
            if observer.borrow_and_update().cursor >= 3 {
                token.cancel();
                break;
            }
        }
    });

    let err = handle.wait().await.unwrap_err();
    canceller.await?;
    assert!(err.is_cancelled());

    let snapshot = runner.snapshot();
    assert_eq!(snapshot.status, RunStatus::Cancelled);
    assert!(snapshot.cursor >= 3 && snapshot.cursor < 50);
    assert_eq!(workload.attempts().len(), snapshot.cursor);
    Ok(())
}

#[tokio::test]
async fn cancelling_a_finished_run_changes_nothing() -> Result<()> {
    init_tracing();
    let mut runner = ChunkedRunner::new(RunnerConfig::default(), ScriptedWorkload::new());

    let handle = runner.start(units(2))?;
    let token = handle.cancellation_token();
    handle.wait().await?;

    assert!(!runner.cancel());
    token.cancel();
    assert_eq!(runner.status(), RunStatus::Completed);
    Ok(())
}
