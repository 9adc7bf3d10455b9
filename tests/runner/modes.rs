use crate::support::helpers::{config_with_heartbeat, init_tracing, shared, units, ScriptedWorkload};
use anyhow::Result;
use chunkyield::{measure, ExecutionMode};
use std::time::Duration;

const UNIT_DELAY: Duration = Duration::from_millis(150);
const HEARTBEAT: Duration = Duration::from_millis(50);

// The default test runtime is current-thread, which is what makes a
// blocking run starve the heartbeat.
#[tokio::test]
async fn heartbeat_reflects_how_each_mode_shares_the_scheduler() -> Result<()> {
    init_tracing();
    let config = config_with_heartbeat(HEARTBEAT)?;
    let workload = shared(ScriptedWorkload::new().per_unit(UNIT_DELAY));

    let blocking = measure(ExecutionMode::Blocking, &config, workload.clone(), units(4)).await?;
    let chunked = measure(ExecutionMode::Chunked, &config, workload.clone(), units(4)).await?;
    let worker = measure(ExecutionMode::Worker, &config, workload.clone(), units(4)).await?;

    for report in [&blocking, &chunked, &worker] {
        let output = report.outcome.as_ref().expect("every mode should complete");
        assert_eq!(output.len(), 4, "{} lost results", report.mode);
        assert!(report.elapsed >= UNIT_DELAY * 4);
        assert!(report.expected_ticks >= 10);
    }

    assert_eq!(blocking.heartbeat_ticks, 0);
    assert_eq!(blocking.responsiveness(), 0.0);
    assert!(chunked.heartbeat_ticks >= 1, "chunked run never yielded");
    assert!(
        worker.heartbeat_ticks > chunked.heartbeat_ticks,
        "worker {} vs chunked {}",
        worker.heartbeat_ticks,
        chunked.heartbeat_ticks
    );
    Ok(())
}

#[tokio::test]
async fn failures_land_in_the_report_outcome() -> Result<()> {
    init_tracing();
    let config = config_with_heartbeat(HEARTBEAT)?;

    for mode in ExecutionMode::ALL {
        let workload = shared(ScriptedWorkload::new().fail_at(1));
        let report = measure(mode, &config, workload.clone(), units(3)).await?;
        let err = report.outcome.expect_err("unit 1 fails in every mode");
        assert_eq!(err.unit_index(), Some(1), "mode {mode}");
        assert_eq!(workload.attempts(), vec![0, 1], "mode {mode}");
    }
    Ok(())
}
