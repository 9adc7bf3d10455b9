use crate::support::helpers::{assert_monotonic, cpu_workload, init_tracing};
use anyhow::Result;
use chunkyield::compute::fibonacci;
use chunkyield::{
    run_blocking, ChunkedRunner, CpuOutput, ExecutionMode, OffloadWorker, RunError, RunStatus,
    RunnerConfig, WorkSpec,
};
use futures::StreamExt;
use std::sync::Arc;

#[tokio::test]
async fn fibonacci_window_runs_in_order_with_progress() -> Result<()> {
    init_tracing();
    let config = RunnerConfig::builder().max_fibonacci_n(40).build()?;
    let mut runner = ChunkedRunner::new(config, cpu_workload());

    let window = WorkSpec::fibonacci_window(25, 6);
    assert_eq!(window.first(), Some(&WorkSpec::Fibonacci { n: 20 }));
    assert_eq!(window.last(), Some(&WorkSpec::Fibonacci { n: 25 }));

    let handle = runner.start(window)?;
    let progress = tokio::spawn(handle.progress_stream().collect::<Vec<_>>());
    let output = handle.wait().await?;
    let events = progress.await?;

    let values: Vec<u64> = output
        .results()
        .iter()
        .filter_map(|result| result.value().as_fibonacci())
        .collect();
    assert_eq!(values, vec![6_765, 10_946, 17_711, 28_657, 46_368, 75_025]);
    assert_eq!(
        output.last().and_then(|r| r.value().as_fibonacci()),
        Some(75_025)
    );
    assert_eq!(events.last().map(|e| e.percent), Some(100));
    assert_monotonic(&events);
    assert_eq!(runner.status(), RunStatus::Completed);
    Ok(())
}

// Naive fib(40) takes seconds even in release builds:
// `cargo test --release -- --ignored fibonacci_35_to_40`.
#[tokio::test]
#[ignore = "CPU heavy; run in release"]
async fn fibonacci_35_to_40_completes_in_order() -> Result<()> {
    init_tracing();
    let config = RunnerConfig::builder().max_fibonacci_n(40).build()?;
    let mut runner = ChunkedRunner::new(config, cpu_workload());

    let handle = runner.start(WorkSpec::fibonacci_window(40, 6))?;
    let progress = tokio::spawn(handle.progress_stream().collect::<Vec<_>>());
    let output = handle.wait().await?;
    let events = progress.await?;

    let indexes: Vec<usize> = output.results().iter().map(|r| r.unit_index()).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3, 4, 5]);
    let values: Vec<u64> = output
        .results()
        .iter()
        .filter_map(|result| result.value().as_fibonacci())
        .collect();
    assert_eq!(values.len(), 6);
    assert_eq!(values.first(), Some(&9_227_465));
    assert_eq!(values.last(), Some(&102_334_155));
    assert!(values.windows(3).all(|w| w[0] + w[1] == w[2]));
    assert_eq!(events.last().map(|e| e.percent), Some(100));
    assert_monotonic(&events);
    assert_eq!(runner.status(), RunStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn inputs_over_the_configured_limit_are_rejected_up_front() -> Result<()> {
    init_tracing();
    let mut runner = ChunkedRunner::new(RunnerConfig::default(), cpu_workload());

    let units = vec![WorkSpec::Fibonacci { n: 5 }, WorkSpec::Fibonacci { n: 41 }];
    let err = runner
        .start(units)
        .err()
        .expect("fib(41) is over the workload limit");
    assert!(matches!(err, RunError::InvalidArgument(_)));
    assert!(err.to_string().contains("unit 1"));
    assert_eq!(runner.status(), RunStatus::Idle);
    Ok(())
}

#[tokio::test]
async fn every_mode_produces_the_same_results() -> Result<()> {
    init_tracing();
    let units = vec![
        WorkSpec::Fibonacci { n: 22 },
        WorkSpec::Primes { max: 1_000 },
        WorkSpec::HeavyLoop { iterations: 500 },
    ];
    let workload = Arc::new(cpu_workload());

    let blocking = run_blocking(workload.as_ref(), &units, 16)?;

    let mut runner = ChunkedRunner::with_shared_workload(RunnerConfig::default(), workload.clone());
    let chunked = runner.run_to_completion(units.clone()).await?;

    let worker = OffloadWorker::spawn(workload, 16)?;
    let offloaded = worker.run(units).await?;
    worker.terminate().await?;

    let values = |out: &chunkyield::RunOutput<CpuOutput>| -> Vec<CpuOutput> {
        out.results().iter().map(|r| r.value().clone()).collect()
    };
    assert_eq!(values(&blocking), values(&chunked));
    assert_eq!(values(&blocking), values(&offloaded));
    assert_eq!(
        blocking.results()[0].value().as_fibonacci(),
        Some(fibonacci(22))
    );
    assert_eq!(
        blocking.results()[1].value(),
        &CpuOutput::Primes {
            count: 168,
            largest: Some(997)
        }
    );
    assert_eq!(ExecutionMode::ALL.len(), 3);
    Ok(())
}
