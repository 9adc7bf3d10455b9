use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use chunkyield::{
    measure, ChunkedRunner, CpuOutput, CpuWorkload, ExecutionMode, ResponsivenessReport,
    RunnerConfig, Telemetry, WorkSpec,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio_util::sync::CancellationToken;

const DEFAULT_FIB_N: u32 = 35;
const DEFAULT_UNITS: usize = 6;
const DEFAULT_LOG_DIRECTIVE: &str = "warn";

// Everything shares one thread, so a blocking run visibly freezes the heartbeat.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_example_tracing();

    let args = ExampleArgs::from_env()?;
    let config = RunnerConfig::builder()
        .max_fibonacci_n(args.fib_n.max(DEFAULT_FIB_N))
        .build()?;
    let workload = Arc::new(CpuWorkload::new(config.compute_limits()));
    let units = WorkSpec::fibonacci_window(args.fib_n, args.units);

    let telemetry = Arc::new(Telemetry::default());
    let shutdown = CancellationToken::new();
    let reporter = chunkyield::spawn_metrics_reporter(
        telemetry.clone(),
        shutdown.clone(),
        config.metrics_interval(),
    );

    let bar = build_progress_bar();
    if let (Some(WorkSpec::Fibonacci { n: first }), Some(WorkSpec::Fibonacci { n: last })) =
        (units.first(), units.last())
    {
        bar.println(format!(
            "Computing fibonacci({first}..={last}) in chunks; press Ctrl-C to cancel"
        ));
    }

    let mut runner = ChunkedRunner::with_shared_workload(config.clone(), workload.clone())
        .with_telemetry(telemetry.clone());
    let handle = runner.start(units.clone())?;
    let progress_bar = bar.clone();
    let mut progress = handle.progress_stream();
    let progress_task = tokio::spawn(async move {
        while let Some(event) = progress.next().await {
            progress_bar.set_position(u64::from(event.percent));
        }
    });

    let cancel = handle.cancellation_token();
    let outcome = tokio::select! {
        outcome = handle.wait() => outcome,
        Ok(()) = tokio::signal::ctrl_c() => {
            cancel.cancel();
            bar.finish_with_message("cancelled");
            shutdown.cancel();
            let _ = reporter.await;
            return Ok(());
        }
    };
    let _ = progress_task.await;

    match &outcome {
        Ok(output) => {
            bar.finish_with_message("done");
            let last = output.last().and_then(|r| r.value().as_fibonacci());
            if let Some(value) = last {
                bar.println(format!(
                    "last unit = {value} after {:.2}s",
                    output.elapsed().as_secs_f64()
                ));
            }
        }
        Err(err) => {
            bar.abandon_with_message("failed");
            bar.println(format!("chunked run failed: {err}"));
        }
    }

    for mode in args.modes() {
        let report = measure(mode, &config, workload.clone(), units.clone()).await?;
        print_report(&bar, &report);
    }

    let totals = telemetry.snapshot();
    bar.println(format!(
        "Runner totals: {} started, {} units, {} yields",
        totals.runs_started, totals.units_completed, totals.yields
    ));

    shutdown.cancel();
    let _ = reporter.await;
    outcome.map(|_| ()).context("chunked run did not complete")
}

fn init_example_tracing() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", DEFAULT_LOG_DIRECTIVE);
    }
    chunkyield::init_tracing();
}

fn build_progress_bar() -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stdout_with_hz(12));
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
    )
    .expect("valid progress bar template")
    .progress_chars("=>-");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn print_report(bar: &ProgressBar, report: &ResponsivenessReport<CpuOutput>) {
    let status = match &report.outcome {
        Ok(output) => format!("{} units", output.len()),
        Err(err) => format!("error: {err}"),
    };
    bar.println(format!(
        "{:<9} {:>7.2}s  heartbeat {:>3}/{:<3} ({:>5.1}%)  {status}",
        report.mode.as_str(),
        report.elapsed.as_secs_f64(),
        report.heartbeat_ticks,
        report.expected_ticks,
        report.responsiveness() * 100.0,
    ));
}

struct ExampleArgs {
    mode: Option<ExecutionMode>,
    fib_n: u32,
    units: usize,
}

impl ExampleArgs {
    fn from_env() -> Result<Self> {
        let mode = match env::var("CHUNKYIELD_MODE") {
            Ok(value) if value.trim().eq_ignore_ascii_case("all") => None,
            Ok(value) if !value.trim().is_empty() => Some(value.parse::<ExecutionMode>()?),
            _ => None,
        };
        let fib_n = parse_env_with_default("CHUNKYIELD_FIB_N", DEFAULT_FIB_N)?;
        let units = parse_env_with_default("CHUNKYIELD_UNITS", DEFAULT_UNITS)?;

        ensure!(units > 0, "CHUNKYIELD_UNITS must be greater than 0");
        ensure!(fib_n >= 1, "CHUNKYIELD_FIB_N must be at least 1");

        Ok(Self { mode, fib_n, units })
    }

    fn modes(&self) -> Vec<ExecutionMode> {
        match self.mode {
            Some(mode) => vec![mode],
            None => ExecutionMode::ALL.to_vec(),
        }
    }
}

fn parse_env_with_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("failed to parse {key}='{value}'")),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("failed to read {key}")),
    }
}
