use std::io;
use std::process::ExitCode;

use lanebench::harness::{fork, BenchConfig, Report, Runner};
use lanebench::simd::BACKEND;
use lanebench::{suite, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    // stdout carries the report and, in fork children, the samples
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Runs the single benchmark this process was forked for.
fn run_child(id: &str, runner: &Runner) -> Result<()> {
    let def = suite::find(id)
        .ok_or_else(|| lanebench::error::invalid_config(format!("unknown benchmark '{id}'")))?;
    let samples = suite::run_in_process(&def, runner)?;
    fork::emit_samples(&mut io::stdout().lock(), &samples)
        .map_err(|e| lanebench::error::fork_failed(format!("cannot write samples: {e}")))
}

fn run_suite(runner: &Runner) -> Result<Report> {
    let config = runner.config();
    info!(
        backend = BACKEND,
        forks = config.forks,
        warmup = config.warmup_iterations,
        iterations = config.measurement_iterations,
        iteration_ms = config.iteration_time.as_millis() as u64,
        "starting benchmark suite"
    );
    if BACKEND == "portable" {
        warn!("AVX2 backend not compiled in; vector variants use portable lanes");
    }

    let mut report = Report::new(config.time_unit);
    for def in suite::all() {
        let samples = suite::run(&def, runner)?;
        report.push(def.id(), def.param(config), &samples);
    }
    Ok(report)
}

fn run() -> Result<()> {
    let config = BenchConfig::from_env()?;
    config.validate()?;
    let runner = Runner::new(config);

    if let Some(id) = fork::child_target() {
        return run_child(&id, &runner);
    }

    let report = run_suite(&runner)?;
    println!("{report}");
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
