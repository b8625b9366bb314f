//! Fills every buffer once and prints what each variant computes on it, for
//! cross-checking the kernels by eye. Nothing here is timed.

use std::process::ExitCode;

use lanebench::data::DataGenerator;
use lanebench::fixture::{AxpyFixture, IntersectionFixture};
use lanebench::harness::{BenchConfig, Fixture};
use lanebench::kernels::axpy::AxpyVariant;
use lanebench::kernels::intersection::CardinalityVariant;
use lanebench::simd::BACKEND;
use lanebench::Result;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest relative deviation tolerated between AXPY variants.
const AXPY_TOLERANCE: f64 = 1e-12;

fn check_cardinality(config: &BenchConfig, generator: &mut DataGenerator) -> Result<bool> {
    let mut fixture = IntersectionFixture::new(config.intersection_len, config.intersection_size)?;
    fixture.setup_iteration(generator);

    let expected = fixture.run(CardinalityVariant::Popcnt);
    println!(
        "intersection cardinality (len {}, size {})",
        fixture.len(),
        fixture.size()
    );

    let mut ok = true;
    for variant in CardinalityVariant::ALL {
        let cardinality = fixture.run(variant);
        let verdict = if cardinality == expected { "ok" } else { "MISMATCH" };
        ok &= cardinality == expected;
        println!("  {:<28} {:>10}  {verdict}", variant.name(), cardinality);
    }
    Ok(ok)
}

fn check_axpy(config: &BenchConfig, generator: &mut DataGenerator) -> Result<bool> {
    let mut seed = AxpyFixture::new(config.axpy_len)?;
    seed.setup_iteration(generator);

    let mut reference = AxpyFixture::from_parts(seed.s(), seed.data(), seed.out())?;
    reference.run(AxpyVariant::Scalar);

    println!("axpy (len {}, s {:.6})", seed.len(), seed.s());

    let mut ok = true;
    for variant in AxpyVariant::ALL {
        let mut fixture = AxpyFixture::from_parts(seed.s(), seed.data(), seed.out())?;
        fixture.run(variant);

        let deviation = fixture
            .out()
            .iter()
            .zip(reference.out())
            .map(|(&got, &want)| (got - want).abs() / want.abs().max(1.0))
            .fold(0.0f64, f64::max);
        let checksum: f64 = fixture.out().iter().sum();
        let verdict = if deviation <= AXPY_TOLERANCE { "ok" } else { "MISMATCH" };
        ok &= deviation <= AXPY_TOLERANCE;
        println!(
            "  {:<28} sum {:>16.6}  max dev {:.3e}  {verdict}",
            variant.name(),
            checksum,
            deviation
        );
    }
    Ok(ok)
}

fn run() -> Result<bool> {
    let config = BenchConfig::from_env()?;
    config.validate()?;
    info!(backend = BACKEND, seed = ?config.seed, "verifying kernels");

    let mut generator = DataGenerator::new(config.seed);
    let cardinality_ok = check_cardinality(&config, &mut generator)?;
    let axpy_ok = check_axpy(&config, &mut generator)?;
    Ok(cardinality_ok && axpy_ok)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("variants disagree");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
