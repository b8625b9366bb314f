//! The benchmark registry.
//!
//! Nine benchmarks in two families, each addressed by a `Family.variant` id. The
//! timed closures call the kernels directly, so the variant is resolved before
//! measurement starts and never inside the loop.

use tracing::info;

use crate::data::DataGenerator;
use crate::error::Result;
use crate::fixture::{AxpyFixture, IntersectionFixture};
use crate::harness::{fork, BenchConfig, Runner};
use crate::kernels::axpy::{scalar_axpy, simd_axpy, simd_axpy_fma, AxpyVariant};
use crate::kernels::intersection::{
    popcnt, unrolled_popcnt, vpand_extract_popcnt, vpand_extract_popcnt_unrolled,
    vpand_store_popcnt, vpand_store_popcnt_unrolled, CardinalityVariant,
    ROTATING_ACCUMULATORS, UNROLL,
};
use crate::simd::{F64x4, U64x4};

pub const AXPY_FAMILY: &str = "Axpy";
pub const INTERSECTION_FAMILY: &str = "IntersectionCardinality";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kernel {
    Axpy(AxpyVariant),
    Cardinality(CardinalityVariant),
}

/// One registered benchmark.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BenchmarkDef {
    pub family: &'static str,
    pub kernel: Kernel,
}

impl BenchmarkDef {
    pub fn variant(&self) -> &'static str {
        match self.kernel {
            Kernel::Axpy(v) => v.name(),
            Kernel::Cardinality(v) => v.name(),
        }
    }

    /// `Family.variant`, the id used in reports and by fork children.
    pub fn id(&self) -> String {
        format!("{}.{}", self.family, self.variant())
    }

    /// The size parameter shown in the report.
    pub fn param(&self, config: &BenchConfig) -> usize {
        match self.kernel {
            Kernel::Axpy(_) => config.axpy_len,
            Kernel::Cardinality(_) => config.intersection_size,
        }
    }
}

/// Every benchmark, AXPY first.
pub fn all() -> Vec<BenchmarkDef> {
    let axpy = AxpyVariant::ALL.into_iter().map(|v| BenchmarkDef {
        family: AXPY_FAMILY,
        kernel: Kernel::Axpy(v),
    });
    let cardinality = CardinalityVariant::ALL.into_iter().map(|v| BenchmarkDef {
        family: INTERSECTION_FAMILY,
        kernel: Kernel::Cardinality(v),
    });
    axpy.chain(cardinality).collect()
}

/// Looks a benchmark up by its `Family.variant` id.
pub fn find(id: &str) -> Option<BenchmarkDef> {
    all().into_iter().find(|def| def.id() == id)
}

/// Measures `def` in this process and returns its throughput samples.
///
/// The fixture is built, and its preconditions checked, before anything is timed.
pub fn run_in_process(def: &BenchmarkDef, runner: &Runner) -> Result<Vec<f64>> {
    let config = runner.config();
    let mut generator = DataGenerator::new(config.seed);
    let id = def.id();

    let samples = match def.kernel {
        Kernel::Axpy(variant) => {
            let mut fixture = AxpyFixture::new(config.axpy_len)?;
            let f = &mut fixture;
            let g = &mut generator;
            match variant {
                AxpyVariant::Scalar => runner.measure(&id, f, g, |f, bh| {
                    let (s, data, out) = f.split_mut();
                    scalar_axpy(s, data, out);
                    bh.consume(out);
                }),
                AxpyVariant::Vector => runner.measure(&id, f, g, |f, bh| {
                    let (s, data, out) = f.split_mut();
                    simd_axpy::<F64x4>(s, data, out);
                    bh.consume(out);
                }),
                AxpyVariant::VectorFma => runner.measure(&id, f, g, |f, bh| {
                    let (s, data, out) = f.split_mut();
                    simd_axpy_fma::<F64x4>(s, data, out);
                    bh.consume(out);
                }),
            }
        }
        Kernel::Cardinality(variant) => {
            let mut fixture =
                IntersectionFixture::new(config.intersection_len, config.intersection_size)?;
            let f = &mut fixture;
            let g = &mut generator;
            match variant {
                CardinalityVariant::Popcnt => runner.measure(&id, f, g, |f, bh| {
                    let (left, right, size, _) = f.split_mut();
                    bh.consume(popcnt(left, right, size));
                }),
                CardinalityVariant::UnrolledPopcnt => runner.measure(&id, f, g, |f, bh| {
                    let (left, right, size, _) = f.split_mut();
                    bh.consume(unrolled_popcnt::<UNROLL>(left, right, size));
                }),
                CardinalityVariant::VpandStorePopcnt => runner.measure(&id, f, g, |f, bh| {
                    let (left, right, size, scratch) = f.split_mut();
                    bh.consume(vpand_store_popcnt::<U64x4>(left, right, size, scratch));
                }),
                CardinalityVariant::VpandStorePopcntUnrolled => {
                    runner.measure(&id, f, g, |f, bh| {
                        let (left, right, size, scratch) = f.split_mut();
                        bh.consume(vpand_store_popcnt_unrolled::<U64x4, ROTATING_ACCUMULATORS>(
                            left, right, size, scratch,
                        ));
                    })
                }
                CardinalityVariant::VpandExtractPopcnt => runner.measure(&id, f, g, |f, bh| {
                    let (left, right, size, _) = f.split_mut();
                    bh.consume(vpand_extract_popcnt::<U64x4>(left, right, size));
                }),
                CardinalityVariant::VpandExtractPopcntUnrolled => {
                    runner.measure(&id, f, g, |f, bh| {
                        let (left, right, size, _) = f.split_mut();
                        bh.consume(
                            vpand_extract_popcnt_unrolled::<U64x4, ROTATING_ACCUMULATORS>(
                                left, right, size,
                            ),
                        );
                    })
                }
            }
        }
    };

    Ok(samples)
}

/// Measures `def` across `forks` child processes, or in-process when `forks`
/// is zero, and returns the samples of all forks in order.
pub fn run(def: &BenchmarkDef, runner: &Runner) -> Result<Vec<f64>> {
    let config = runner.config();
    let id = def.id();

    if config.forks == 0 {
        return run_in_process(def, runner);
    }

    let mut samples = Vec::with_capacity(config.forks * config.measurement_iterations);
    for fork_index in 0..config.forks {
        info!(benchmark = %id, fork = fork_index + 1, forks = config.forks, "starting fork");
        samples.extend(fork::spawn(&id, config)?);
    }
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_registry_has_nine_unique_ids() {
        let ids: Vec<String> = all().iter().map(|def| def.id()).collect();
        assert_eq!(ids.len(), 9);

        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 9);

        assert!(ids.contains(&"Axpy.daxpyVectorFma".to_string()));
        assert!(ids.contains(&"IntersectionCardinality.vpandExtractPopcntUnrolled".to_string()));
    }

    #[test]
    fn test_find_roundtrips_ids() {
        for def in all() {
            assert_eq!(find(&def.id()), Some(def));
        }
        assert_eq!(find("Axpy.nope"), None);
    }

    #[test]
    fn test_param_follows_family() {
        let config = BenchConfig {
            axpy_len: 512,
            intersection_size: 300,
            ..BenchConfig::default()
        };
        let axpy = find("Axpy.daxpy").unwrap();
        let popcnt = find("IntersectionCardinality.popcnt").unwrap();
        assert_eq!(axpy.param(&config), 512);
        assert_eq!(popcnt.param(&config), 300);
    }

    #[test]
    fn test_in_process_run_produces_samples() {
        let runner = Runner::new(BenchConfig {
            warmup_iterations: 1,
            measurement_iterations: 2,
            iteration_time: Duration::from_millis(2),
            forks: 0,
            axpy_len: 64,
            intersection_len: 64,
            intersection_size: 60,
            seed: Some(1),
            ..BenchConfig::default()
        });

        for def in all() {
            let samples = run(&def, &runner).unwrap();
            assert_eq!(samples.len(), 2, "{}", def.id());
            assert!(samples.iter().all(|&s| s > 0.0), "{}", def.id());
        }
    }

    #[test]
    fn test_precondition_fails_before_timing() {
        let runner = Runner::new(BenchConfig {
            axpy_len: 30,
            forks: 0,
            ..BenchConfig::default()
        });
        // the default iteration time would make this take seconds if it were timed
        let def = find("Axpy.daxpy").unwrap();
        assert!(run_in_process(&def, &runner).is_err());
    }
}
