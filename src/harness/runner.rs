//! Timed execution of one benchmark.
//!
//! A run is `warmup_iterations` discarded iterations followed by
//! `measurement_iterations` recorded ones. Each iteration refreshes the fixture
//! once, then invokes the operation back to back until `iteration_time` has
//! elapsed. The score of an iteration is invocations per time unit.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::data::DataGenerator;
use crate::harness::blackhole::Blackhole;
use crate::harness::config::{BenchConfig, TimeUnit};

/// Invocations between two reads of the clock.
pub const CLOCK_CHECK_INTERVAL: u64 = 32;

/// Benchmark state that is refreshed at every iteration boundary.
pub trait Fixture {
    /// Regenerates inputs before the timed part of an iteration starts.
    fn setup_iteration(&mut self, generator: &mut DataGenerator);
}

/// Invocation count and wall time of one iteration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IterationResult {
    pub operations: u64,
    pub elapsed: Duration,
}

impl IterationResult {
    /// Operations per `unit`.
    pub fn throughput(&self, unit: TimeUnit) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds == 0.0 {
            return f64::INFINITY;
        }
        self.operations as f64 / seconds / unit.per_second()
    }
}

#[derive(Clone, Debug)]
pub struct Runner {
    config: BenchConfig,
}

impl Runner {
    pub fn new(config: BenchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Refreshes `fixture`, then times `op` for one iteration.
    pub fn run_iteration<F, Op>(
        &self,
        fixture: &mut F,
        generator: &mut DataGenerator,
        op: &mut Op,
    ) -> IterationResult
    where
        F: Fixture,
        Op: FnMut(&mut F, &mut Blackhole),
    {
        fixture.setup_iteration(generator);

        let mut blackhole = Blackhole::new();
        let mut operations = 0u64;
        let start = Instant::now();
        let elapsed = loop {
            for _ in 0..CLOCK_CHECK_INTERVAL {
                op(fixture, &mut blackhole);
            }
            operations += CLOCK_CHECK_INTERVAL;

            let elapsed = start.elapsed();
            if elapsed >= self.config.iteration_time {
                break elapsed;
            }
        };

        IterationResult {
            operations,
            elapsed,
        }
    }

    /// Runs warm-up and measurement iterations and returns one throughput sample
    /// per measurement iteration, in the configured time unit.
    pub fn measure<F, Op>(
        &self,
        label: &str,
        fixture: &mut F,
        generator: &mut DataGenerator,
        mut op: Op,
    ) -> Vec<f64>
    where
        F: Fixture,
        Op: FnMut(&mut F, &mut Blackhole),
    {
        let unit = self.config.time_unit;
        info!(
            benchmark = label,
            warmup = self.config.warmup_iterations,
            iterations = self.config.measurement_iterations,
            "measuring"
        );

        for i in 0..self.config.warmup_iterations {
            let result = self.run_iteration(fixture, generator, &mut op);
            debug!(
                "{label} warmup {}/{}: {:.3} ops/{unit}",
                i + 1,
                self.config.warmup_iterations,
                result.throughput(unit)
            );
        }

        (0..self.config.measurement_iterations)
            .map(|i| {
                let score = self
                    .run_iteration(fixture, generator, &mut op)
                    .throughput(unit);
                debug!(
                    "{label} iteration {}/{}: {score:.3} ops/{unit}",
                    i + 1,
                    self.config.measurement_iterations
                );
                score
            })
            .collect()
    }
}
