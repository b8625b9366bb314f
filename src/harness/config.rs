//! Benchmark knobs.
//!
//! Defaults mirror a single-fork throughput run over 1024-element buffers
//! reported in ops/ms. Every knob can be overridden through a `LANEBENCH_*`
//! environment variable; the same variables carry the configuration into fork
//! children.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{bound_exceeds_length, invalid_config, unaligned_length, Result};
use crate::simd::{F64x4, SimdLanes};

pub const ENV_WARMUP_ITERATIONS: &str = "LANEBENCH_WARMUP_ITERATIONS";
pub const ENV_MEASUREMENT_ITERATIONS: &str = "LANEBENCH_MEASUREMENT_ITERATIONS";
pub const ENV_ITERATION_MS: &str = "LANEBENCH_ITERATION_MS";
/// Exact iteration time; takes precedence over [`ENV_ITERATION_MS`].
pub const ENV_ITERATION_NS: &str = "LANEBENCH_ITERATION_NS";
pub const ENV_FORKS: &str = "LANEBENCH_FORKS";
pub const ENV_TIME_UNIT: &str = "LANEBENCH_TIME_UNIT";
pub const ENV_AXPY_LEN: &str = "LANEBENCH_AXPY_LEN";
pub const ENV_INTERSECTION_LEN: &str = "LANEBENCH_INTERSECTION_LEN";
pub const ENV_INTERSECTION_SIZE: &str = "LANEBENCH_INTERSECTION_SIZE";
pub const ENV_SEED: &str = "LANEBENCH_SEED";

/// Unit throughput scores are reported in (operations per unit).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// How many of this unit fit in one second.
    pub fn per_second(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Milliseconds => 1e3,
            TimeUnit::Microseconds => 1e6,
            TimeUnit::Nanoseconds => 1e9,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "us",
            TimeUnit::Nanoseconds => "ns",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeUnit {
    type Err = crate::error::LanebenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "seconds" => Ok(TimeUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "us" | "micros" | "microseconds" => Ok(TimeUnit::Microseconds),
            "ns" | "nanos" | "nanoseconds" => Ok(TimeUnit::Nanoseconds),
            other => Err(invalid_config(format!("unknown time unit '{other}'"))),
        }
    }
}

/// Measurement and parameter settings for one benchmark run.
#[derive(Clone, Debug, PartialEq)]
pub struct BenchConfig {
    /// Iterations run and discarded before measuring.
    pub warmup_iterations: usize,
    /// Iterations whose throughput is recorded.
    pub measurement_iterations: usize,
    /// Wall-clock duration of each iteration.
    pub iteration_time: Duration,
    /// Child processes per benchmark; 0 measures in the current process.
    pub forks: usize,
    /// Unit of the reported throughput.
    pub time_unit: TimeUnit,
    /// Length of the AXPY `data` and `out` buffers.
    pub axpy_len: usize,
    /// Allocated length of the intersection `left` and `right` buffers.
    pub intersection_len: usize,
    /// Loop bound of the intersection kernels.
    pub intersection_size: usize,
    /// Fixed generator seed; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            warmup_iterations: 5,
            measurement_iterations: 5,
            iteration_time: Duration::from_secs(1),
            forks: 1,
            time_unit: TimeUnit::Milliseconds,
            axpy_len: 1024,
            intersection_len: 1024,
            intersection_size: 1024,
            seed: None,
        }
    }
}

fn parse_knob<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| invalid_config(format!("{name}='{value}': {e}")))
}

impl BenchConfig {
    /// Defaults overridden by any `LANEBENCH_*` variables in the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable name.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_WARMUP_ITERATIONS) {
            config.warmup_iterations = parse_knob(ENV_WARMUP_ITERATIONS, &v)?;
        }
        if let Some(v) = lookup(ENV_MEASUREMENT_ITERATIONS) {
            config.measurement_iterations = parse_knob(ENV_MEASUREMENT_ITERATIONS, &v)?;
        }
        if let Some(v) = lookup(ENV_ITERATION_MS) {
            config.iteration_time = Duration::from_millis(parse_knob(ENV_ITERATION_MS, &v)?);
        }
        if let Some(v) = lookup(ENV_ITERATION_NS) {
            config.iteration_time = Duration::from_nanos(parse_knob(ENV_ITERATION_NS, &v)?);
        }
        if let Some(v) = lookup(ENV_FORKS) {
            config.forks = parse_knob(ENV_FORKS, &v)?;
        }
        if let Some(v) = lookup(ENV_TIME_UNIT) {
            config.time_unit = v.parse()?;
        }
        if let Some(v) = lookup(ENV_AXPY_LEN) {
            config.axpy_len = parse_knob(ENV_AXPY_LEN, &v)?;
        }
        if let Some(v) = lookup(ENV_INTERSECTION_LEN) {
            config.intersection_len = parse_knob(ENV_INTERSECTION_LEN, &v)?;
        }
        if let Some(v) = lookup(ENV_INTERSECTION_SIZE) {
            config.intersection_size = parse_knob(ENV_INTERSECTION_SIZE, &v)?;
        }
        if let Some(v) = lookup(ENV_SEED) {
            config.seed = Some(parse_knob(ENV_SEED, &v)?);
        }

        Ok(config)
    }

    /// Rejects configurations that would make a measurement meaningless or make
    /// a kernel run outside its buffers. Called before anything is timed.
    pub fn validate(&self) -> Result<()> {
        if self.measurement_iterations == 0 {
            return Err(invalid_config("measurement_iterations must be at least 1"));
        }
        if self.iteration_time.is_zero() {
            return Err(invalid_config("iteration_time must be non-zero"));
        }
        if self.axpy_len % F64x4::LANES != 0 {
            return Err(unaligned_length(self.axpy_len, F64x4::LANES));
        }
        if self.intersection_size > self.intersection_len {
            return Err(bound_exceeds_length(
                self.intersection_size,
                self.intersection_len,
            ));
        }
        Ok(())
    }

    /// The variables that reproduce this configuration in a child process.
    pub fn to_env(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![
            (ENV_WARMUP_ITERATIONS, self.warmup_iterations.to_string()),
            (ENV_MEASUREMENT_ITERATIONS, self.measurement_iterations.to_string()),
            (ENV_ITERATION_NS, self.iteration_time.as_nanos().to_string()),
            // a child never forks again
            (ENV_FORKS, "0".to_string()),
            (ENV_TIME_UNIT, self.time_unit.label().to_string()),
            (ENV_AXPY_LEN, self.axpy_len.to_string()),
            (ENV_INTERSECTION_LEN, self.intersection_len.to_string()),
            (ENV_INTERSECTION_SIZE, self.intersection_size.to_string()),
        ];
        if let Some(seed) = self.seed {
            vars.push((ENV_SEED, seed.to_string()));
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BenchConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, BenchConfig::default());
        assert_eq!(config.time_unit, TimeUnit::Milliseconds);
        assert_eq!(config.axpy_len, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = BenchConfig::from_lookup(lookup_from(&[
            (ENV_WARMUP_ITERATIONS, "2"),
            (ENV_ITERATION_MS, "250"),
            (ENV_TIME_UNIT, "us"),
            (ENV_INTERSECTION_SIZE, "1000"),
            (ENV_SEED, "99"),
        ]))
        .unwrap();

        assert_eq!(config.warmup_iterations, 2);
        assert_eq!(config.iteration_time, Duration::from_millis(250));
        assert_eq!(config.time_unit, TimeUnit::Microseconds);
        assert_eq!(config.intersection_size, 1000);
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = BenchConfig::from_lookup(lookup_from(&[(ENV_FORKS, "many")])).unwrap_err();
        assert!(err.to_string().contains(ENV_FORKS));

        assert!("fortnights".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_validate_fails_fast() {
        let mut config = BenchConfig {
            axpy_len: 1022,
            ..BenchConfig::default()
        };
        assert!(config.validate().is_err());

        config.axpy_len = 1024;
        config.intersection_size = 2048;
        assert!(config.validate().is_err());

        config.intersection_size = 1024;
        config.measurement_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sub_millisecond_iteration_time_survives_env() {
        for micros in [500, 1_500, 2_000] {
            let parent = BenchConfig {
                iteration_time: Duration::from_micros(micros),
                ..BenchConfig::default()
            };
            assert!(parent.validate().is_ok());

            let env = parent.to_env();
            let pairs: Vec<(&str, &str)> = env.iter().map(|(k, v)| (*k, v.as_str())).collect();
            let child = BenchConfig::from_lookup(lookup_from(&pairs)).unwrap();

            assert_eq!(child.iteration_time, parent.iteration_time);
            assert!(child.validate().is_ok());
        }
    }

    #[test]
    fn test_nanosecond_knob_wins_over_milliseconds() {
        let config = BenchConfig::from_lookup(lookup_from(&[
            (ENV_ITERATION_MS, "7"),
            (ENV_ITERATION_NS, "250000"),
        ]))
        .unwrap();
        assert_eq!(config.iteration_time, Duration::from_micros(250));
    }

    #[test]
    fn test_env_roundtrip_disables_nested_forks() {
        let config = BenchConfig {
            forks: 3,
            seed: Some(5),
            time_unit: TimeUnit::Nanoseconds,
            ..BenchConfig::default()
        };
        let env: Vec<(&str, String)> = config.to_env();
        let pairs: Vec<(&str, &str)> = env.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let child = BenchConfig::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(child.forks, 0);
        assert_eq!(child, BenchConfig { forks: 0, ..config });
    }
}
