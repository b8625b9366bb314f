//! Process isolation for benchmarks.
//!
//! The parent re-executes its own binary once per fork with [`FORK_ENV`] naming
//! the benchmark and the configuration in `LANEBENCH_*` variables. The child runs
//! the benchmark in-process and writes one `sample <score>` line per measurement
//! iteration to stdout; everything else it prints (logs go to stderr) is ignored.
//! Each child owns its buffers, caches and branch-predictor history, so one
//! variant cannot warm the machine up for the next.

use std::env;
use std::io::{self, Write};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{fork_failed, Result};
use crate::harness::config::BenchConfig;

/// Environment variable that turns a process into a fork child.
pub const FORK_ENV: &str = "LANEBENCH_FORK";

const SAMPLE_PREFIX: &str = "sample ";

/// Benchmark id this process was forked to run, if any.
pub fn child_target() -> Option<String> {
    env::var(FORK_ENV).ok().filter(|id| !id.is_empty())
}

/// Writes `samples` in the format [`parse_samples`] reads.
pub fn emit_samples(out: &mut impl Write, samples: &[f64]) -> io::Result<()> {
    for sample in samples {
        writeln!(out, "{SAMPLE_PREFIX}{sample}")?;
    }
    out.flush()
}

/// Extracts the samples from a child's stdout.
pub fn parse_samples(stdout: &str) -> Result<Vec<f64>> {
    let samples = stdout
        .lines()
        .filter_map(|line| line.strip_prefix(SAMPLE_PREFIX))
        .map(|value| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|e| fork_failed(format!("malformed sample '{value}': {e}")))
        })
        .collect::<Result<Vec<f64>>>()?;

    if samples.is_empty() {
        return Err(fork_failed("child reported no samples"));
    }
    Ok(samples)
}

/// Runs `benchmark_id` in a fresh copy of the current executable and returns its
/// measurement samples.
pub fn spawn(benchmark_id: &str, config: &BenchConfig) -> Result<Vec<f64>> {
    let exe = env::current_exe()
        .map_err(|e| fork_failed(format!("cannot locate current executable: {e}")))?;

    debug!(benchmark = benchmark_id, exe = %exe.display(), "forking");

    let output = Command::new(&exe)
        .env(FORK_ENV, benchmark_id)
        .envs(config.to_env())
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|e| fork_failed(format!("cannot spawn {}: {e}", exe.display())))?;

    if !output.status.success() {
        return Err(fork_failed(format!(
            "{benchmark_id} exited with {}",
            output.status
        )));
    }

    parse_samples(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_then_parse() {
        let samples = [1234.5, 0.1 + 0.2, 1e-9];
        let mut out = Vec::new();
        emit_samples(&mut out, &samples).unwrap();

        let parsed = parse_samples(std::str::from_utf8(&out).unwrap()).unwrap();
        assert_eq!(parsed, samples.to_vec());
    }

    #[test]
    fn test_unrelated_lines_are_ignored() {
        let stdout = "Benchmark starting\nsample 10\nnoise\nsample 12.5\n";
        assert_eq!(parse_samples(stdout).unwrap(), vec![10.0, 12.5]);
    }

    #[test]
    fn test_malformed_sample_is_rejected() {
        let err = parse_samples("sample 10\nsample fast\n").unwrap_err();
        assert!(err.to_string().contains("malformed sample 'fast'"));
    }

    #[test]
    fn test_no_samples_is_rejected() {
        assert!(parse_samples("").is_err());
        assert!(parse_samples("hello\n").is_err());
    }
}
