//! End-of-run throughput table.

use std::fmt;

use crate::harness::config::TimeUnit;
use crate::harness::stats::Summary;

#[derive(Clone, Debug)]
pub struct ReportRow {
    pub benchmark: String,
    /// Element count the benchmark was parameterised with.
    pub size: usize,
    pub summary: Summary,
}

/// Throughput table, one row per benchmark, with score and 99.9% error margin.
#[derive(Clone, Debug)]
pub struct Report {
    unit: TimeUnit,
    rows: Vec<ReportRow>,
}

impl Report {
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            unit,
            rows: Vec::new(),
        }
    }

    /// Adds a row; benchmarks without samples are skipped.
    pub fn push(&mut self, benchmark: impl Into<String>, size: usize, samples: &[f64]) {
        if let Some(summary) = Summary::from_samples(samples) {
            self.rows.push(ReportRow {
                benchmark: benchmark.into(),
                size,
                summary,
            });
        }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name_width = self
            .rows
            .iter()
            .map(|row| row.benchmark.len())
            .max()
            .unwrap_or(0)
            .max("Benchmark".len());
        let units = format!("ops/{}", self.unit);

        writeln!(
            f,
            "{:<name_width$}  {:>6}   {:>5}  {:>3}  {:>14}   {:>10}  {}",
            "Benchmark", "(size)", "Mode", "Cnt", "Score", "Error", "Units"
        )?;

        for row in &self.rows {
            let s = &row.summary;
            let error = if s.error.is_nan() {
                String::new()
            } else {
                format!("± {:>10.3}", s.error)
            };
            writeln!(
                f,
                "{:<name_width$}  {:>6}   {:>5}  {:>3}  {:>14.3}  {:>12}  {}",
                row.benchmark, row.size, "thrpt", s.count, s.mean, error, units
            )?;
        }
        Ok(())
    }
}
