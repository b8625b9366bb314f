//! Aggregation of throughput samples into a score and a 99.9% error margin.

use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

/// Confidence level of the reported error margin.
pub const CONFIDENCE: f64 = 0.999;

/// Aggregate of the throughput samples of one benchmark across all forks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; NaN with fewer than two samples.
    pub std_dev: f64,
    /// Half-width of the Student-t confidence interval at [`CONFIDENCE`];
    /// NaN with fewer than two samples.
    pub error: f64,
}

impl Summary {
    /// Summarises `samples`, or `None` when there are none.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let count = samples.len();
        let mean = Statistics::mean(samples.iter());
        let (min, max) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });

        let (std_dev, error) = if count < 2 {
            (f64::NAN, f64::NAN)
        } else {
            let std_dev = Statistics::std_dev(samples.iter());
            let error = StudentsT::new(0.0, 1.0, (count - 1) as f64)
                .map(|t| t.inverse_cdf(1.0 - (1.0 - CONFIDENCE) / 2.0))
                .map(|quantile| quantile * std_dev / (count as f64).sqrt())
                .unwrap_or(f64::NAN);
            (std_dev, error)
        };

        Some(Self {
            count,
            mean,
            min,
            max,
            std_dev,
            error,
        })
    }

    /// `(mean - error, mean + error)`.
    pub fn confidence_interval(&self) -> (f64, f64) {
        (self.mean - self.error, self.mean + self.error)
    }
}
