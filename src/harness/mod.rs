//! Measurement harness: configuration, timed iterations, result sink, process
//! isolation and aggregation of throughput scores.

pub mod blackhole;
pub mod config;
pub mod fork;
pub mod report;
pub mod runner;
pub mod stats;

pub use blackhole::Blackhole;
pub use config::{BenchConfig, TimeUnit};
pub use report::Report;
pub use runner::{Fixture, Runner};
pub use stats::Summary;
