pub mod data;
pub mod error;
pub mod fixture;
pub mod harness;
pub mod kernels;
pub mod simd;
pub mod suite;
pub mod utils;

pub use error::{LanebenchError, Result};
pub use kernels::axpy::Axpy;
