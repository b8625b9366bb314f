//! The two benchmarked kernel families.
//!
//! Each family has a scalar baseline plus vectorized variants written once against
//! the lane traits in [`crate::simd`] and instantiated per vector type.

pub mod axpy;
pub mod intersection;
