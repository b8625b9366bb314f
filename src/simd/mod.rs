//! Fixed-width lane abstraction.
//!
//! Kernels are written once against [`SimdFloat`] / [`SimdBits`] and instantiated
//! with a concrete vector type. [`F64x4`] and [`U64x4`] are the default 256-bit
//! types: the AVX2 backend when the build enables it, array-backed
//! [`portable::Lanes`] otherwise. The choice is made by `cfg`, never at run time.

#[cfg(avx2)]
pub mod avx2;

pub mod portable;
pub mod traits;

pub use traits::{SimdBits, SimdFloat, SimdLanes};

#[cfg(avx2)]
pub use avx2::{f64x4::F64x4, u64x4::U64x4};

#[cfg(not(avx2))]
pub type F64x4 = portable::Lanes<f64, 4>;

#[cfg(not(avx2))]
pub type U64x4 = portable::Lanes<u64, 4>;

/// Name of the lane backend compiled into this build.
pub const BACKEND: &str = if cfg!(avx2) { "avx2" } else { "portable" };
