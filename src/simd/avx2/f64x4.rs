//! AVX2 4-lane f64 SIMD vector implementation.
//!
//! `F64x4` wraps the `__m256d` register and exposes the lane operations the AXPY
//! kernels need: load/store, add, multiply, broadcast, lane extraction and a
//! fused multiply-add that maps to a single `vfmadd` instruction.
//!
//! # Architecture Requirements
//!
//! - **CPU Support**: AVX2 and FMA (Haswell and later)
//! - **Compilation**: only built when `build.rs` sees `avx2` and `fma` enabled for
//!   the target (`-C target-cpu=native` on a capable host)

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, Mul};

use crate::simd::traits::{SimdFloat, SimdLanes};

/// Number of f64 elements that fit in a 256-bit register.
pub const LANE_COUNT: usize = 4;

/// AVX2 SIMD vector containing 4 packed f64 values.
#[derive(Copy, Clone, Debug)]
pub struct F64x4 {
    /// AVX 256-bit register containing 4 packed f64 values
    pub elements: __m256d,
}

impl F64x4 {
    /// Checks if a pointer is aligned to the register width.
    #[inline(always)]
    pub fn is_aligned(ptr: *const f64) -> bool {
        (ptr as usize) % core::mem::align_of::<__m256d>() == 0
    }

    /// Loads 4 elements from 32-byte aligned memory with `_mm256_load_pd`.
    ///
    /// # Safety
    ///
    /// Pointer must be 32-byte aligned and point to at least 4 valid f64 values.
    #[inline(always)]
    pub unsafe fn load_aligned(ptr: *const f64) -> Self {
        Self {
            elements: _mm256_load_pd(ptr),
        }
    }

    /// Loads 4 elements from unaligned memory with `_mm256_loadu_pd`.
    ///
    /// # Safety
    ///
    /// Pointer must point to at least 4 valid f64 values.
    #[inline(always)]
    pub unsafe fn load_unaligned(ptr: *const f64) -> Self {
        Self {
            elements: _mm256_loadu_pd(ptr),
        }
    }
}

impl SimdLanes for F64x4 {
    type Elem = f64;

    const LANES: usize = LANE_COUNT;

    /// Chooses the aligned or unaligned load from the pointer's alignment.
    #[inline(always)]
    unsafe fn load(ptr: *const f64) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        match F64x4::is_aligned(ptr) {
            true => Self::load_aligned(ptr),
            false => Self::load_unaligned(ptr),
        }
    }

    #[inline(always)]
    unsafe fn store_at(&self, ptr: *mut f64) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        match F64x4::is_aligned(ptr) {
            true => _mm256_store_pd(ptr, self.elements),
            false => _mm256_storeu_pd(ptr, self.elements),
        }
    }

    #[inline(always)]
    fn splat(value: f64) -> Self {
        Self {
            elements: unsafe { _mm256_set1_pd(value) },
        }
    }

    /// Moves the requested lane to position 0 with `vpermpd` and reads it out.
    #[inline(always)]
    fn extract(&self, index: usize) -> f64 {
        unsafe {
            match index {
                0 => _mm256_cvtsd_f64(self.elements),
                1 => _mm256_cvtsd_f64(_mm256_permute4x64_pd::<0b01>(self.elements)),
                2 => _mm256_cvtsd_f64(_mm256_permute4x64_pd::<0b10>(self.elements)),
                3 => _mm256_cvtsd_f64(_mm256_permute4x64_pd::<0b11>(self.elements)),
                _ => panic!("Lane index {index} out of range for {LANE_COUNT} lanes"),
            }
        }
    }
}

impl Add for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            elements: unsafe { _mm256_add_pd(self.elements, rhs.elements) },
        }
    }
}

impl Mul for F64x4 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            elements: unsafe { _mm256_mul_pd(self.elements, rhs.elements) },
        }
    }
}

impl SimdFloat for F64x4 {
    /// `self * a + b` with `_mm256_fmadd_pd`.
    #[inline(always)]
    fn fmadd(self, a: Self, b: Self) -> Self {
        Self {
            elements: unsafe { _mm256_fmadd_pd(self.elements, a.elements, b.elements) },
        }
    }
}
