//! AVX2 4-lane u64 SIMD vector implementation.
//!
//! `U64x4` wraps `__m256i` for the bitset intersection kernels: `vpand` for the
//! intersection itself, `vmovdqu` stores into a scratch buffer, and
//! `vpextrq`-style lane extraction for the store-free reductions.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::ops::{Add, BitAnd};

use crate::simd::traits::{SimdBits, SimdLanes};

/// Number of u64 elements that fit in a 256-bit register.
pub const LANE_COUNT: usize = 4;

/// AVX2 SIMD vector containing 4 packed u64 values.
#[derive(Copy, Clone, Debug)]
pub struct U64x4 {
    /// AVX2 256-bit integer register
    pub elements: __m256i,
}

impl U64x4 {
    #[inline(always)]
    pub fn is_aligned(ptr: *const u64) -> bool {
        (ptr as usize) % core::mem::align_of::<__m256i>() == 0
    }
}

impl SimdLanes for U64x4 {
    type Elem = u64;

    const LANES: usize = LANE_COUNT;

    #[inline(always)]
    unsafe fn load(ptr: *const u64) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        let ptr = ptr as *const __m256i;
        Self {
            elements: match U64x4::is_aligned(ptr as *const u64) {
                true => _mm256_load_si256(ptr),
                false => _mm256_loadu_si256(ptr),
            },
        }
    }

    #[inline(always)]
    unsafe fn store_at(&self, ptr: *mut u64) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");

        match U64x4::is_aligned(ptr) {
            true => _mm256_store_si256(ptr as *mut __m256i, self.elements),
            false => _mm256_storeu_si256(ptr as *mut __m256i, self.elements),
        }
    }

    #[inline(always)]
    fn splat(value: u64) -> Self {
        Self {
            elements: unsafe { _mm256_set1_epi64x(value as i64) },
        }
    }

    #[inline(always)]
    fn extract(&self, index: usize) -> u64 {
        unsafe {
            match index {
                0 => _mm256_extract_epi64::<0>(self.elements) as u64,
                1 => _mm256_extract_epi64::<1>(self.elements) as u64,
                2 => _mm256_extract_epi64::<2>(self.elements) as u64,
                3 => _mm256_extract_epi64::<3>(self.elements) as u64,
                _ => panic!("Lane index {index} out of range for {LANE_COUNT} lanes"),
            }
        }
    }
}

impl Add for U64x4 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            elements: unsafe { _mm256_add_epi64(self.elements, rhs.elements) },
        }
    }
}

impl BitAnd for U64x4 {
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self {
            elements: unsafe { _mm256_and_si256(self.elements, rhs.elements) },
        }
    }
}

impl SimdBits for U64x4 {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::portable::Lanes;

    #[test]
    fn test_and_matches_portable_lanes() {
        let a = [u64::MAX, 0x0F0F_0F0F_0F0F_0F0F, 1 << 63, 0];
        let b = [0x1234, u64::MAX, u64::MAX, u64::MAX];

        let simd = U64x4::from_slice(&a) & U64x4::from_slice(&b);
        let portable = Lanes(a) & Lanes(b);
        assert_eq!(simd.to_vec(), portable.to_vec());
    }

    #[test]
    fn test_wrapping_add() {
        let v = U64x4::splat(u64::MAX) + U64x4::splat(2);
        assert_eq!(v.to_vec(), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_store_then_extract_agree() {
        let v = U64x4::from_slice(&[7, 8, 9, 10]);
        let mut stored = [0u64; 4];
        v.store_to(&mut stored);
        assert_eq!(stored.to_vec(), v.to_vec());
    }
}
