//! Array-backed lanes that compile on every target.
//!
//! `Lanes<T, N>` stores `N` elements in a plain array and relies on the compiler's
//! auto-vectoriser for the elementwise operations. It is the backend behind
//! [`crate::simd::F64x4`] and [`crate::simd::U64x4`] when AVX2 is not compiled in,
//! and it can be instantiated at any width (for example `Lanes<u64, 8>` to model a
//! 512-bit register) to check that kernels do not depend on a particular width.

use std::ops::{Add, BitAnd, Mul};

use crate::simd::traits::{SimdBits, SimdFloat, SimdLanes};

/// `N` lanes of `T`, aligned like a 256-bit register.
#[repr(C, align(32))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Lanes<T, const N: usize>(pub [T; N]);

impl<T: Copy, const N: usize> SimdLanes for Lanes<T, N> {
    type Elem = T;

    const LANES: usize = N;

    #[inline(always)]
    unsafe fn load(ptr: *const T) -> Self {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        Self(std::ptr::read_unaligned(ptr as *const [T; N]))
    }

    #[inline(always)]
    unsafe fn store_at(&self, ptr: *mut T) {
        debug_assert!(!ptr.is_null(), "Pointer must not be null");
        std::ptr::write_unaligned(ptr as *mut [T; N], self.0)
    }

    #[inline(always)]
    fn splat(value: T) -> Self {
        Self([value; N])
    }

    #[inline(always)]
    fn extract(&self, index: usize) -> T {
        self.0[index]
    }
}

impl<const N: usize> Add for Lanes<f64, N> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self(std::array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

impl<const N: usize> Mul for Lanes<f64, N> {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self::Output {
        Self(std::array::from_fn(|i| self.0[i] * rhs.0[i]))
    }
}

impl<const N: usize> SimdFloat for Lanes<f64, N> {
    #[inline(always)]
    fn fmadd(self, a: Self, b: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i].mul_add(a.0[i], b.0[i])))
    }
}

impl<const N: usize> Add for Lanes<u64, N> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        Self(std::array::from_fn(|i| self.0[i].wrapping_add(rhs.0[i])))
    }
}

impl<const N: usize> BitAnd for Lanes<u64, N> {
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(std::array::from_fn(|i| self.0[i] & rhs.0[i]))
    }
}

impl<const N: usize> SimdBits for Lanes<u64, N> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_store_roundtrip_unaligned_offset() {
        let data: Vec<f64> = (0..9).map(|x| x as f64).collect();
        // Offset 1 is deliberately not 32-byte aligned.
        let v = unsafe { Lanes::<f64, 4>::load(data.as_ptr().add(1)) };
        assert_eq!(v.0, [1.0, 2.0, 3.0, 4.0]);

        let mut out = [0.0f64; 6];
        v.store_to(&mut out[2..]);
        assert_eq!(out, [0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_float_arithmetic() {
        let a = Lanes([1.0, 2.0, 3.0, 4.0]);
        let b = Lanes([0.5, 0.5, 0.5, 0.5]);
        assert_eq!((a + b).0, [1.5, 2.5, 3.5, 4.5]);
        assert_eq!((a * b).0, [0.5, 1.0, 1.5, 2.0]);
        assert_eq!(a.mul_scalar(2.0).0, [2.0, 4.0, 6.0, 8.0]);
        assert_eq!(a.fmadd(Lanes::splat(10.0), b).0, [10.5, 20.5, 30.5, 40.5]);
    }

    #[test]
    fn test_integer_and_and_wrapping_add() {
        let a = Lanes([u64::MAX, 0xF0, 0b1010, 1]);
        let b = Lanes([0x0F0F, 0xFF, 0b0110, 1]);
        assert_eq!((a & b).0, [0x0F0F, 0xF0, 0b0010, 1]);
        assert_eq!((a + b).0[0], 0x0F0E);
    }

    #[test]
    fn test_extract_and_to_vec() {
        let v = Lanes::<u64, 8>([0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(v.extract(5), 5);
        assert_eq!(v.to_vec(), (0..8).collect::<Vec<u64>>());
    }

    #[test]
    #[should_panic]
    fn test_extract_out_of_range_panics() {
        let v = Lanes::<u64, 4>::splat(1);
        v.extract(4);
    }

    #[test]
    #[should_panic(expected = "Slice must hold at least 4 elements")]
    fn test_from_slice_too_short_panics() {
        Lanes::<f64, 4>::from_slice(&[1.0, 2.0, 3.0]);
    }
}
