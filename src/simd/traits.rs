use std::ops::{Add, BitAnd, Mul};

/// A fixed-width SIMD vector of `LANES` elements of type `Elem`.
///
/// The width is an associated constant, so kernels written against this trait are
/// monomorphised per vector type and never branch on the width at run time.
pub trait SimdLanes: Copy {
    /// Scalar type held in each lane.
    type Elem: Copy;

    /// Number of lanes in the vector.
    const LANES: usize;

    /// Loads `LANES` contiguous elements starting at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `LANES` elements. Callers guarantee this
    /// through their loop-stride invariant; no bounds check is performed.
    unsafe fn load(ptr: *const Self::Elem) -> Self;

    /// Writes all `LANES` elements to `ptr`, overwriting what was there.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of `LANES` elements.
    unsafe fn store_at(&self, ptr: *mut Self::Elem);

    /// Replicates `value` across every lane.
    fn splat(value: Self::Elem) -> Self;

    /// Reads lane `index` without storing the whole vector.
    ///
    /// # Panics
    ///
    /// Panics if `index >= LANES`.
    fn extract(&self, index: usize) -> Self::Elem;

    /// Loads the first `LANES` elements of `slice`.
    ///
    /// # Panics
    ///
    /// Panics if `slice` holds fewer than `LANES` elements.
    #[inline(always)]
    fn from_slice(slice: &[Self::Elem]) -> Self {
        assert!(
            slice.len() >= Self::LANES,
            "Slice must hold at least {} elements, got {}",
            Self::LANES,
            slice.len()
        );
        // SAFETY: length checked above.
        unsafe { Self::load(slice.as_ptr()) }
    }

    /// Stores the vector into the first `LANES` elements of `slice`.
    ///
    /// # Panics
    ///
    /// Panics if `slice` holds fewer than `LANES` elements.
    #[inline(always)]
    fn store_to(&self, slice: &mut [Self::Elem]) {
        assert!(
            slice.len() >= Self::LANES,
            "Slice must hold at least {} elements, got {}",
            Self::LANES,
            slice.len()
        );
        // SAFETY: length checked above.
        unsafe { self.store_at(slice.as_mut_ptr()) }
    }

    /// Copies every lane into a `Vec`, lane 0 first.
    fn to_vec(&self) -> Vec<Self::Elem> {
        (0..Self::LANES).map(|i| self.extract(i)).collect()
    }
}

/// Floating-point lanes: elementwise add, multiply and fused multiply-add.
pub trait SimdFloat: SimdLanes + Add<Output = Self> + Mul<Output = Self> {
    /// Computes `self * a + b` per lane, with a single rounding where the
    /// hardware provides an FMA instruction.
    fn fmadd(self, a: Self, b: Self) -> Self;

    /// Multiplies every lane by the scalar `s`.
    #[inline(always)]
    fn mul_scalar(self, s: Self::Elem) -> Self {
        self * Self::splat(s)
    }
}

/// Integer lanes: elementwise wrapping add and bitwise AND.
pub trait SimdBits: SimdLanes + Add<Output = Self> + BitAnd<Output = Self> {}
