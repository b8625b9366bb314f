//! Per-run benchmark state.
//!
//! A fixture owns every buffer one benchmark touches. Construction validates the
//! buffer geometry and allocates once; [`Fixture::setup_iteration`] refreshes the
//! contents at each iteration boundary without reallocating; dropping the fixture
//! frees everything.

use tracing::debug;

use crate::data::DataGenerator;
use crate::error::{bound_exceeds_length, length_mismatch, unaligned_length, Result};
use crate::harness::runner::Fixture;
use crate::kernels::axpy::AxpyVariant;
use crate::kernels::intersection::{CardinalityVariant, Scratch};
use crate::simd::{F64x4, SimdLanes, U64x4};
use crate::utils::{AlignedVec, BUFFER_ALIGNMENT};

/// State of the AXPY benchmarks: `out += s * data`.
pub struct AxpyFixture {
    s: f64,
    data: AlignedVec<f64>,
    out: AlignedVec<f64>,
}

impl AxpyFixture {
    /// Zeroed `data` and `out` of `len` elements.
    ///
    /// # Errors
    ///
    /// `UnalignedLength` if `len` is not a multiple of the vector lane count.
    pub fn new(len: usize) -> Result<Self> {
        if len % F64x4::LANES != 0 {
            return Err(unaligned_length(len, F64x4::LANES));
        }

        debug!(len, "allocating axpy fixture");
        Ok(Self {
            s: 0.0,
            data: AlignedVec::zeroed(len, BUFFER_ALIGNMENT)?,
            out: AlignedVec::zeroed(len, BUFFER_ALIGNMENT)?,
        })
    }

    /// Fixture holding copies of the given inputs.
    ///
    /// # Errors
    ///
    /// `LengthMismatch` if `data` and `out` differ in length, `UnalignedLength`
    /// if that length is not a multiple of the vector lane count.
    pub fn from_parts(s: f64, data: &[f64], out: &[f64]) -> Result<Self> {
        if data.len() != out.len() {
            return Err(length_mismatch(data.len(), out.len()));
        }

        let mut fixture = Self::new(data.len())?;
        fixture.s = s;
        fixture.data.copy_from_slice(data);
        fixture.out.copy_from_slice(out);
        Ok(fixture)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn s(&self) -> f64 {
        self.s
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn out(&self) -> &[f64] {
        &self.out
    }

    /// `(s, data, out)` borrowed for a kernel call.
    #[inline(always)]
    pub fn split_mut(&mut self) -> (f64, &[f64], &mut [f64]) {
        (self.s, &self.data[..], &mut self.out[..])
    }

    /// Applies `variant` once to `out`.
    pub fn run(&mut self, variant: AxpyVariant) {
        let (s, data, out) = self.split_mut();
        variant.run(s, data, out);
    }
}

impl Fixture for AxpyFixture {
    /// Fresh random `data` and `s`; `out` starts again from zero.
    fn setup_iteration(&mut self, generator: &mut DataGenerator) {
        generator.fill_f64(&mut self.data);
        self.out.fill(0.0);
        self.s = generator.next_scalar();
    }
}

/// State of the intersection-cardinality benchmarks.
pub struct IntersectionFixture {
    size: usize,
    left: AlignedVec<u64>,
    right: AlignedVec<u64>,
    scratch: Scratch,
}

impl IntersectionFixture {
    /// Zeroed `left` and `right` of `len` words, counted up to `size`.
    ///
    /// # Errors
    ///
    /// `BoundExceedsLength` if `size > len`.
    pub fn new(len: usize, size: usize) -> Result<Self> {
        if size > len {
            return Err(bound_exceeds_length(size, len));
        }

        debug!(len, size, "allocating intersection fixture");
        Ok(Self {
            size,
            left: AlignedVec::zeroed(len, BUFFER_ALIGNMENT)?,
            right: AlignedVec::zeroed(len, BUFFER_ALIGNMENT)?,
            scratch: Scratch::for_lanes::<U64x4>()?,
        })
    }

    /// Fixture holding copies of the given bitsets.
    ///
    /// # Errors
    ///
    /// `LengthMismatch` if `left` and `right` differ in length,
    /// `BoundExceedsLength` if `size` is larger than that length.
    pub fn from_parts(left: &[u64], right: &[u64], size: usize) -> Result<Self> {
        if left.len() != right.len() {
            return Err(length_mismatch(left.len(), right.len()));
        }

        let mut fixture = Self::new(left.len(), size)?;
        fixture.left.copy_from_slice(left);
        fixture.right.copy_from_slice(right);
        Ok(fixture)
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn left(&self) -> &[u64] {
        &self.left
    }

    pub fn right(&self) -> &[u64] {
        &self.right
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    /// `(left, right, size, scratch)` borrowed for a kernel call.
    #[inline(always)]
    pub fn split_mut(&mut self) -> (&[u64], &[u64], usize, &mut Scratch) {
        (&self.left[..], &self.right[..], self.size, &mut self.scratch)
    }

    /// Runs `variant` once and returns the cardinality.
    pub fn run(&mut self, variant: CardinalityVariant) -> u64 {
        let (left, right, size, scratch) = self.split_mut();
        variant.run(left, right, size, scratch)
    }
}

impl Fixture for IntersectionFixture {
    /// Fresh random words in both bitsets.
    fn setup_iteration(&mut self, generator: &mut DataGenerator) {
        generator.fill_u64(&mut self.left);
        generator.fill_u64(&mut self.right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LanebenchError;

    #[test]
    fn test_axpy_fixture_rejects_unaligned_length() {
        assert!(matches!(
            AxpyFixture::new(1023),
            Err(LanebenchError::UnalignedLength { length: 1023, .. })
        ));
        assert!(AxpyFixture::new(0).is_ok());
    }

    #[test]
    fn test_axpy_fixture_rejects_mismatch() {
        assert!(matches!(
            AxpyFixture::from_parts(1.0, &[0.0; 8], &[0.0; 4]),
            Err(LanebenchError::LengthMismatch { left: 8, right: 4 })
        ));
    }

    #[test]
    fn test_axpy_setup_resets_out_and_resamples() {
        let mut fixture = AxpyFixture::new(16).unwrap();
        let mut generator = DataGenerator::seeded(3);

        fixture.setup_iteration(&mut generator);
        let first_s = fixture.s();
        fixture.run(AxpyVariant::VectorFma);
        assert!(fixture.out().iter().any(|&y| y != 0.0));

        fixture.setup_iteration(&mut generator);
        assert!(fixture.out().iter().all(|&y| y == 0.0));
        assert_ne!(fixture.s(), first_s);
    }

    #[test]
    fn test_intersection_fixture_rejects_bound() {
        assert!(matches!(
            IntersectionFixture::new(1024, 1025),
            Err(LanebenchError::BoundExceedsLength { size: 1025, length: 1024 })
        ));
        assert!(matches!(
            IntersectionFixture::from_parts(&[0; 4], &[0; 8], 4),
            Err(LanebenchError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_intersection_setup_refreshes_buffers() {
        let mut fixture = IntersectionFixture::new(64, 64).unwrap();
        let mut generator = DataGenerator::seeded(11);

        fixture.setup_iteration(&mut generator);
        let before = fixture.left().to_vec();
        let expected = fixture.run(CardinalityVariant::Popcnt);
        for variant in CardinalityVariant::ALL {
            assert_eq!(fixture.run(variant), expected);
        }

        fixture.setup_iteration(&mut generator);
        assert_ne!(fixture.left(), &before[..]);
    }

    #[test]
    fn test_scratch_is_two_registers() {
        let fixture = IntersectionFixture::new(8, 8).unwrap();
        assert_eq!(fixture.scratch().len(), 2 * U64x4::LANES);
    }
}
