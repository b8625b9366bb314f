//! Intersection cardinality: `sum(popcount(left[i] & right[i]))`.
//!
//! Every variant counts over `min(size, left.len(), right.len())` words. The
//! unrolled and vector variants walk whole blocks of their stride inside that
//! bound and hand the last `< stride` words to a scalar loop, so none of them
//! reads past the bound and all of them agree with [`popcnt`] for any `size`.
//!
//! Unrolled variants keep `ACC` independent accumulators. Inside one loop body
//! word `k` is added to accumulator `k % ACC`, which breaks the serial
//! dependency between consecutive popcount additions.

use crate::error::Result;
use crate::simd::{SimdBits, SimdLanes, U64x4};
use crate::utils::{AlignedVec, BUFFER_ALIGNMENT};

/// Accumulators of the unrolled scalar variant.
pub const UNROLL: usize = 4;

/// Accumulators rotated by the two-lane vector variants.
pub const ROTATING_ACCUMULATORS: usize = 3;

/// Reusable buffer the store-based variants spill vector registers into.
///
/// Holds two registers' worth of words: the single-lane variant uses the first
/// half, the two-lane variants write each register into its own half. The
/// length is fixed at construction.
pub struct Scratch {
    words: AlignedVec<u64>,
}

impl Scratch {
    /// Scratch sized for two registers of `lanes` words each.
    pub fn new(lanes: usize) -> Result<Self> {
        Ok(Self {
            words: AlignedVec::zeroed(2 * lanes, BUFFER_ALIGNMENT)?,
        })
    }

    /// Scratch sized for two registers of `V`.
    pub fn for_lanes<V: SimdLanes>() -> Result<Self> {
        Self::new(V::LANES)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Mutable view used by the kernels; exposed so tests can poison it.
    pub fn words_mut(&mut self) -> &mut [u64] {
        &mut self.words
    }
}

#[inline(always)]
fn bound(left: &[u64], right: &[u64], size: usize) -> usize {
    size.min(left.len()).min(right.len())
}

#[inline(always)]
fn tail_popcnt(left: &[u64], right: &[u64], from: usize, to: usize) -> u64 {
    left[from..to]
        .iter()
        .zip(&right[from..to])
        .map(|(l, r)| (l & r).count_ones() as u64)
        .sum()
}

/// Scalar baseline: one AND and one popcount per word, single accumulator.
pub fn popcnt(left: &[u64], right: &[u64], size: usize) -> u64 {
    let n = bound(left, right, size);
    let mut cardinality = 0u64;
    for (l, r) in left[..n].iter().zip(&right[..n]) {
        cardinality += (l & r).count_ones() as u64;
    }
    cardinality
}

/// Scalar popcount with `ACC` independent accumulators over a stride-`ACC` loop.
pub fn unrolled_popcnt<const ACC: usize>(left: &[u64], right: &[u64], size: usize) -> u64 {
    assert!(ACC > 0, "at least one accumulator is required");

    let n = bound(left, right, size);
    let mut acc = [0u64; ACC];

    let mut left_chunks = left[..n].chunks_exact(ACC);
    let mut right_chunks = right[..n].chunks_exact(ACC);
    for (l, r) in left_chunks.by_ref().zip(right_chunks.by_ref()) {
        for k in 0..ACC {
            acc[k] += (l[k] & r[k]).count_ones() as u64;
        }
    }
    for (l, r) in left_chunks.remainder().iter().zip(right_chunks.remainder()) {
        acc[0] += (l & r).count_ones() as u64;
    }

    acc.iter().sum()
}

/// Vector AND of one register, stored to `scratch`, then scalar popcount of each
/// stored word into a single accumulator.
///
/// # Panics
///
/// Panics if `scratch` holds fewer than `V::LANES` words.
#[inline(always)]
pub fn vpand_store_popcnt<V: SimdBits<Elem = u64>>(
    left: &[u64],
    right: &[u64],
    size: usize,
    scratch: &mut Scratch,
) -> u64 {
    let n = bound(left, right, size);
    let words = scratch.words_mut();
    assert!(words.len() >= V::LANES, "scratch buffer too small");

    let (lp, rp) = (left.as_ptr(), right.as_ptr());
    let mut cardinality = 0u64;
    let mut i = 0;
    while i + V::LANES <= n {
        // SAFETY: i + LANES <= n <= len of both inputs; words holds at least LANES.
        unsafe {
            (V::load(lp.add(i)) & V::load(rp.add(i))).store_at(words.as_mut_ptr());
        }
        for word in &words[..V::LANES] {
            cardinality += word.count_ones() as u64;
        }
        i += V::LANES;
    }

    cardinality + tail_popcnt(left, right, i, n)
}

/// Two registers per loop body, stored into the two halves of `scratch`, with the
/// `2 * V::LANES` stored words rotated across `ACC` accumulators.
///
/// # Panics
///
/// Panics if `scratch` holds fewer than `2 * V::LANES` words.
#[inline(always)]
pub fn vpand_store_popcnt_unrolled<V: SimdBits<Elem = u64>, const ACC: usize>(
    left: &[u64],
    right: &[u64],
    size: usize,
    scratch: &mut Scratch,
) -> u64 {
    assert!(ACC > 0, "at least one accumulator is required");

    let n = bound(left, right, size);
    let stride = 2 * V::LANES;
    let words = scratch.words_mut();
    assert!(words.len() >= stride, "scratch buffer too small");

    let (lp, rp) = (left.as_ptr(), right.as_ptr());
    let mut acc = [0u64; ACC];
    let mut i = 0;
    while i + stride <= n {
        // SAFETY: i + 2 * LANES <= n; both halves of words fit in its 2 * LANES.
        unsafe {
            let out = words.as_mut_ptr();
            (V::load(lp.add(i)) & V::load(rp.add(i))).store_at(out);
            (V::load(lp.add(i + V::LANES)) & V::load(rp.add(i + V::LANES)))
                .store_at(out.add(V::LANES));
        }
        for (k, word) in words[..stride].iter().enumerate() {
            acc[k % ACC] += word.count_ones() as u64;
        }
        i += stride;
    }
    acc[0] += tail_popcnt(left, right, i, n);

    acc.iter().sum()
}

/// Vector AND of one register, then popcount of each lane read straight out of
/// the register, without a store.
#[inline(always)]
pub fn vpand_extract_popcnt<V: SimdBits<Elem = u64>>(
    left: &[u64],
    right: &[u64],
    size: usize,
) -> u64 {
    let n = bound(left, right, size);

    let (lp, rp) = (left.as_ptr(), right.as_ptr());
    let mut cardinality = 0u64;
    let mut i = 0;
    while i + V::LANES <= n {
        // SAFETY: i + LANES <= n <= len of both inputs.
        let intersection = unsafe { V::load(lp.add(i)) & V::load(rp.add(i)) };
        for k in 0..V::LANES {
            cardinality += intersection.extract(k).count_ones() as u64;
        }
        i += V::LANES;
    }

    cardinality + tail_popcnt(left, right, i, n)
}

/// Two registers per loop body with direct lane extraction, rotating the
/// `2 * V::LANES` extracted words across `ACC` accumulators.
#[inline(always)]
pub fn vpand_extract_popcnt_unrolled<V: SimdBits<Elem = u64>, const ACC: usize>(
    left: &[u64],
    right: &[u64],
    size: usize,
) -> u64 {
    assert!(ACC > 0, "at least one accumulator is required");

    let n = bound(left, right, size);
    let stride = 2 * V::LANES;

    let (lp, rp) = (left.as_ptr(), right.as_ptr());
    let mut acc = [0u64; ACC];
    let mut i = 0;
    while i + stride <= n {
        // SAFETY: i + 2 * LANES <= n <= len of both inputs.
        let (first, second) = unsafe {
            (
                V::load(lp.add(i)) & V::load(rp.add(i)),
                V::load(lp.add(i + V::LANES)) & V::load(rp.add(i + V::LANES)),
            )
        };
        for k in 0..V::LANES {
            acc[k % ACC] += first.extract(k).count_ones() as u64;
        }
        for k in 0..V::LANES {
            acc[(V::LANES + k) % ACC] += second.extract(k).count_ones() as u64;
        }
        i += stride;
    }
    acc[0] += tail_popcnt(left, right, i, n);

    acc.iter().sum()
}

/// The six intersection-cardinality variants, instantiated with the default
/// 256-bit lanes and the accumulator counts the benchmark suite uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CardinalityVariant {
    Popcnt,
    UnrolledPopcnt,
    VpandStorePopcnt,
    VpandStorePopcntUnrolled,
    VpandExtractPopcnt,
    VpandExtractPopcntUnrolled,
}

impl CardinalityVariant {
    pub const ALL: [CardinalityVariant; 6] = [
        CardinalityVariant::Popcnt,
        CardinalityVariant::UnrolledPopcnt,
        CardinalityVariant::VpandStorePopcnt,
        CardinalityVariant::VpandStorePopcntUnrolled,
        CardinalityVariant::VpandExtractPopcnt,
        CardinalityVariant::VpandExtractPopcntUnrolled,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CardinalityVariant::Popcnt => "popcnt",
            CardinalityVariant::UnrolledPopcnt => "unrolledPopcnt",
            CardinalityVariant::VpandStorePopcnt => "vpandStorePopcnt",
            CardinalityVariant::VpandStorePopcntUnrolled => "vpandStorePopcntUnrolled",
            CardinalityVariant::VpandExtractPopcnt => "vpandExtractPopcnt",
            CardinalityVariant::VpandExtractPopcntUnrolled => "vpandExtractPopcntUnrolled",
        }
    }

    /// Runs this variant once. Dispatches on `self`, so timed loops should match
    /// on the variant outside the loop and call the kernel directly.
    pub fn run(&self, left: &[u64], right: &[u64], size: usize, scratch: &mut Scratch) -> u64 {
        match self {
            CardinalityVariant::Popcnt => popcnt(left, right, size),
            CardinalityVariant::UnrolledPopcnt => unrolled_popcnt::<UNROLL>(left, right, size),
            CardinalityVariant::VpandStorePopcnt => {
                vpand_store_popcnt::<U64x4>(left, right, size, scratch)
            }
            CardinalityVariant::VpandStorePopcntUnrolled => {
                vpand_store_popcnt_unrolled::<U64x4, ROTATING_ACCUMULATORS>(
                    left, right, size, scratch,
                )
            }
            CardinalityVariant::VpandExtractPopcnt => {
                vpand_extract_popcnt::<U64x4>(left, right, size)
            }
            CardinalityVariant::VpandExtractPopcntUnrolled => {
                vpand_extract_popcnt_unrolled::<U64x4, ROTATING_ACCUMULATORS>(left, right, size)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::portable::Lanes;

    fn words(seed: u64, len: usize) -> Vec<u64> {
        // splitmix64, enough to get varied bit patterns without a generator
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
                let mut z = state;
                z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
                z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
                z ^ (z >> 31)
            })
            .collect()
    }

    #[test]
    fn test_documented_example() {
        let left: [u64; 2] = [0xFFFF_FFFF_FFFF_FFFF, 0];
        let right: [u64; 2] = [0x0F0F_0F0F_0F0F_0F0F, 0xFF];
        let mut scratch = Scratch::for_lanes::<U64x4>().unwrap();
        for variant in CardinalityVariant::ALL {
            assert_eq!(variant.run(&left, &right, 2, &mut scratch), 32, "{}", variant.name());
        }
    }

    #[test]
    fn test_all_variants_agree_for_every_size() {
        let left = words(1, 67);
        let right = words(2, 67);
        let mut scratch = Scratch::for_lanes::<U64x4>().unwrap();

        for size in 0..=70 {
            let expected = popcnt(&left, &right, size);
            for variant in CardinalityVariant::ALL {
                assert_eq!(
                    variant.run(&left, &right, size, &mut scratch),
                    expected,
                    "{} at size {size}",
                    variant.name()
                );
            }
        }
    }

    #[test]
    fn test_bound_is_min_of_size_and_lengths() {
        let left = vec![u64::MAX; 8];
        let right = vec![u64::MAX; 12];
        assert_eq!(popcnt(&left, &right, 100), 8 * 64);
        assert_eq!(unrolled_popcnt::<4>(&left, &right, 100), 8 * 64);
        assert_eq!(vpand_extract_popcnt::<U64x4>(&right, &left, 100), 8 * 64);
    }

    #[test]
    fn test_accumulator_count_is_free_parameter() {
        let left = words(3, 128);
        let right = words(4, 128);
        let expected = popcnt(&left, &right, 128);

        assert_eq!(unrolled_popcnt::<1>(&left, &right, 128), expected);
        assert_eq!(unrolled_popcnt::<7>(&left, &right, 128), expected);
        assert_eq!(
            vpand_extract_popcnt_unrolled::<U64x4, 2>(&left, &right, 128),
            expected
        );
        assert_eq!(
            vpand_extract_popcnt_unrolled::<U64x4, 8>(&left, &right, 128),
            expected
        );
    }

    #[test]
    fn test_wider_portable_lanes() {
        let left = words(5, 100);
        let right = words(6, 100);
        let expected = popcnt(&left, &right, 100);
        let mut scratch = Scratch::for_lanes::<Lanes<u64, 8>>().unwrap();
        assert_eq!(scratch.len(), 16);

        assert_eq!(
            vpand_store_popcnt::<Lanes<u64, 8>>(&left, &right, 100, &mut scratch),
            expected
        );
        assert_eq!(
            vpand_store_popcnt_unrolled::<Lanes<u64, 8>, 3>(&left, &right, 100, &mut scratch),
            expected
        );
        assert_eq!(
            vpand_extract_popcnt_unrolled::<Lanes<u64, 8>, 3>(&left, &right, 100),
            expected
        );
    }

    #[test]
    #[should_panic(expected = "scratch buffer too small")]
    fn test_panic_scratch_too_small() {
        let left = [1u64; 8];
        let mut scratch = Scratch::new(2).unwrap();
        vpand_store_popcnt_unrolled::<Lanes<u64, 4>, 3>(&left, &left, 8, &mut scratch);
    }
}
