//! Agreement and bounds tests for the intersection-cardinality kernels.

use lanebench::data::DataGenerator;
use lanebench::fixture::IntersectionFixture;
use lanebench::kernels::intersection::{
    popcnt, vpand_store_popcnt, vpand_store_popcnt_unrolled, CardinalityVariant, Scratch,
};
use lanebench::simd::U64x4;

/// Words past the logical length, set so that any stray read changes the count.
const GUARD_WORDS: usize = 16;
const SENTINEL: u64 = u64::MAX;

fn naive(left: &[u64], right: &[u64]) -> u64 {
    left.iter()
        .zip(right)
        .map(|(l, r)| u64::from((l & r).count_ones()))
        .sum()
}

fn random_words(generator: &mut DataGenerator, len: usize) -> Vec<u64> {
    let mut words = vec![0u64; len];
    generator.fill_u64(&mut words);
    words
}

#[test]
fn test_documented_example() {
    let left: [u64; 2] = [0xFFFF_FFFF_FFFF_FFFF, 0];
    let right: [u64; 2] = [0x0F0F_0F0F_0F0F_0F0F, 0xFF];
    let mut fixture = IntersectionFixture::from_parts(&left, &right, 2).unwrap();

    for variant in CardinalityVariant::ALL {
        assert_eq!(fixture.run(variant), 32, "{}", variant.name());
    }
}

#[test]
fn test_zero_size_is_zero() {
    let mut generator = DataGenerator::seeded(1);
    let left = random_words(&mut generator, 64);
    let right = random_words(&mut generator, 64);
    let mut fixture = IntersectionFixture::from_parts(&left, &right, 0).unwrap();

    for variant in CardinalityVariant::ALL {
        assert_eq!(fixture.run(variant), 0, "{}", variant.name());
    }

    // empty buffers are never indexed either
    let mut scratch = Scratch::for_lanes::<U64x4>().unwrap();
    for variant in CardinalityVariant::ALL {
        assert_eq!(variant.run(&[], &[], 0, &mut scratch), 0, "{}", variant.name());
    }
}

#[test]
fn test_guard_words_are_never_read() {
    let mut generator = DataGenerator::seeded(2);
    let mut scratch = Scratch::for_lanes::<U64x4>().unwrap();

    for logical in 0..=37 {
        let mut left = random_words(&mut generator, logical + GUARD_WORDS);
        let mut right = random_words(&mut generator, logical + GUARD_WORDS);
        left[logical..].fill(SENTINEL);
        right[logical..].fill(SENTINEL);

        let expected = naive(&left[..logical], &right[..logical]);

        // the full buffers are visible to the kernel; only `size` keeps it out
        // of the guard region
        for variant in CardinalityVariant::ALL {
            assert_eq!(
                variant.run(&left, &right, logical, &mut scratch),
                expected,
                "{} read past size {logical}",
                variant.name()
            );
        }

        // and the slice length is honoured when `size` overshoots it
        for variant in CardinalityVariant::ALL {
            assert_eq!(
                variant.run(&left[..logical], &right[..logical], logical + 5, &mut scratch),
                expected,
                "{} read past length {logical}",
                variant.name()
            );
        }
    }
}

#[test]
fn test_scratch_does_not_leak_between_calls() {
    let ones = vec![u64::MAX; 24];
    let zeros = vec![0u64; 24];
    let mut scratch = Scratch::for_lanes::<U64x4>().unwrap();

    for size in [4, 5, 8, 13, 24] {
        assert_eq!(
            vpand_store_popcnt::<U64x4>(&ones, &ones, size, &mut scratch),
            64 * size as u64
        );
        assert_eq!(vpand_store_popcnt::<U64x4>(&zeros, &ones, size, &mut scratch), 0);

        assert_eq!(
            vpand_store_popcnt_unrolled::<U64x4, 3>(&ones, &ones, size, &mut scratch),
            64 * size as u64
        );
        assert_eq!(
            vpand_store_popcnt_unrolled::<U64x4, 3>(&ones, &zeros, size, &mut scratch),
            0
        );
    }

    // explicit poisoning, as if a previous call had been interrupted
    scratch.words_mut().fill(SENTINEL);
    assert_eq!(vpand_store_popcnt::<U64x4>(&zeros, &zeros, 24, &mut scratch), 0);
    scratch.words_mut().fill(SENTINEL);
    assert_eq!(
        vpand_store_popcnt_unrolled::<U64x4, 3>(&zeros, &zeros, 24, &mut scratch),
        0
    );
}

#[test]
fn test_variants_agree_on_random_bitsets() {
    let mut generator = DataGenerator::seeded(3);
    let mut scratch = Scratch::for_lanes::<U64x4>().unwrap();

    for size in [1, 7, 8, 9, 63, 64, 65, 1000, 1021, 1024] {
        let left = random_words(&mut generator, 1024);
        let right = random_words(&mut generator, 1024);
        let expected = popcnt(&left, &right, size);
        assert_eq!(expected, naive(&left[..size], &right[..size]));

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
fn test_disjoint_and_identical_sets() {
    let evens = vec![0x5555_5555_5555_5555u64; 100];
    let odds = vec![0xAAAA_AAAA_AAAA_AAAAu64; 100];
    let mut scratch = Scratch::for_lanes::<U64x4>().unwrap();

    for variant in CardinalityVariant::ALL {
        assert_eq!(variant.run(&evens, &odds, 100, &mut scratch), 0);
        assert_eq!(variant.run(&evens, &evens, 100, &mut scratch), 32 * 100);
    }
}
