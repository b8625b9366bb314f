//! Pseudorandom benchmark inputs.
//!
//! Fixtures draw fresh contents from a [`DataGenerator`] at every iteration
//! boundary. A generator built with [`DataGenerator::seeded`] replays the same
//! sequence, which makes forks and test failures reproducible.

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Source of random buffer contents and scalar coefficients.
#[derive(Debug, Clone)]
pub struct DataGenerator {
    rng: StdRng,
}

impl DataGenerator {
    /// Generator seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Generator that replays the sequence identified by `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is set, entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Uniform value in `[0, 1)`.
    #[inline]
    pub fn next_scalar(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Overwrites `buffer` with independent uniform values in `[0, 1)`.
    pub fn fill_f64(&mut self, buffer: &mut [f64]) {
        buffer
            .iter_mut()
            .for_each(|x| *x = self.rng.random::<f64>());
    }

    /// Overwrites `buffer` with independent uniformly random 64-bit words.
    pub fn fill_u64(&mut self, buffer: &mut [u64]) {
        self.rng.fill(buffer);
    }
}

impl Default for DataGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
