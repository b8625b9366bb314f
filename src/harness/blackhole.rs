//! Result sink that keeps timed work observable to the optimizer.

use std::hint::black_box;

/// Sink for benchmark results.
///
/// Every timed invocation hands its result to [`Blackhole::consume`]. The value is
/// passed through [`std::hint::black_box`], so the optimizer has to assume it is
/// observed and cannot drop the computation that produced it.
#[derive(Debug, Default)]
pub struct Blackhole {
    _private: (),
}

impl Blackhole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `value` as used.
    #[inline(always)]
    pub fn consume<T>(&mut self, value: T) {
        black_box(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_accepts_values_and_borrows() {
        let mut bh = Blackhole::new();
        let mut out = vec![1.0f64; 4];
        bh.consume(42u64);
        bh.consume(&out);
        bh.consume(out.as_mut_slice());
        assert_eq!(out, vec![1.0; 4]);
    }
}
