//! Miss-cost model: the value producer invoked on every cache miss.
//!
//! The producer burns CPU with a recursive Fibonacci of configurable depth,
//! standing in for whatever expensive computation a real cache would be
//! shielding. The produced value embeds the key, which is what lets the
//! driver re-derive the expected value independently and self-check every
//! response.

use std::hint::black_box;

use crate::backend::Value;

/// Produces `[fib(level), key]` for a given key.
///
/// `level` tunes miss cost exponentially; level 0/1 make misses nearly free.
#[derive(Debug, Clone, Copy)]
pub struct Payload {
    level: u32,
}

impl Payload {
    pub fn new(level: u32) -> Self {
        Self { level }
    }

    /// Materializes the value for `key`, paying the configured compute cost.
    #[inline]
    pub fn produce(&self, key: u64) -> Value {
        [fibonacci(black_box(self.level)), key]
    }

    /// The value `produce(key)` must return; used for the driver self-check.
    #[inline]
    pub fn expected(&self, key: u64) -> Value {
        [fibonacci(self.level), key]
    }
}

/// Deliberately naive recursion: the exponential call tree is the workload.
fn fibonacci(n: u32) -> u64 {
    if n <= 1 {
        return 1;
    }
    fibonacci(n - 1) + fibonacci(n - 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fibonacci_base_cases_and_growth() {
        assert_eq!(fibonacci(0), 1);
        assert_eq!(fibonacci(1), 1);
        assert_eq!(fibonacci(2), 2);
        assert_eq!(fibonacci(10), 89);
    }

    #[test]
    fn produce_matches_expected_for_every_key() {
        let payload = Payload::new(5);
        for key in [0u64, 1, 42, u64::MAX] {
            assert_eq!(payload.produce(key), payload.expected(key));
        }
        assert_eq!(payload.produce(7), [8, 7]);
    }
}
