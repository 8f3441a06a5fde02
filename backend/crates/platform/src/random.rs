//! Random Source
//!
//! Selection helpers take a `RandomSource` instead of reaching for a global
//! RNG so tests can make the choice deterministic.

use rand::Rng;

/// Source of uniformly distributed indices
pub trait RandomSource {
    /// Return an index in `0..len`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize;
}

/// Thread-local RNG backed source
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::rng().random_range(0..len)
    }
}

/// Deterministic source cycling through a fixed sequence
///
/// Each value is reduced modulo `len`.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<usize>,
    position: usize,
}

impl SequenceRandom {
    pub fn new(values: impl Into<Vec<usize>>) -> Self {
        Self {
            values: values.into(),
            position: 0,
        }
    }
}

impl RandomSource for SequenceRandom {
    fn next_index(&mut self, len: usize) -> usize {
        if len == 0 || self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.position % self.values.len()];
        self.position = self.position.wrapping_add(1);
        value % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_random_in_range() {
        let mut source = ThreadRandom;
        for len in 1..20 {
            assert!(source.next_index(len) < len);
        }
    }

    #[test]
    fn test_sequence_random_cycles() {
        let mut source = SequenceRandom::new(vec![0, 4, 7]);
        assert_eq!(source.next_index(5), 0);
        assert_eq!(source.next_index(5), 4);
        assert_eq!(source.next_index(5), 2);
        assert_eq!(source.next_index(5), 0);
    }
}
