//! Value payload pool
//!
//! Generating fresh bytes for every request would put the generator on the
//! measured path, so each producer allocates one arena of random bytes up
//! front and hands out fixed-size slices of it in rotation.
//!
//! The arena holds `num_values` slots. The last slot is reserved: it is never
//! returned by [`ValueGenerator::next_value`] and is exposed separately as the
//! tombstone payload through [`ValueGenerator::last_value`].
//!
//! # Example
//!
//! ```
//! use kvpulse::distribution::Prng;
//! use kvpulse::generator::value::ValueGenerator;
//! use rand::SeedableRng;
//!
//! let mut rng = Prng::seed_from_u64(1);
//! let mut values = ValueGenerator::new(16, 3, &mut rng);
//! let a = values.next_value().as_ptr();
//! let b = values.next_value().as_ptr();
//! let c = values.next_value().as_ptr();
//! assert_ne!(a, b);
//! assert_eq!(a, c); // two usable slots, then it wraps
//! assert_eq!(values.last_value().len(), 16);
//! ```

use crate::distribution::Prng;
use rand::RngCore;

/// Smallest value size accepted (room for a 32-bit integer)
pub const MIN_VALUE_SIZE: usize = std::mem::size_of::<u32>();

/// Rotating pool of fixed-size random payloads
#[derive(Debug, Clone)]
pub struct ValueGenerator {
    arena: Vec<u8>,
    value_size: usize,
    num_values: usize,
    next_slot: usize,
}

impl ValueGenerator {
    /// Allocate and fill the pool
    ///
    /// # Panics
    ///
    /// Panics if `value_size` is below [`MIN_VALUE_SIZE`] or if `num_values` is
    /// below 2 (one cycling slot plus the tombstone).
    pub fn new(value_size: usize, num_values: usize, rng: &mut Prng) -> Self {
        assert!(
            value_size >= MIN_VALUE_SIZE,
            "Value size must be at least {} bytes, got {}",
            MIN_VALUE_SIZE,
            value_size
        );
        assert!(
            num_values >= 2,
            "Value pool needs at least 2 slots (one payload plus the tombstone), got {}",
            num_values
        );

        let mut arena = vec![0u8; value_size * num_values];
        rng.fill_bytes(&mut arena);
        Self {
            arena,
            value_size,
            num_values,
            next_slot: 0,
        }
    }

    /// Next payload in rotation
    ///
    /// Cycles through the first `num_values - 1` slots; the tombstone slot is
    /// never returned here.
    #[inline]
    pub fn next_value(&mut self) -> &[u8] {
        let slot = self.next_slot;
        self.next_slot += 1;
        if self.next_slot >= self.num_values - 1 {
            self.next_slot = 0;
        }
        self.slot(slot)
    }

    /// The reserved tombstone payload (always the same slot)
    #[inline]
    pub fn last_value(&self) -> &[u8] {
        self.slot(self.num_values - 1)
    }

    /// Payload for the `i`-th record of a bulk load
    ///
    /// Indexes the cycling slots without moving the rotation cursor.
    #[inline]
    pub fn value_at(&self, i: usize) -> &[u8] {
        self.slot(i % (self.num_values - 1))
    }

    pub fn value_size(&self) -> usize {
        self.value_size
    }

    pub fn num_values(&self) -> usize {
        self.num_values
    }

    #[inline(always)]
    fn slot(&self, slot: usize) -> &[u8] {
        let start = slot * self.value_size;
        &self.arena[start..start + self.value_size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn pool(value_size: usize, num_values: usize) -> ValueGenerator {
        ValueGenerator::new(value_size, num_values, &mut Prng::seed_from_u64(11))
    }

    #[test]
    fn test_cycle_skips_tombstone() {
        let mut values = pool(8, 5);
        let tombstone = values.last_value().as_ptr();

        let first_cycle: Vec<_> = (0..4).map(|_| values.next_value().as_ptr()).collect();
        let distinct: HashSet<_> = first_cycle.iter().collect();
        assert_eq!(distinct.len(), 4);
        assert!(!first_cycle.contains(&tombstone));

        // The rotation repeats in the same order
        let second_cycle: Vec<_> = (0..4).map(|_| values.next_value().as_ptr()).collect();
        assert_eq!(first_cycle, second_cycle);
    }

    #[test]
    fn test_last_value_is_stable() {
        let mut values = pool(8, 3);
        let tombstone = values.last_value().as_ptr();
        for _ in 0..10 {
            values.next_value();
            assert_eq!(values.last_value().as_ptr(), tombstone);
        }
    }

    #[test]
    fn test_two_slot_pool() {
        let mut values = pool(4, 2);
        let only = values.next_value().as_ptr();
        assert_eq!(values.next_value().as_ptr(), only);
        assert_ne!(values.last_value().as_ptr(), only);
    }

    #[test]
    fn test_value_at_wraps_over_cycling_slots() {
        let mut values = pool(16, 4);
        assert_eq!(values.value_at(0).as_ptr(), values.value_at(3).as_ptr());
        assert_ne!(values.value_at(2).as_ptr(), values.last_value().as_ptr());
        // value_at does not disturb the rotation
        let first = values.value_at(0).as_ptr();
        assert_eq!(values.next_value().as_ptr(), first);
    }

    #[test]
    fn test_value_sizes() {
        let mut values = pool(100, 10);
        assert_eq!(values.next_value().len(), 100);
        assert_eq!(values.last_value().len(), 100);
        assert_eq!(values.value_size(), 100);
        assert_eq!(values.num_values(), 10);
    }

    #[test]
    fn test_seeded_contents_reproducible() {
        let a = pool(32, 4);
        let b = pool(32, 4);
        assert_eq!(a.value_at(1), b.value_at(1));
    }

    #[test]
    #[should_panic(expected = "at least 4 bytes")]
    fn test_value_too_small() {
        pool(3, 4);
    }

    #[test]
    #[should_panic(expected = "at least 2 slots")]
    fn test_single_slot_rejected() {
        pool(8, 1);
    }
}
