//! Uniform chooser
//!
//! Every index in `[0, item_count)` is equally likely. Also used for scan
//! lengths, where the population is the maximum scan length.

use super::{assert_populated, Chooser, Prng};
use rand::Rng;

/// Uniform chooser over a growable population
#[derive(Debug, Clone)]
pub struct UniformChooser {
    item_count: usize,
}

impl UniformChooser {
    pub fn new(item_count: usize) -> Self {
        Self { item_count }
    }
}

impl Chooser for UniformChooser {
    #[inline(always)]
    fn next(&mut self, rng: &mut Prng) -> usize {
        assert_populated(self.item_count);
        rng.gen_range(0..self.item_count)
    }

    fn set_item_count(&mut self, item_count: usize) {
        self.item_count = item_count;
    }

    fn increase_item_count_by(&mut self, delta: usize) {
        self.item_count += delta;
    }

    fn item_count(&self) -> usize {
        self.item_count
    }
}
