//! Hotspot chooser
//!
//! The first `hot_fraction` of the population is the hot set. A draw lands in
//! the hot set with probability `hot_op_fraction`, otherwise in the cold
//! remainder; within either set the choice is uniform.

use super::{assert_populated, Chooser, Prng};
use rand::Rng;

#[derive(Debug, Clone)]
pub struct HotspotChooser {
    item_count: usize,
    hot_fraction: f64,
    hot_op_fraction: f64,
}

impl HotspotChooser {
    /// # Panics
    ///
    /// Panics if either fraction lies outside `[0, 1]`.
    pub fn new(item_count: usize, hot_fraction: f64, hot_op_fraction: f64) -> Self {
        assert!((0.0..=1.0).contains(&hot_fraction), "hot_fraction must be in [0, 1]");
        assert!((0.0..=1.0).contains(&hot_op_fraction), "hot_op_fraction must be in [0, 1]");
        Self {
            item_count,
            hot_fraction,
            hot_op_fraction,
        }
    }

    /// Size of the hot prefix (at least one item)
    fn hot_count(&self) -> usize {
        ((self.item_count as f64 * self.hot_fraction) as usize).clamp(1, self.item_count)
    }
}

impl Chooser for HotspotChooser {
    fn next(&mut self, rng: &mut Prng) -> usize {
        assert_populated(self.item_count);
        let hot = self.hot_count();
        if hot == self.item_count || rng.gen::<f64>() < self.hot_op_fraction {
            rng.gen_range(0..hot)
        } else {
            rng.gen_range(hot..self.item_count)
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_hotspot_concentration() {
        let mut rng = Prng::seed_from_u64(4);
        let mut chooser = HotspotChooser::new(1000, 0.1, 0.9);
        let hot_hits = (0..10000).filter(|_| chooser.next(&mut rng) < 100).count();
        assert!(hot_hits > 8700 && hot_hits < 9300, "hot hits {}", hot_hits);
    }

    #[test]
    fn test_hotspot_tiny_population() {
        let mut rng = Prng::seed_from_u64(4);
        let mut chooser = HotspotChooser::new(1, 0.1, 0.0);
        assert_eq!(chooser.next(&mut rng), 0);
    }

    #[test]
    fn test_hotspot_cold_reachable() {
        let mut rng = Prng::seed_from_u64(4);
        let mut chooser = HotspotChooser::new(10, 0.5, 0.0);
        for _ in 0..100 {
            assert!(chooser.next(&mut rng) >= 5);
        }
    }
}
