//! Latest chooser
//!
//! Zipfian over recency: index `item_count - 1` (the newest item) is hottest.
//! Because the population grows as inserts land, freshly inserted keys become
//! the most popular ones immediately.

use super::zipf::ZipfianChooser;
use super::{Chooser, Prng};

#[derive(Debug, Clone)]
pub struct LatestChooser {
    zipf: ZipfianChooser,
}

impl LatestChooser {
    pub fn new(item_count: usize, theta: f64) -> Self {
        Self {
            zipf: ZipfianChooser::new(item_count, theta, None),
        }
    }
}

impl Chooser for LatestChooser {
    #[inline]
    fn next(&mut self, rng: &mut Prng) -> usize {
        let rank = self.zipf.next_rank(rng);
        self.zipf.item_count() - 1 - rank
    }

    fn set_item_count(&mut self, item_count: usize) {
        self.zipf.set_item_count(item_count);
    }

    fn increase_item_count_by(&mut self, delta: usize) {
        self.zipf.increase_item_count_by(delta);
    }

    fn item_count(&self) -> usize {
        self.zipf.item_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_latest_favors_newest() {
        let mut rng = Prng::seed_from_u64(6);
        let mut chooser = LatestChooser::new(1000, 0.99);
        let recent = (0..10000).filter(|_| chooser.next(&mut rng) >= 900).count();
        assert!(recent > 5000, "only {} draws hit the newest 10%", recent);
    }

    #[test]
    fn test_latest_follows_growth() {
        let mut rng = Prng::seed_from_u64(6);
        let mut chooser = LatestChooser::new(10, 0.99);
        chooser.increase_item_count_by(90);
        let newest = (0..1000).filter(|_| chooser.next(&mut rng) == 99).count();
        assert!(newest > 100);
    }
}
