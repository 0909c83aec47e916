//! Zipfian chooser
//!
//! Draws item ranks following a power law: rank `i` (0-based) is chosen with
//! probability proportional to `1 / (i + 1)^theta`. Small ranks are hot.
//!
//! # Algorithm
//!
//! Uses the constant-time method of Gray et al. ("Quickly Generating
//! Billion-Record Synthetic Databases"), the same generator YCSB uses. The only
//! O(n) piece is the generalized harmonic number `zeta(n, theta)`, which is
//! extended incrementally when the population grows, so an insert-heavy phase
//! pays O(1) per new item instead of recomputing from scratch.
//!
//! # Scrambling
//!
//! With a `salt`, ranks are hashed (FNV-1a) across the population so the hot
//! items are scattered over the key space instead of clustered at the front.
//!
//! # Example
//!
//! ```
//! use kvpulse::distribution::{Chooser, Prng, zipf::ZipfianChooser};
//! use rand::SeedableRng;
//!
//! let mut rng = Prng::seed_from_u64(7);
//! let mut chooser = ZipfianChooser::new(1000, 0.99, None);
//! assert!(chooser.next(&mut rng) < 1000);
//! ```

use super::{assert_populated, Chooser, Prng};
use rand::Rng;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Zipfian chooser (Gray et al.)
#[derive(Debug, Clone)]
pub struct ZipfianChooser {
    item_count: usize,
    theta: f64,
    alpha: f64,
    zeta2: f64,
    zeta_n: f64,
    eta: f64,
    salt: Option<u64>,
}

impl ZipfianChooser {
    /// Create a chooser with skew `theta` in `(0, 1)`
    ///
    /// # Panics
    ///
    /// Panics if `theta` is outside `(0, 1)`.
    pub fn new(item_count: usize, theta: f64, salt: Option<u64>) -> Self {
        assert!(theta > 0.0 && theta < 1.0, "Zipfian theta must be in range (0.0, 1.0), got {}", theta);

        let zeta2 = zeta(0, 2, theta, 0.0);
        let zeta_n = zeta(0, item_count, theta, 0.0);
        let mut chooser = Self {
            item_count,
            theta,
            alpha: 1.0 / (1.0 - theta),
            zeta2,
            zeta_n,
            eta: 0.0,
            salt,
        };
        chooser.update_eta();
        chooser
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    fn update_eta(&mut self) {
        let n = self.item_count as f64;
        self.eta = (1.0 - (2.0 / n).powf(1.0 - self.theta)) / (1.0 - self.zeta2 / self.zeta_n);
    }

    /// Unscrambled rank in `[0, item_count)`, 0 being the hottest
    #[inline]
    pub(crate) fn next_rank(&mut self, rng: &mut Prng) -> usize {
        assert_populated(self.item_count);

        let u: f64 = rng.gen();
        let uz = u * self.zeta_n;
        let rank = if uz < 1.0 {
            0
        } else if uz < 1.0 + 0.5f64.powf(self.theta) {
            1
        } else {
            let base = self.eta * u - self.eta + 1.0;
            (self.item_count as f64 * base.powf(self.alpha)) as usize
        };
        rank.min(self.item_count - 1)
    }
}

impl Chooser for ZipfianChooser {
    #[inline]
    fn next(&mut self, rng: &mut Prng) -> usize {
        let rank = self.next_rank(rng);
        match self.salt {
            Some(salt) => (fnv1a(rank as u64 ^ salt) % self.item_count as u64) as usize,
            None => rank,
        }
    }

    fn set_item_count(&mut self, item_count: usize) {
        if item_count >= self.item_count {
            self.increase_item_count_by(item_count - self.item_count);
        } else {
            self.item_count = item_count;
            self.zeta_n = zeta(0, item_count, self.theta, 0.0);
            self.update_eta();
        }
    }

    fn increase_item_count_by(&mut self, delta: usize) {
        if delta == 0 {
            return;
        }
        let new_count = self.item_count + delta;
        self.zeta_n = zeta(self.item_count, new_count, self.theta, self.zeta_n);
        self.item_count = new_count;
        self.update_eta();
    }

    fn item_count(&self) -> usize {
        self.item_count
    }
}

/// `initial + sum(1 / i^theta)` for `i` in `(from, to]`
fn zeta(from: usize, to: usize, theta: f64, initial: f64) -> f64 {
    let mut sum = initial;
    for i in (from + 1)..=to {
        sum += 1.0 / (i as f64).powf(theta);
    }
    sum
}

#[inline]
fn fnv1a(value: u64) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in value.to_le_bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
