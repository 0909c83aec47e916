//! Key choosers
//!
//! A [`Chooser`] draws an index from a population `[0, item_count)` under some
//! distribution. Workload phases own one chooser per operation kind and grow
//! their populations as inserts land, so every chooser supports resizing.
//!
//! # Choosers
//!
//! - **Uniform**: every live item equally likely
//! - **Zipfian**: power law over item rank (optionally scrambled across the key space)
//! - **Hotspot**: a hot prefix of the population receives a fixed share of draws
//! - **Latest**: power law skewed toward the most recently inserted items
//!
//! # Item-count contract
//!
//! Drawing from a chooser whose item count is zero is a precondition violation
//! and panics. Callers must size the population with
//! [`Chooser::set_item_count`] before the first draw.
//!
//! # Example
//!
//! ```
//! use kvpulse::distribution::{Chooser, Prng, uniform::UniformChooser};
//! use rand::SeedableRng;
//!
//! let mut rng = Prng::seed_from_u64(1);
//! let mut chooser = UniformChooser::new(10);
//! assert!(chooser.next(&mut rng) < 10);
//!
//! chooser.increase_item_count_by(5);
//! assert_eq!(chooser.item_count(), 15);
//! ```

use crate::config::workload::DistributionType;

pub mod hotspot;
pub mod latest;
pub mod uniform;
pub mod zipf;

/// Pseudo-random generator used by every chooser and producer
///
/// xoshiro256++ is fast enough for the per-request path and fully seedable,
/// which keeps generated workloads reproducible.
pub type Prng = rand_xoshiro::Xoshiro256PlusPlus;

/// Discrete random selector over a growable population
///
/// Choosers are `Send` so producers can be moved onto worker threads. They are
/// never shared: each producer owns its own set.
pub trait Chooser: Send {
    /// Draw the next index in `[0, item_count)`
    ///
    /// # Panics
    ///
    /// Panics if the item count is zero.
    fn next(&mut self, rng: &mut Prng) -> usize;

    /// Replace the population size
    fn set_item_count(&mut self, item_count: usize);

    /// Grow the population by `delta` items
    fn increase_item_count_by(&mut self, delta: usize);

    /// Current population size
    fn item_count(&self) -> usize;
}

/// Build a boxed chooser for `dist` over `item_count` items
pub fn create_chooser(dist: &DistributionType, item_count: usize) -> Box<dyn Chooser> {
    match *dist {
        DistributionType::Uniform => Box::new(uniform::UniformChooser::new(item_count)),
        DistributionType::Zipfian { theta, salt } => {
            Box::new(zipf::ZipfianChooser::new(item_count, theta, salt))
        }
        DistributionType::Hotspot { hot_fraction, hot_op_fraction } => {
            Box::new(hotspot::HotspotChooser::new(item_count, hot_fraction, hot_op_fraction))
        }
        DistributionType::Latest { theta } => Box::new(latest::LatestChooser::new(item_count, theta)),
    }
}

#[inline(always)]
pub(crate) fn assert_populated(item_count: usize) {
    assert!(item_count > 0, "Cannot draw from a chooser with zero items");
}
