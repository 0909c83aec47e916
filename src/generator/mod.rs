//! Request generation
//!
//! A [`Workload`] splits itself into one [`Producer`] per executor thread.
//! Producers are moved onto their threads and pulled from in a tight loop, so
//! everything expensive (key sampling, value arenas, chooser setup) happens
//! when they are built or in [`Producer::prepare`], never in [`Producer::next`].
//!
//! - [`range`] / [`sampling`]: distinct key sampling over an integer range
//! - [`value`]: rotating payload pool with a reserved tombstone
//! - [`phase`]: operation thresholds, budgets and key choosers
//! - [`workload`]: the phased synthetic workload
//! - [`trace`]: recorded request sequences and their replay

pub mod load;
pub mod phase;
pub mod range;
pub mod request;
pub mod sampling;
pub mod trace;
pub mod value;
pub mod workload;

use crate::Result;
pub use load::BulkLoad;
pub use request::{Key, Operation, Request};

/// Source of requests for a single executor
pub trait Producer: Send {
    /// One-time setup on the executor thread, before the start barrier
    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether another request is available
    fn has_next(&self) -> bool;

    /// Next request
    ///
    /// Only valid after `has_next()` returned `true`. The request may borrow
    /// from the producer until the following call.
    fn next(&mut self) -> Request<'_>;
}

/// Something that can be split into per-thread producers
pub trait Workload {
    type Producer: Producer + 'static;

    /// Build `num_producers` independent producers
    fn producers(&self, num_producers: usize) -> Result<Vec<Self::Producer>>;
}

/// Share of `total` assigned to producer `index` out of `num_producers`
///
/// Remainders go to the lowest-numbered producers.
#[inline]
pub(crate) fn share(total: usize, num_producers: usize, index: usize) -> usize {
    total / num_producers + usize::from(index < total % num_producers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_distributes_remainder_low() {
        let shares: Vec<_> = (0..3).map(|i| share(10, 3, i)).collect();
        assert_eq!(shares, vec![4, 3, 3]);
        assert_eq!((0..4).map(|i| share(2, 4, i)).sum::<usize>(), 2);
        assert_eq!(share(0, 2, 0), 0);
    }
}
