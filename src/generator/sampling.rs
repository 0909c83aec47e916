//! Sampling without replacement
//!
//! These routines draw `k` distinct values uniformly from a [`Range`] and write
//! them into a caller-provided slice starting at a given index. They are used to
//! synthesize the key set of a workload: the initial dataset and every key that
//! will be inserted later are drawn in one pass so they never collide.
//!
//! # Algorithms
//!
//! - **Floyd**: expected O(k) time and O(k) memory. Never enumerates the range,
//!   so it wins when `k` is a small fraction of `|R|`. Output follows insertion
//!   order, not numeric order.
//! - **Selection sampling**: one linear pass over the range, O(|R|) time and
//!   O(1) extra memory. Output is ascending. Preferred at high selectivity where
//!   Floyd collides often.
//! - **Fisher-Yates**: partial shuffle of `[min, max]` emulated with a sparse
//!   swap map. O(k) time and memory, output in shuffle order.
//!
//! [`sample_without_replacement`] picks Floyd when the selectivity `k / |R|` is
//! at most [`FLOYD_SELECTIVITY_THRESHOLD`] and selection sampling otherwise.
//!
//! # Preconditions
//!
//! `k <= |R|` and `start_index + k <= dest.len()`. Violations panic: a sampler
//! asked for more values than the range holds means the workload was sized
//! incorrectly.
//!
//! # Example
//!
//! ```
//! use kvpulse::generator::range::Range;
//! use kvpulse::generator::sampling::sample_without_replacement;
//! use rand::SeedableRng;
//! use rand_xoshiro::Xoshiro256PlusPlus;
//!
//! let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
//! let mut keys = vec![0u64; 10];
//! sample_without_replacement(10, &Range::new(0, 999), &mut keys, 0, &mut rng);
//! assert!(keys.iter().all(|k| *k <= 999));
//! ```

use super::range::{Range, RangeInt};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Selectivity at or below which [`sample_without_replacement`] uses Floyd's algorithm
pub const FLOYD_SELECTIVITY_THRESHOLD: f64 = 0.05;

/// Which sampler to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingAlgorithm {
    /// Pick by selectivity (Floyd at or below the threshold, selection above)
    #[default]
    Auto,
    Floyd,
    Selection,
    FisherYates,
}

impl SamplingAlgorithm {
    /// Resolve `Auto` to the concrete algorithm used for `num_samples` out of `range_size`
    pub fn resolve(self, num_samples: usize, range_size: u64) -> SamplingAlgorithm {
        match self {
            SamplingAlgorithm::Auto => {
                let selectivity = num_samples as f64 / range_size as f64;
                if selectivity <= FLOYD_SELECTIVITY_THRESHOLD {
                    SamplingAlgorithm::Floyd
                } else {
                    SamplingAlgorithm::Selection
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for SamplingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingAlgorithm::Auto => write!(f, "auto"),
            SamplingAlgorithm::Floyd => write!(f, "floyd"),
            SamplingAlgorithm::Selection => write!(f, "selection"),
            SamplingAlgorithm::FisherYates => write!(f, "fisher-yates"),
        }
    }
}

#[inline]
fn check_preconditions<T: RangeInt>(num_samples: usize, range: &Range<T>, dest: &[T], start_index: usize) {
    assert!(
        range.size() >= num_samples as u64,
        "Cannot draw {} distinct samples from a range of size {}",
        num_samples,
        range.size()
    );
    assert!(
        start_index + num_samples <= dest.len(),
        "Destination holds {} values but {} samples were requested at index {}",
        dest.len(),
        num_samples,
        start_index
    );
}

#[cfg(debug_assertions)]
fn debug_check_distinct<T: RangeInt>(samples: &[T]) {
    let unique: HashSet<T> = samples.iter().copied().collect();
    debug_assert_eq!(unique.len(), samples.len(), "Sampler produced duplicate values");
}

#[cfg(not(debug_assertions))]
#[inline(always)]
fn debug_check_distinct<T: RangeInt>(_samples: &[T]) {}

/// Floyd's algorithm
///
/// For each `curr` in the last `k` offsets of the range, draw uniformly from
/// `[0, curr]`; on collision take `curr` itself, which cannot already be chosen.
pub fn floyd_sample<T: RangeInt, R: Rng + ?Sized>(
    num_samples: usize,
    range: &Range<T>,
    dest: &mut [T],
    start_index: usize,
    rng: &mut R,
) {
    check_preconditions(num_samples, range, dest, start_index);

    let size = range.size();
    let mut chosen: HashSet<u64> = HashSet::with_capacity(num_samples);
    let mut out = start_index;
    for curr in (size - num_samples as u64)..size {
        let draw = rng.gen_range(0..=curr);
        let offset = if chosen.insert(draw) {
            draw
        } else {
            chosen.insert(curr);
            curr
        };
        dest[out] = range.at_offset(offset);
        out += 1;
    }
    debug_assert_eq!(chosen.len(), num_samples);
    debug_check_distinct(&dest[start_index..start_index + num_samples]);
}

/// Selection sampling (Knuth's Algorithm S)
///
/// Walks the range once, accepting offset `curr` with probability
/// `needed / (size - curr)`.
pub fn selection_sample<T: RangeInt, R: Rng + ?Sized>(
    num_samples: usize,
    range: &Range<T>,
    dest: &mut [T],
    start_index: usize,
    rng: &mut R,
) {
    check_preconditions(num_samples, range, dest, start_index);

    let size = range.size();
    let mut taken = 0usize;
    let mut curr = 0u64;
    while taken < num_samples {
        let u: f64 = rng.gen();
        if (size - curr) as f64 * u < (num_samples - taken) as f64 {
            dest[start_index + taken] = range.at_offset(curr);
            taken += 1;
        }
        curr += 1;
    }
    debug_check_distinct(&dest[start_index..start_index + num_samples]);
}

/// Partial Fisher-Yates shuffle over a virtual array `[0, size)`
///
/// Only displaced positions are stored, so memory stays O(k).
pub fn fisher_yates_sample<T: RangeInt, R: Rng + ?Sized>(
    num_samples: usize,
    range: &Range<T>,
    dest: &mut [T],
    start_index: usize,
    rng: &mut R,
) {
    check_preconditions(num_samples, range, dest, start_index);

    let size = range.size();
    let mut swapped: HashMap<u64, u64> = HashMap::with_capacity(num_samples);
    for i in 0..num_samples as u64 {
        let target = rng.gen_range(i..size);
        let picked = swapped.get(&target).copied().unwrap_or(target);
        dest[start_index + i as usize] = range.at_offset(picked);

        let displaced = swapped.get(&i).copied().unwrap_or(i);
        swapped.insert(target, displaced);
    }
    debug_check_distinct(&dest[start_index..start_index + num_samples]);
}

/// Draw `num_samples` distinct values, choosing the algorithm by selectivity
pub fn sample_without_replacement<T: RangeInt, R: Rng + ?Sized>(
    num_samples: usize,
    range: &Range<T>,
    dest: &mut [T],
    start_index: usize,
    rng: &mut R,
) {
    sample_with(SamplingAlgorithm::Auto, num_samples, range, dest, start_index, rng);
}

/// Draw `num_samples` distinct values with an explicit algorithm
pub fn sample_with<T: RangeInt, R: Rng + ?Sized>(
    algorithm: SamplingAlgorithm,
    num_samples: usize,
    range: &Range<T>,
    dest: &mut [T],
    start_index: usize,
    rng: &mut R,
) {
    assert!(
        range.size() >= num_samples as u64,
        "Cannot draw {} distinct samples from a range of size {}",
        num_samples,
        range.size()
    );
    match algorithm.resolve(num_samples, range.size()) {
        SamplingAlgorithm::Floyd | SamplingAlgorithm::Auto => {
            floyd_sample(num_samples, range, dest, start_index, rng)
        }
        SamplingAlgorithm::Selection => selection_sample(num_samples, range, dest, start_index, rng),
        SamplingAlgorithm::FisherYates => {
            fisher_yates_sample(num_samples, range, dest, start_index, rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    type Sampler = fn(usize, &Range<u64>, &mut [u64], usize, &mut Xoshiro256PlusPlus);

    const SAMPLERS: [(&str, Sampler); 3] = [
        ("floyd", floyd_sample::<u64, Xoshiro256PlusPlus>),
        ("selection", selection_sample::<u64, Xoshiro256PlusPlus>),
        ("fisher_yates", fisher_yates_sample::<u64, Xoshiro256PlusPlus>),
    ];

    fn assert_valid(samples: &[u64], range: &Range<u64>) {
        let unique: HashSet<u64> = samples.iter().copied().collect();
        assert_eq!(unique.len(), samples.len(), "duplicate samples: {:?}", samples);
        assert!(samples.iter().all(|v| range.contains(*v)));
    }

    #[test]
    fn test_samplers_distinct_and_in_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let cases = [(0u64, 0u64, 1usize), (0, 9, 10), (5, 104, 3), (1000, 1999, 500), (0, 1_000_000, 40)];
        for (name, sampler) in SAMPLERS {
            for &(min, max, k) in &cases {
                let range = Range::new(min, max);
                let mut dest = vec![u64::MAX; k];
                sampler(k, &range, &mut dest, 0, &mut rng);
                assert_valid(&dest, &range);
                assert_eq!(dest.len(), k, "{} wrote wrong count", name);
            }
        }
    }

    #[test]
    fn test_samplers_respect_start_index() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let range = Range::new(0u64, 99);
        for (_, sampler) in SAMPLERS {
            let mut dest = vec![u64::MAX; 8];
            sampler(5, &range, &mut dest, 3, &mut rng);
            assert_eq!(&dest[..3], &[u64::MAX; 3]);
            assert_valid(&dest[3..], &range);
        }
    }

    #[test]
    fn test_samplers_zero_samples() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        let range = Range::new(0u64, 9);
        for (_, sampler) in SAMPLERS {
            let mut dest: Vec<u64> = Vec::new();
            sampler(0, &range, &mut dest, 0, &mut rng);
            assert!(dest.is_empty());
        }
    }

    #[test]
    fn test_selection_sample_ascending() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let range = Range::new(0u64, 999);
        let mut dest = vec![0u64; 300];
        selection_sample(300, &range, &mut dest, 0, &mut rng);
        assert!(dest.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_full_range_is_permutation() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let range = Range::new(10u64, 59);
        for (_, sampler) in SAMPLERS {
            let mut dest = vec![0u64; 50];
            sampler(50, &range, &mut dest, 0, &mut rng);
            let mut sorted = dest.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (10..60).collect::<Vec<u64>>());
        }
    }

    #[test]
    fn test_signed_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);
        let range = Range::new(-50i32, 50);
        let mut dest = vec![0i32; 20];
        sample_without_replacement(20, &range, &mut dest, 0, &mut rng);
        let unique: HashSet<i32> = dest.iter().copied().collect();
        assert_eq!(unique.len(), 20);
        assert!(dest.iter().all(|v| (-50..=50).contains(v)));
    }

    #[test]
    fn test_selectivity_dispatch() {
        assert_eq!(SamplingAlgorithm::Auto.resolve(5, 100), SamplingAlgorithm::Floyd);
        assert_eq!(SamplingAlgorithm::Auto.resolve(50, 1000), SamplingAlgorithm::Floyd);
        assert_eq!(SamplingAlgorithm::Auto.resolve(51, 1000), SamplingAlgorithm::Selection);
        assert_eq!(SamplingAlgorithm::Auto.resolve(1000, 1000), SamplingAlgorithm::Selection);
        assert_eq!(SamplingAlgorithm::FisherYates.resolve(1000, 1000), SamplingAlgorithm::FisherYates);
    }

    #[test]
    fn test_dispatch_matches_explicit_algorithm() {
        let range = Range::new(0u64, 9_999);
        for k in [10usize, 500, 501, 5000] {
            let expected = SamplingAlgorithm::Auto.resolve(k, range.size());
            let mut auto = vec![0u64; k];
            let mut explicit = vec![0u64; k];
            sample_without_replacement(k, &range, &mut auto, 0, &mut Xoshiro256PlusPlus::seed_from_u64(21));
            sample_with(expected, k, &range, &mut explicit, 0, &mut Xoshiro256PlusPlus::seed_from_u64(21));
            assert_eq!(auto, explicit);
        }
    }

    #[test]
    fn test_seeded_sampling_is_deterministic() {
        let range = Range::new(0u64, 4_999);
        for (name, sampler) in SAMPLERS {
            let mut first = vec![0u64; 200];
            let mut second = vec![0u64; 200];
            sampler(200, &range, &mut first, 0, &mut Xoshiro256PlusPlus::seed_from_u64(1234));
            sampler(200, &range, &mut second, 0, &mut Xoshiro256PlusPlus::seed_from_u64(1234));
            assert_eq!(first, second, "{} is not deterministic", name);
        }
    }

    /// Pearson chi-square statistic of per-element selection counts against the
    /// uniform expectation `trials * k / n`.
    fn chi_square(sampler: Sampler, n: u64, k: usize, trials: usize, seed: u64) -> f64 {
        let range = Range::new(0u64, n - 1);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut counts = vec![0u64; n as usize];
        let mut dest = vec![0u64; k];
        for _ in 0..trials {
            sampler(k, &range, &mut dest, 0, &mut rng);
            for v in &dest {
                counts[*v as usize] += 1;
            }
        }
        let expected = (trials * k) as f64 / n as f64;
        counts
            .iter()
            .map(|&c| {
                let diff = c as f64 - expected;
                diff * diff / expected
            })
            .sum()
    }

    // 99 degrees of freedom: the 0.9999 quantile of chi-square(99) is about 163.
    const CHI_SQUARE_LIMIT: f64 = 163.0;

    #[test]
    fn test_floyd_uniform_marginals() {
        // k/n = 0.03, the Floyd side of the threshold
        let stat = chi_square(floyd_sample::<u64, Xoshiro256PlusPlus>, 100, 3, 20_000, 99);
        assert!(stat < CHI_SQUARE_LIMIT, "floyd chi-square {} too large", stat);
    }

    #[test]
    fn test_selection_uniform_marginals() {
        // k/n = 0.3, the selection side of the threshold
        let stat = chi_square(selection_sample::<u64, Xoshiro256PlusPlus>, 100, 30, 5_000, 99);
        assert!(stat < CHI_SQUARE_LIMIT, "selection chi-square {} too large", stat);
    }

    #[test]
    fn test_fisher_yates_uniform_marginals() {
        let stat = chi_square(fisher_yates_sample::<u64, Xoshiro256PlusPlus>, 100, 10, 10_000, 99);
        assert!(stat < CHI_SQUARE_LIMIT, "fisher-yates chi-square {} too large", stat);
    }

    #[test]
    #[should_panic(expected = "Cannot draw")]
    fn test_oversized_request_panics() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let mut dest = vec![0u64; 11];
        sample_without_replacement(11, &Range::new(0u64, 9), &mut dest, 0, &mut rng);
    }

    #[test]
    #[should_panic(expected = "Destination holds")]
    fn test_short_destination_panics() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let mut dest = vec![0u64; 4];
        floyd_sample(3, &Range::new(0u64, 99), &mut dest, 2, &mut rng);
    }
}
