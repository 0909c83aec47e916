//! Workload phases
//!
//! A [`Phase`] is one segment of a producer's request stream. It owns the
//! operation thresholds, the remaining request/insert/delete budgets and one
//! optional [`Chooser`] per key-addressed operation (plus one for scan
//! lengths).
//!
//! # Operation selection
//!
//! Proportions are mapped onto the threshold domain `[0, 2^32)`. A uniform
//! `u32` draw selects the first operation (in [`Operation::ALL`] order) whose
//! cumulative threshold exceeds it; inserts take whatever remains.
//!
//! When the drawn operation cannot run (its insert/delete budget is spent or
//! its key population is empty) the same draw is remapped proportionally over
//! the operations that still can, so the configured mix is preserved among
//! them. If nothing can run the phase ends early.

use super::request::Operation;
use crate::distribution::{Chooser, Prng};

/// Phase index within a producer's phase list
pub type PhaseId = usize;

/// Size of the threshold domain (one past the largest `u32`)
pub const THRESHOLD_SCALE: u64 = 1 << 32;

/// Slot in a phase's chooser table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChooserKind {
    Read,
    ReadModifyWrite,
    NegativeRead,
    Scan,
    ScanLength,
    Update,
    Delete,
}

impl ChooserKind {
    pub const COUNT: usize = 7;

    pub const ALL: [ChooserKind; ChooserKind::COUNT] = [
        ChooserKind::Read,
        ChooserKind::ReadModifyWrite,
        ChooserKind::NegativeRead,
        ChooserKind::Scan,
        ChooserKind::ScanLength,
        ChooserKind::Update,
        ChooserKind::Delete,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Key chooser for a key-addressed operation
    pub fn for_operation(op: Operation) -> Option<ChooserKind> {
        match op {
            Operation::Read => Some(ChooserKind::Read),
            Operation::ReadModifyWrite => Some(ChooserKind::ReadModifyWrite),
            Operation::NegativeRead => Some(ChooserKind::NegativeRead),
            Operation::Scan => Some(ChooserKind::Scan),
            Operation::Update => Some(ChooserKind::Update),
            Operation::Delete => Some(ChooserKind::Delete),
            Operation::Insert => None,
        }
    }

    /// Whether the chooser indexes the key population (and so follows its size)
    #[inline]
    pub fn tracks_key_population(self) -> bool {
        self != ChooserKind::ScanLength
    }
}

/// Cumulative operation thresholds over `[0, 2^32]`
///
/// `bounds[i]` is the exclusive upper threshold of `Operation::ALL[i]`; the
/// interval of operation `i` is `[bounds[i - 1], bounds[i])`. The insert bound
/// is always [`THRESHOLD_SCALE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    bounds: [u64; 7],
}

impl Thresholds {
    /// Build thresholds from proportions indexed like [`Operation::ALL`]
    ///
    /// Operations with proportion zero get an empty interval. The last
    /// operation with a non-zero proportion is extended to the end of the
    /// domain so rounding never leaves a sliver for a disabled operation.
    ///
    /// # Panics
    ///
    /// Panics if every proportion is zero or any is negative.
    pub fn from_proportions(proportions: [f64; 7]) -> Self {
        assert!(
            proportions.iter().all(|p| *p >= 0.0),
            "Operation proportions must not be negative: {:?}",
            proportions
        );
        let last_enabled = proportions
            .iter()
            .rposition(|p| *p > 0.0)
            .unwrap_or_else(|| panic!("At least one operation needs a non-zero proportion"));

        let mut bounds = [0u64; 7];
        let mut cumulative = 0.0;
        let mut previous = 0u64;
        for (i, proportion) in proportions.iter().enumerate() {
            cumulative += proportion;
            bounds[i] = if *proportion == 0.0 {
                previous
            } else if i >= last_enabled {
                THRESHOLD_SCALE
            } else {
                ((cumulative * THRESHOLD_SCALE as f64).round() as u64).clamp(previous, THRESHOLD_SCALE)
            };
            previous = bounds[i];
        }
        Self { bounds }
    }

    /// Operation whose interval contains `draw`
    #[inline]
    pub fn select(&self, draw: u32) -> Operation {
        let draw = draw as u64;
        for (i, bound) in self.bounds.iter().enumerate() {
            if draw < *bound {
                return Operation::ALL[i];
            }
        }
        Operation::Insert
    }

    /// Width of `op`'s interval
    #[inline]
    pub fn width(&self, op: Operation) -> u64 {
        let i = op.index();
        let lower = if i == 0 { 0 } else { self.bounds[i - 1] };
        self.bounds[i] - lower
    }
}

/// One phase of a producer's workload
pub struct Phase {
    id: PhaseId,
    thresholds: Thresholds,
    choosers: [Option<Box<dyn Chooser>>; ChooserKind::COUNT],
    num_requests: usize,
    num_requests_left: usize,
    num_inserts: usize,
    num_inserts_left: usize,
    num_deletes: usize,
    num_deletes_left: usize,
    max_scan_length: usize,
}

impl Phase {
    /// Create a phase with the given budgets and no choosers
    pub fn new(id: PhaseId, thresholds: Thresholds, num_requests: usize, num_inserts: usize, num_deletes: usize) -> Self {
        Self {
            id,
            thresholds,
            choosers: Default::default(),
            num_requests,
            num_requests_left: num_requests,
            num_inserts,
            num_inserts_left: num_inserts,
            num_deletes,
            num_deletes_left: num_deletes,
            max_scan_length: 0,
        }
    }

    /// Install the chooser for `kind`
    ///
    /// The scan-length chooser draws from `[0, max_scan_length)` and the draw
    /// is shifted to `1..=max_scan_length`.
    pub fn set_chooser(&mut self, kind: ChooserKind, chooser: Box<dyn Chooser>) {
        if kind == ChooserKind::ScanLength {
            self.max_scan_length = chooser.item_count();
        }
        self.choosers[kind.index()] = Some(chooser);
    }

    pub fn id(&self) -> PhaseId {
        self.id
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn num_requests(&self) -> usize {
        self.num_requests
    }

    pub fn num_requests_left(&self) -> usize {
        self.num_requests_left
    }

    pub fn num_inserts(&self) -> usize {
        self.num_inserts
    }

    pub fn num_inserts_left(&self) -> usize {
        self.num_inserts_left
    }

    pub fn num_deletes(&self) -> usize {
        self.num_deletes
    }

    pub fn num_deletes_left(&self) -> usize {
        self.num_deletes_left
    }

    pub fn max_scan_length(&self) -> usize {
        self.max_scan_length
    }

    /// Chooser installed for `kind`, if any
    pub fn chooser(&self, kind: ChooserKind) -> Option<&dyn Chooser> {
        self.choosers[kind.index()].as_deref()
    }

    /// Whether any requests remain
    #[inline]
    pub fn has_next(&self) -> bool {
        self.num_requests_left > 0
    }

    /// Resize every key chooser to `item_count` (the scan-length chooser is left alone)
    pub fn set_item_count(&mut self, item_count: usize) {
        for kind in ChooserKind::ALL {
            if !kind.tracks_key_population() {
                continue;
            }
            if let Some(chooser) = self.choosers[kind.index()].as_mut() {
                chooser.set_item_count(item_count);
            }
        }
    }

    /// Grow every key chooser by `delta` (the scan-length chooser is left alone)
    pub fn increase_item_count_by(&mut self, delta: usize) {
        for kind in ChooserKind::ALL {
            if !kind.tracks_key_population() {
                continue;
            }
            if let Some(chooser) = self.choosers[kind.index()].as_mut() {
                chooser.increase_item_count_by(delta);
            }
        }
    }

    /// Pick the next operation for the uniform draw `draw` and charge its budget
    ///
    /// Returns `None` (and ends the phase) when no requests remain or no
    /// operation with a non-zero proportion can still run.
    pub fn next_operation(&mut self, draw: u32) -> Option<Operation> {
        if !self.has_next() {
            return None;
        }

        let mut op = self.thresholds.select(draw);
        if !self.can_run(op) {
            match self.remap(draw) {
                Some(remapped) => op = remapped,
                None => {
                    self.num_requests_left = 0;
                    return None;
                }
            }
        }

        self.num_requests_left -= 1;
        match op {
            Operation::Insert => self.num_inserts_left -= 1,
            Operation::Delete => self.num_deletes_left -= 1,
            _ => {}
        }
        Some(op)
    }

    /// Draw a population index for a key-addressed operation
    ///
    /// # Panics
    ///
    /// Panics if the phase has no chooser for `op`.
    #[inline]
    pub fn choose(&mut self, op: Operation, rng: &mut Prng) -> usize {
        let kind = ChooserKind::for_operation(op)
            .unwrap_or_else(|| panic!("{} does not draw from the key population", op));
        match self.choosers[kind.index()].as_mut() {
            Some(chooser) => chooser.next(rng),
            None => panic!("Phase {} has no {} chooser", self.id, op),
        }
    }

    /// Draw a scan length in `1..=max_scan_length`
    ///
    /// # Panics
    ///
    /// Panics if the phase has no scan-length chooser.
    #[inline]
    pub fn next_scan_length(&mut self, rng: &mut Prng) -> usize {
        match self.choosers[ChooserKind::ScanLength.index()].as_mut() {
            Some(chooser) => chooser.next(rng) + 1,
            None => panic!("Phase {} has no scan length chooser", self.id),
        }
    }

    fn is_populated(&self, kind: ChooserKind) -> bool {
        self.chooser(kind).map_or(false, |c| c.item_count() > 0)
    }

    fn can_run(&self, op: Operation) -> bool {
        match op {
            Operation::Insert => self.num_inserts_left > 0,
            Operation::Delete => self.num_deletes_left > 0 && self.is_populated(ChooserKind::Delete),
            Operation::Scan => self.is_populated(ChooserKind::Scan) && self.is_populated(ChooserKind::ScanLength),
            keyed => ChooserKind::for_operation(keyed).map_or(false, |kind| self.is_populated(kind)),
        }
    }

    /// Map `draw` proportionally onto the intervals of the runnable operations
    fn remap(&self, draw: u32) -> Option<Operation> {
        let widths = Operation::ALL.map(|op| if self.can_run(op) { self.thresholds.width(op) } else { 0 });
        let total: u64 = widths.iter().sum();
        if total == 0 {
            return None;
        }

        let target = (draw as u64 * total) >> 32;
        let mut acc = 0;
        for (op, width) in Operation::ALL.iter().zip(widths) {
            acc += width;
            if target < acc {
                return Some(*op);
            }
        }
        None
    }
}

impl std::fmt::Debug for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Phase")
            .field("id", &self.id)
            .field("thresholds", &self.thresholds)
            .field("num_requests_left", &self.num_requests_left)
            .field("num_inserts_left", &self.num_inserts_left)
            .field("num_deletes_left", &self.num_deletes_left)
            .field("max_scan_length", &self.max_scan_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::uniform::UniformChooser;
    use rand::{Rng, SeedableRng};

    fn proportions(pairs: &[(Operation, f64)]) -> [f64; 7] {
        let mut out = [0.0; 7];
        for (op, p) in pairs {
            out[op.index()] = *p;
        }
        out
    }

    fn phase_with(pairs: &[(Operation, f64)], requests: usize, inserts: usize, deletes: usize, keys: usize) -> Phase {
        let mut phase = Phase::new(0, Thresholds::from_proportions(proportions(pairs)), requests, inserts, deletes);
        for (op, _) in pairs {
            if let Some(kind) = ChooserKind::for_operation(*op) {
                phase.set_chooser(kind, Box::new(UniformChooser::new(keys)));
            }
            if *op == Operation::Scan {
                phase.set_chooser(ChooserKind::ScanLength, Box::new(UniformChooser::new(10)));
            }
        }
        phase
    }

    #[test]
    fn test_thresholds_full_read() {
        let t = Thresholds::from_proportions(proportions(&[(Operation::Read, 1.0)]));
        assert_eq!(t.select(0), Operation::Read);
        assert_eq!(t.select(u32::MAX), Operation::Read);
        assert_eq!(t.width(Operation::Read), THRESHOLD_SCALE);
        assert_eq!(t.width(Operation::Insert), 0);
    }

    #[test]
    fn test_thresholds_boundaries() {
        let t = Thresholds::from_proportions(proportions(&[(Operation::Read, 0.5), (Operation::Insert, 0.5)]));
        let half = (THRESHOLD_SCALE / 2) as u32;
        assert_eq!(t.select(half - 1), Operation::Read);
        assert_eq!(t.select(half), Operation::Insert);
        assert_eq!(t.width(Operation::Read), THRESHOLD_SCALE / 2);
    }

    #[test]
    fn test_thresholds_no_sliver_for_disabled_ops() {
        let t = Thresholds::from_proportions(proportions(&[(Operation::Read, 0.3), (Operation::Update, 0.7)]));
        assert_eq!(t.width(Operation::Delete), 0);
        assert_eq!(t.width(Operation::Insert), 0);
        assert_eq!(t.select(u32::MAX), Operation::Update);
    }

    #[test]
    #[should_panic(expected = "non-zero proportion")]
    fn test_thresholds_all_zero_panics() {
        Thresholds::from_proportions([0.0; 7]);
    }

    #[test]
    fn test_mix_follows_proportions() {
        let mut phase = phase_with(&[(Operation::Read, 0.8), (Operation::Update, 0.2)], 100_000, 0, 0, 100);
        let mut rng = Prng::seed_from_u64(21);
        let mut reads = 0;
        while let Some(op) = phase.next_operation(rng.gen()) {
            if op == Operation::Read {
                reads += 1;
            }
        }
        assert!((79_000..81_000).contains(&reads), "reads {}", reads);
        assert!(!phase.has_next());
    }

    #[test]
    fn test_request_budget_consumed() {
        let mut phase = phase_with(&[(Operation::Read, 1.0)], 3, 0, 0, 10);
        assert_eq!(phase.next_operation(0), Some(Operation::Read));
        assert_eq!(phase.num_requests_left(), 2);
        phase.next_operation(0);
        phase.next_operation(0);
        assert!(!phase.has_next());
        assert_eq!(phase.next_operation(0), None);
    }

    #[test]
    fn test_insert_budget_exhaustion_remaps() {
        let mut phase = phase_with(&[(Operation::Read, 0.5), (Operation::Insert, 0.5)], 10, 2, 0, 10);
        let insert_draw = u32::MAX;
        assert_eq!(phase.next_operation(insert_draw), Some(Operation::Insert));
        assert_eq!(phase.next_operation(insert_draw), Some(Operation::Insert));
        assert_eq!(phase.num_inserts_left(), 0);
        // Further insert draws become reads
        assert_eq!(phase.next_operation(insert_draw), Some(Operation::Read));
        assert_eq!(phase.num_requests_left(), 7);
    }

    #[test]
    fn test_phase_ends_when_nothing_can_run() {
        let mut phase = phase_with(&[(Operation::Insert, 1.0)], 5, 2, 0, 0);
        assert_eq!(phase.next_operation(7), Some(Operation::Insert));
        assert_eq!(phase.next_operation(7), Some(Operation::Insert));
        assert_eq!(phase.next_operation(7), None);
        assert!(!phase.has_next());
    }

    #[test]
    fn test_empty_population_defers_to_inserts() {
        let mut phase = phase_with(&[(Operation::Read, 0.5), (Operation::Insert, 0.5)], 4, 2, 0, 0);
        assert_eq!(phase.next_operation(0), Some(Operation::Insert));
        phase.increase_item_count_by(1);
        assert_eq!(phase.next_operation(0), Some(Operation::Read));
    }

    #[test]
    fn test_delete_budget() {
        let mut phase = phase_with(&[(Operation::Read, 0.5), (Operation::Delete, 0.5)], 10, 0, 1, 10);
        assert_eq!(phase.next_operation(u32::MAX), Some(Operation::Delete));
        assert_eq!(phase.num_deletes_left(), 0);
        assert_eq!(phase.next_operation(u32::MAX), Some(Operation::Read));
    }

    #[test]
    fn test_resize_skips_scan_length() {
        let mut phase = phase_with(&[(Operation::Scan, 0.5), (Operation::Read, 0.5)], 10, 0, 0, 100);
        phase.set_item_count(500);
        assert_eq!(phase.chooser(ChooserKind::Read).map(|c| c.item_count()), Some(500));
        assert_eq!(phase.chooser(ChooserKind::Scan).map(|c| c.item_count()), Some(500));
        assert_eq!(phase.chooser(ChooserKind::ScanLength).map(|c| c.item_count()), Some(10));

        phase.increase_item_count_by(5);
        assert_eq!(phase.chooser(ChooserKind::Read).map(|c| c.item_count()), Some(505));
        assert_eq!(phase.chooser(ChooserKind::ScanLength).map(|c| c.item_count()), Some(10));
    }

    #[test]
    fn test_scan_length_range() {
        let mut phase = phase_with(&[(Operation::Scan, 1.0)], 10, 0, 0, 100);
        let mut rng = Prng::seed_from_u64(2);
        for _ in 0..1000 {
            let len = phase.next_scan_length(&mut rng);
            assert!((1..=10).contains(&len));
        }
        assert_eq!(phase.max_scan_length(), 10);
    }

    #[test]
    #[should_panic(expected = "has no read chooser")]
    fn test_missing_chooser_panics() {
        let mut phase = Phase::new(0, Thresholds::from_proportions(proportions(&[(Operation::Read, 1.0)])), 1, 0, 0);
        phase.choose(Operation::Read, &mut Prng::seed_from_u64(1));
    }
}
