//! Phased synthetic workload
//!
//! # Key layout
//!
//! At construction the workload draws `num_records + total_inserts` distinct
//! keys from the configured range and shuffles them. The first `num_records`
//! form the bulk-loaded population shared by every producer; the remainder is
//! cut into disjoint, contiguous slices, one per producer, consumed in order
//! by that producer's inserts. Two producers therefore never insert the same
//! key and no insert ever collides with a loaded key.
//!
//! # Key addressing
//!
//! A producer's population is its loaded keys followed by the keys it has
//! inserted so far. Choosers draw an index into that population; indices
//! below the loaded count map to the shared loaded keys, the rest to the
//! producer's own inserts. Deletes do not shrink the population.
//!
//! # Per-thread budgets
//!
//! Each phase's request, insert and delete totals are split across producers
//! with remainders going to the lowest-numbered producers.

use super::phase::{ChooserKind, Phase, Thresholds};
use super::request::{Key, Operation, Request, NEGATIVE_KEY_BIT};
use super::sampling::sample_with;
use super::value::ValueGenerator;
use super::{share, BulkLoad, Producer, Workload};
use crate::config::{PhaseConfig, WorkloadConfig};
use crate::config::validator::validate_workload;
use crate::distribution::uniform::UniformChooser;
use crate::distribution::{create_chooser, Prng};
use crate::Result;
use anyhow::Context;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::debug;

/// Seed offset for the bulk-load value pool
const LOAD_STREAM: u64 = 0x4c4f_4144;

/// Multi-phase synthetic workload
#[derive(Debug, Clone)]
pub struct PhasedWorkload {
    config: WorkloadConfig,
    seed: u64,
    loaded_keys: Arc<Vec<Key>>,
    insert_keys: Arc<Vec<Key>>,
}

impl PhasedWorkload {
    /// Validate `config` and sample the key population
    pub fn new(config: WorkloadConfig, seed: u64) -> Result<Self> {
        validate_workload(&config).context("Invalid workload configuration")?;

        let num_records = config.load.num_records;
        let needed = num_records + config.total_inserts();
        let mut rng = Prng::seed_from_u64(seed);
        let mut keys = vec![0; needed];
        sample_with(config.load.sampling, needed, &config.load.key_range, &mut keys, 0, &mut rng);
        keys.shuffle(&mut rng);
        let insert_keys = keys.split_off(num_records);

        debug!(
            num_records,
            num_inserts = insert_keys.len(),
            key_range = %config.load.key_range,
            sampling = %config.load.sampling,
            "Sampled workload keys"
        );

        Ok(Self {
            config,
            seed,
            loaded_keys: Arc::new(keys),
            insert_keys: Arc::new(insert_keys),
        })
    }

    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Keys present after the bulk load
    pub fn loaded_keys(&self) -> &[Key] {
        &self.loaded_keys
    }

    /// Records to bulk load before running
    pub fn bulk_load(&self) -> BulkLoad {
        let mut rng = Prng::seed_from_u64(self.seed ^ LOAD_STREAM);
        let values = ValueGenerator::new(self.config.value.size, self.config.value.num_values, &mut rng);
        BulkLoad::new(Arc::clone(&self.loaded_keys), values)
    }

    fn build_phase(&self, id: usize, config: &PhaseConfig, num_producers: usize, index: usize) -> Phase {
        let proportions = Operation::ALL.map(|op| config.proportion(op));
        let mut phase = Phase::new(
            id,
            Thresholds::from_proportions(proportions),
            share(config.num_requests, num_producers, index),
            share(config.insert_count(), num_producers, index),
            share(config.delete_count(), num_producers, index),
        );

        for op in Operation::KEYED {
            if config.proportion(op) <= 0.0 {
                continue;
            }
            let (Some(kind), Some(dist)) = (ChooserKind::for_operation(op), config.distribution(op)) else {
                continue;
            };
            // Sized for real when the phase becomes active
            phase.set_chooser(kind, create_chooser(dist, 0));
        }
        if let Some(scan) = config.scan.as_ref().filter(|s| s.proportion > 0.0) {
            phase.set_chooser(ChooserKind::ScanLength, Box::new(UniformChooser::new(scan.max_length)));
        }
        phase
    }
}

impl Workload for PhasedWorkload {
    type Producer = PhasedProducer;

    fn producers(&self, num_producers: usize) -> Result<Vec<PhasedProducer>> {
        if num_producers == 0 {
            anyhow::bail!("Cannot split a workload across zero producers");
        }

        let mut producers = Vec::with_capacity(num_producers);
        let mut insert_offset = 0;
        for index in 0..num_producers {
            let phases: Vec<Phase> = self
                .config
                .phases
                .iter()
                .enumerate()
                .map(|(id, phase)| self.build_phase(id, phase, num_producers, index))
                .collect();
            let num_inserts: usize = phases.iter().map(Phase::num_inserts).sum();

            let mut rng = Prng::seed_from_u64(producer_seed(self.seed, index));
            let values = ValueGenerator::new(self.config.value.size, self.config.value.num_values, &mut rng);
            producers.push(PhasedProducer {
                id: index,
                phases,
                current: 0,
                loaded: Arc::clone(&self.loaded_keys),
                inserts: Arc::clone(&self.insert_keys),
                insert_start: insert_offset,
                inserted: 0,
                values,
                rng,
                pending: None,
            });
            insert_offset += num_inserts;
        }
        debug_assert_eq!(insert_offset, self.insert_keys.len());

        Ok(producers)
    }
}

/// Independent per-producer seed stream
fn producer_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add((index as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

/// What a resolved request writes
#[derive(Debug, Clone, Copy)]
enum Payload {
    None,
    Next,
    Tombstone,
}

/// Producer for one thread of a [`PhasedWorkload`]
///
/// The next operation is drawn one request ahead so that `has_next` is exact
/// even when a phase ends early because nothing in its mix can still run.
pub struct PhasedProducer {
    id: usize,
    phases: Vec<Phase>,
    current: usize,
    loaded: Arc<Vec<Key>>,
    inserts: Arc<Vec<Key>>,
    insert_start: usize,
    inserted: usize,
    values: ValueGenerator,
    rng: Prng,
    pending: Option<Operation>,
}

impl PhasedProducer {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Keys this producer can currently address
    #[inline]
    pub fn live_keys(&self) -> usize {
        self.loaded.len() + self.inserted
    }

    /// Keys inserted by this producer so far
    pub fn inserted_keys(&self) -> &[Key] {
        &self.inserts[self.insert_start..self.insert_start + self.inserted]
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    #[inline]
    fn key_at(&self, index: usize) -> Key {
        match index.checked_sub(self.loaded.len()) {
            None => self.loaded[index],
            Some(own) => self.inserts[self.insert_start + own],
        }
    }

    /// Draw the next operation, moving through phases as they run dry
    fn advance(&mut self) -> Option<Operation> {
        loop {
            let phase = self.phases.get_mut(self.current)?;
            if phase.has_next() {
                if let Some(op) = phase.next_operation(self.rng.gen()) {
                    return Some(op);
                }
                continue;
            }

            self.current += 1;
            let live = self.live_keys();
            if let Some(next) = self.phases.get_mut(self.current) {
                next.set_item_count(live);
                debug!(producer = self.id, phase = self.current, live_keys = live, "Entering phase");
            }
        }
    }

    /// Key, scan length and payload kind for `op`
    fn resolve(&mut self, op: Operation) -> (Key, usize, Payload) {
        let phase = &mut self.phases[self.current];
        match op {
            Operation::Insert => {
                let key = self.inserts[self.insert_start + self.inserted];
                self.inserted += 1;
                phase.increase_item_count_by(1);
                (key, 0, Payload::Next)
            }
            Operation::Scan => {
                let index = phase.choose(op, &mut self.rng);
                let amount = phase.next_scan_length(&mut self.rng);
                (self.key_at(index), amount, Payload::None)
            }
            keyed => {
                let index = phase.choose(keyed, &mut self.rng);
                let key = self.key_at(index);
                match keyed {
                    Operation::NegativeRead => (key | NEGATIVE_KEY_BIT, 0, Payload::None),
                    Operation::Delete => (key, 0, Payload::Tombstone),
                    Operation::Update | Operation::ReadModifyWrite => (key, 0, Payload::Next),
                    _ => (key, 0, Payload::None),
                }
            }
        }
    }
}

impl Producer for PhasedProducer {
    fn prepare(&mut self) -> Result<()> {
        self.current = 0;
        let live = self.live_keys();
        if let Some(first) = self.phases.first_mut() {
            first.set_item_count(live);
        }
        self.pending = self.advance();
        Ok(())
    }

    #[inline]
    fn has_next(&self) -> bool {
        self.pending.is_some()
    }

    fn next(&mut self) -> Request<'_> {
        let op = match self.pending.take() {
            Some(op) => op,
            None => panic!("next() called on exhausted producer {}", self.id),
        };
        let (key, scan_amount, payload) = self.resolve(op);
        self.pending = self.advance();

        let value = match payload {
            Payload::None => &[][..],
            Payload::Next => self.values.next_value(),
            Payload::Tombstone => self.values.last_value(),
        };
        Request::new(op, key, value, scan_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::HashSet;

    fn workload(toml: &str, seed: u64) -> PhasedWorkload {
        let config: Config = ::toml::from_str(toml).unwrap();
        PhasedWorkload::new(config.workload, seed).unwrap()
    }

    const READ_INSERT: &str = r#"
        [load]
        num_records = 100
        key_range = { min = 0, max = 9999 }

        [[phases]]
        num_requests = 1000
        read = { proportion = 0.8 }
        insert = { proportion = 0.2 }

        [[phases]]
        num_requests = 500
        update = { proportion = 0.5, distribution = { type = "zipfian", theta = 0.9 } }
        scan = { proportion = 0.5, max_length = 8 }
    "#;

    fn drain(producer: &mut PhasedProducer) -> Vec<(Operation, Key, usize, usize)> {
        producer.prepare().unwrap();
        let mut out = Vec::new();
        while producer.has_next() {
            let r = producer.next();
            out.push((r.op, r.key, r.value.len(), r.scan_amount));
        }
        out
    }

    #[test]
    fn test_key_pools_are_disjoint() {
        let w = workload(READ_INSERT, 1);
        assert_eq!(w.loaded_keys().len(), 100);
        assert_eq!(w.insert_keys.len(), 200);
        let loaded: HashSet<_> = w.loaded_keys().iter().collect();
        assert!(w.insert_keys.iter().all(|k| !loaded.contains(k)));
        assert!(w.loaded_keys().iter().all(|k| *k <= 9999));
    }

    #[test]
    fn test_producers_split_budgets() {
        let w = workload(READ_INSERT, 2);
        let mut producers = w.producers(3).unwrap();
        let mut total = 0;
        let mut all_inserted = HashSet::new();
        for p in producers.iter_mut() {
            let requests = drain(p);
            total += requests.len();
            for key in p.inserted_keys() {
                assert!(all_inserted.insert(*key), "key {} inserted twice", key);
            }
        }
        assert_eq!(total, 1500);
        // Insert draws beyond a producer's budget are remapped, short ones leave keys unused
        assert!(all_inserted.len() <= 200 && all_inserted.len() > 150, "{} inserts", all_inserted.len());
        assert_eq!(producers[0].phases()[0].num_requests(), 334);
        assert_eq!(producers[2].phases()[0].num_requests(), 333);
    }

    #[test]
    fn test_requests_address_live_keys() {
        let w = workload(READ_INSERT, 3);
        let mut producer = w.producers(1).unwrap().remove(0);
        let requests = drain(&mut producer);
        let mut live: HashSet<Key> = w.loaded_keys().iter().copied().collect();
        for (op, key, value_len, scan) in requests {
            match op {
                Operation::Insert => {
                    assert!(live.insert(key));
                    assert_eq!(value_len, 16);
                }
                Operation::Read => assert!(live.contains(&key)),
                Operation::Update => {
                    assert!(live.contains(&key));
                    assert_eq!(value_len, 16);
                }
                Operation::Scan => {
                    assert!(live.contains(&key));
                    assert!((1..=8).contains(&scan));
                    assert_eq!(value_len, 0);
                }
                other => panic!("unexpected {}", other),
            }
        }
        assert_eq!(live.len(), 100 + producer.inserted_keys().len());
    }

    #[test]
    fn test_same_seed_same_stream() {
        let a = drain(&mut workload(READ_INSERT, 9).producers(2).unwrap().remove(1));
        let b = drain(&mut workload(READ_INSERT, 9).producers(2).unwrap().remove(1));
        assert_eq!(a, b);
        let c = drain(&mut workload(READ_INSERT, 10).producers(2).unwrap().remove(1));
        assert_ne!(a, c);
    }

    #[test]
    fn test_negative_reads_and_deletes() {
        let w = workload(
            r#"
            [load]
            num_records = 50
            key_range = { min = 0, max = 999 }

            [[phases]]
            num_requests = 200
            negative_read = { proportion = 0.5 }
            delete = { proportion = 0.5 }
            "#,
            4,
        );
        let loaded: HashSet<_> = w.loaded_keys().iter().copied().collect();
        let mut producer = w.producers(1).unwrap().remove(0);
        producer.prepare().unwrap();
        let tombstone = producer.values.last_value().to_vec();
        let mut deletes = 0;
        while producer.has_next() {
            let r = producer.next();
            match r.op {
                Operation::NegativeRead => {
                    assert_ne!(r.key & NEGATIVE_KEY_BIT, 0);
                    assert!(loaded.contains(&(r.key & !NEGATIVE_KEY_BIT)));
                }
                Operation::Delete => {
                    deletes += 1;
                    assert_eq!(r.value, &tombstone[..]);
                }
                other => panic!("unexpected {}", other),
            }
        }
        assert!(deletes <= 100 && deletes > 70, "{} deletes", deletes);
    }

    #[test]
    fn test_insert_only_then_read_without_load() {
        let w = workload(
            r#"
            [load]
            num_records = 0
            key_range = { min = 0, max = 999 }

            [[phases]]
            num_requests = 10
            insert = { proportion = 1.0 }

            [[phases]]
            num_requests = 10
            read = { proportion = 1.0 }
            "#,
            5,
        );
        let mut producer = w.producers(1).unwrap().remove(0);
        let requests = drain(&mut producer);
        assert_eq!(requests.len(), 20);
        let inserted: HashSet<_> = producer.inserted_keys().iter().copied().collect();
        for (op, key, _, _) in &requests[10..] {
            assert_eq!(*op, Operation::Read);
            assert!(inserted.contains(key));
        }
    }

    #[test]
    fn test_zero_producers_rejected() {
        assert!(workload(READ_INSERT, 1).producers(0).is_err());
    }

    #[test]
    fn test_bulk_load_matches_loaded_keys() {
        let w = workload(READ_INSERT, 6);
        let load = w.bulk_load();
        assert_eq!(load.keys(), w.loaded_keys());
        assert!(load.iter().all(|(_, v)| v.len() == 16));
    }
}
