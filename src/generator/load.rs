//! Bulk load payload

use super::request::Key;
use super::value::ValueGenerator;
use std::sync::Arc;

/// Initial records handed to an adapter before a workload runs
///
/// Keys are shared with the producers that later address them; values come
/// from a dedicated pool and repeat every `num_values - 1` records.
#[derive(Debug, Clone)]
pub struct BulkLoad {
    keys: Arc<Vec<Key>>,
    values: ValueGenerator,
}

impl BulkLoad {
    pub fn new(keys: Arc<Vec<Key>>, values: ValueGenerator) -> Self {
        Self { keys, values }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Bytes written by loading every record
    pub fn total_bytes(&self) -> u64 {
        (self.keys.len() * self.values.value_size()) as u64
    }

    /// `(key, value)` for every record, in load order
    pub fn iter(&self) -> impl Iterator<Item = (Key, &[u8])> + '_ {
        self.keys
            .iter()
            .enumerate()
            .map(move |(i, key)| (*key, self.values.value_at(i)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Prng;
    use rand::SeedableRng;

    #[test]
    fn test_iter_pairs_keys_with_values() {
        let values = ValueGenerator::new(8, 3, &mut Prng::seed_from_u64(1));
        let load = BulkLoad::new(Arc::new(vec![5, 9, 2]), values);
        let records: Vec<_> = load.iter().collect();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].0, 5);
        assert_eq!(records[2].0, 2);
        // Two cycling slots, so record 2 reuses record 0's payload
        assert_eq!(records[0].1, records[2].1);
        assert_eq!(load.total_bytes(), 24);
        assert!(!load.is_empty());
    }
}
