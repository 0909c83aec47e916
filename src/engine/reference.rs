//! Reference adapter
//!
//! An ordered in-memory map behind a reader-writer lock. Slow under write
//! contention, but its behavior is easy to reason about, which makes it the
//! baseline the other adapters are checked against.

use super::{AdapterError, AdapterResult, KvAdapter};
use crate::generator::{BulkLoad, Key};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory ordered key-value store
#[derive(Debug, Default)]
pub struct ReferenceAdapter {
    map: RwLock<BTreeMap<Key, Vec<u8>>>,
}

impl ReferenceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: Key) -> bool {
        self.read().map(|m| m.contains_key(&key)).unwrap_or(false)
    }

    fn read(&self) -> AdapterResult<RwLockReadGuard<'_, BTreeMap<Key, Vec<u8>>>> {
        self.map
            .read()
            .map_err(|_| AdapterError::Engine("reference store lock poisoned".into()))
    }

    fn write(&self) -> AdapterResult<RwLockWriteGuard<'_, BTreeMap<Key, Vec<u8>>>> {
        self.map
            .write()
            .map_err(|_| AdapterError::Engine("reference store lock poisoned".into()))
    }
}

impl KvAdapter for ReferenceAdapter {
    fn bulk_load(&self, load: &BulkLoad) -> AdapterResult {
        let mut map = self.write()?;
        for (key, value) in load.iter() {
            map.insert(key, value.to_vec());
        }
        Ok(())
    }

    fn put(&self, key: Key, value: &[u8]) -> AdapterResult {
        self.write()?.insert(key, value.to_vec());
        Ok(())
    }

    fn get(&self, key: Key, value_out: &mut Vec<u8>) -> AdapterResult {
        let map = self.read()?;
        let value = map.get(&key).ok_or(AdapterError::NotFound)?;
        value_out.clear();
        value_out.extend_from_slice(value);
        Ok(())
    }

    fn update(&self, key: Key, value: &[u8]) -> AdapterResult {
        let mut map = self.write()?;
        let slot = map.get_mut(&key).ok_or(AdapterError::NotFound)?;
        slot.clear();
        slot.extend_from_slice(value);
        Ok(())
    }

    fn scan(&self, key: Key, amount: usize, scan_out: &mut Vec<(Key, Vec<u8>)>) -> AdapterResult {
        scan_out.clear();
        let map = self.read()?;
        scan_out.extend(map.range(key..).take(amount).map(|(k, v)| (*k, v.clone())));
        Ok(())
    }

    fn delete(&self, key: Key) -> AdapterResult {
        self.write()?.remove(&key).map(|_| ()).ok_or(AdapterError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Prng;
    use crate::generator::value::ValueGenerator;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[test]
    fn test_put_get_update_delete() {
        let store = ReferenceAdapter::new();
        let mut out = Vec::new();

        assert_eq!(store.get(1, &mut out), Err(AdapterError::NotFound));
        assert_eq!(store.update(1, b"x"), Err(AdapterError::NotFound));

        store.put(1, b"first").unwrap();
        store.get(1, &mut out).unwrap();
        assert_eq!(out, b"first");

        store.update(1, b"second").unwrap();
        store.get(1, &mut out).unwrap();
        assert_eq!(out, b"second");

        store.delete(1).unwrap();
        assert!(!store.contains(1));
        assert_eq!(store.delete(1), Err(AdapterError::NotFound));
    }

    #[test]
    fn test_scan_is_ordered_and_bounded() {
        let store = ReferenceAdapter::new();
        for key in [50, 10, 40, 20, 30] {
            store.put(key, &key.to_le_bytes()).unwrap();
        }
        let mut out = Vec::new();
        store.scan(15, 3, &mut out).unwrap();
        let keys: Vec<_> = out.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![20, 30, 40]);

        store.scan(45, 10, &mut out).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_bulk_load() {
        let values = ValueGenerator::new(8, 4, &mut Prng::seed_from_u64(1));
        let load = BulkLoad::new(Arc::new(vec![3, 1, 2]), values);
        let store = ReferenceAdapter::new();
        store.bulk_load(&load).unwrap();
        assert_eq!(store.len(), 3);
        let mut out = Vec::new();
        store.get(2, &mut out).unwrap();
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn test_concurrent_puts() {
        let store = Arc::new(ReferenceAdapter::new());
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.put(t * 1000 + i, b"v").unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.len(), 400);
    }
}
