//! No-op adapter
//!
//! Every call succeeds immediately and touches nothing. Running a workload
//! against it measures the cost of the harness itself.

use super::{AdapterResult, KvAdapter};
use crate::generator::{BulkLoad, Key};

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAdapter;

impl KvAdapter for NoOpAdapter {
    fn bulk_load(&self, _load: &BulkLoad) -> AdapterResult {
        Ok(())
    }

    #[inline]
    fn put(&self, _key: Key, _value: &[u8]) -> AdapterResult {
        Ok(())
    }

    #[inline]
    fn get(&self, _key: Key, _value_out: &mut Vec<u8>) -> AdapterResult {
        Ok(())
    }

    #[inline]
    fn update(&self, _key: Key, _value: &[u8]) -> AdapterResult {
        Ok(())
    }

    #[inline]
    fn scan(&self, _key: Key, _amount: usize, scan_out: &mut Vec<(Key, Vec<u8>)>) -> AdapterResult {
        scan_out.clear();
        Ok(())
    }

    #[inline]
    fn delete(&self, _key: Key) -> AdapterResult {
        Ok(())
    }
}
