//! Mock adapter for testing
//!
//! Counts every call, remembers when the first data operation arrived and can
//! be told to fail. Used to check executor and session behavior without a real
//! store behind them.
//!
//! # Example
//!
//! ```
//! use kvpulse::engine::{KvAdapter, mock::MockAdapter};
//! use kvpulse::generator::Operation;
//!
//! let adapter = MockAdapter::new();
//! adapter.put(1, b"v").unwrap();
//! assert_eq!(adapter.calls(Operation::Insert), 1);
//!
//! adapter.set_should_fail(true);
//! assert!(adapter.delete(1).is_err());
//! ```

use super::{AdapterError, AdapterResult, KvAdapter};
use crate::generator::{BulkLoad, Key, Operation};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Call-counting adapter
#[derive(Debug, Default)]
pub struct MockAdapter {
    calls: [AtomicU64; 7],
    loaded: AtomicU64,
    should_fail: AtomicBool,
    first_call: Mutex<Option<Instant>>,
    initialized: Mutex<HashSet<usize>>,
    shut_down: Mutex<HashSet<usize>>,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent data operation fail with [`AdapterError::Engine`]
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Data operations of kind `op` received so far
    ///
    /// A read-modify-write issues a get and an update, counted as a read and
    /// an update here.
    pub fn calls(&self, op: Operation) -> u64 {
        self.calls[op.index()].load(Ordering::SeqCst)
    }

    /// Data operations of every kind
    pub fn total_calls(&self) -> u64 {
        self.calls.iter().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    /// Records received through `bulk_load`
    pub fn loaded_records(&self) -> u64 {
        self.loaded.load(Ordering::SeqCst)
    }

    /// When the first data operation arrived
    pub fn first_call(&self) -> Option<Instant> {
        *self.first_call.lock().unwrap()
    }

    /// Worker ids that went through `initialize_worker`
    pub fn initialized_workers(&self) -> HashSet<usize> {
        self.initialized.lock().unwrap().clone()
    }

    /// Worker ids that went through `shutdown_worker`
    pub fn shut_down_workers(&self) -> HashSet<usize> {
        self.shut_down.lock().unwrap().clone()
    }

    fn record(&self, op: Operation) -> AdapterResult {
        {
            let mut first = self.first_call.lock().unwrap();
            if first.is_none() {
                *first = Some(Instant::now());
            }
        }
        self.calls[op.index()].fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            Err(AdapterError::Engine("mock failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KvAdapter for MockAdapter {
    fn initialize_worker(&self, worker_id: usize) {
        self.initialized.lock().unwrap().insert(worker_id);
    }

    fn shutdown_worker(&self, worker_id: usize) {
        self.shut_down.lock().unwrap().insert(worker_id);
    }

    fn bulk_load(&self, load: &BulkLoad) -> AdapterResult {
        self.loaded.fetch_add(load.len() as u64, Ordering::SeqCst);
        Ok(())
    }

    fn put(&self, _key: Key, _value: &[u8]) -> AdapterResult {
        self.record(Operation::Insert)
    }

    fn get(&self, _key: Key, value_out: &mut Vec<u8>) -> AdapterResult {
        value_out.clear();
        self.record(Operation::Read)
    }

    fn update(&self, _key: Key, _value: &[u8]) -> AdapterResult {
        self.record(Operation::Update)
    }

    fn scan(&self, _key: Key, _amount: usize, scan_out: &mut Vec<(Key, Vec<u8>)>) -> AdapterResult {
        scan_out.clear();
        self.record(Operation::Scan)
    }

    fn delete(&self, _key: Key) -> AdapterResult {
        self.record(Operation::Delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_counts_calls() {
        let adapter = MockAdapter::new();
        assert!(adapter.first_call().is_none());
        adapter.put(1, b"v").unwrap();
        adapter.get(1, &mut Vec::new()).unwrap();
        adapter.get(2, &mut Vec::new()).unwrap();
        assert_eq!(adapter.calls(Operation::Insert), 1);
        assert_eq!(adapter.calls(Operation::Read), 2);
        assert_eq!(adapter.total_calls(), 3);
        assert!(adapter.first_call().is_some());
    }

    #[test]
    fn test_mock_failure_injection() {
        let adapter = MockAdapter::new();
        adapter.set_should_fail(true);
        assert_eq!(adapter.update(1, b"v"), Err(AdapterError::Engine("mock failure".into())));
        adapter.set_should_fail(false);
        assert!(adapter.update(1, b"v").is_ok());
    }

    #[test]
    fn test_mock_worker_hooks() {
        let adapter = MockAdapter::new();
        adapter.initialize_worker(0);
        adapter.initialize_worker(1);
        adapter.shutdown_worker(1);
        assert_eq!(adapter.initialized_workers().len(), 2);
        assert!(adapter.shut_down_workers().contains(&1));
    }
}
