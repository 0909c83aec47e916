//! Key-value store adapters
//!
//! An adapter translates the harness's requests into calls on a concrete
//! storage engine. One adapter instance is shared by every executor thread,
//! so implementations must be `Sync` and handle their own synchronization.
//!
//! # Adapters
//!
//! - **Reference**: in-memory ordered map, the correctness baseline
//! - **NoOp**: accepts everything without doing work (measures harness overhead)
//! - **Mock**: counts calls and can inject failures (tests)
//!
//! # Lifecycle
//!
//! 1. [`KvAdapter::bulk_load`] is called once, before any workload runs
//! 2. Each executor thread calls [`KvAdapter::initialize_worker`] before the
//!    start barrier
//! 3. Data operations run concurrently from every executor
//! 4. Each executor calls [`KvAdapter::shutdown_worker`] after its loop exits
//!
//! # Error Handling
//!
//! Data operations return an [`AdapterError`] instead of panicking. The
//! executor counts failures per operation kind and keeps going; a failing
//! request never aborts a run.
//!
//! # Example
//!
//! ```
//! use kvpulse::engine::{KvAdapter, reference::ReferenceAdapter};
//!
//! let store = ReferenceAdapter::new();
//! store.put(1, b"value").unwrap();
//!
//! let mut out = Vec::new();
//! store.get(1, &mut out).unwrap();
//! assert_eq!(out, b"value");
//! ```

pub mod mock;
pub mod noop;
pub mod reference;

use crate::generator::{BulkLoad, Key};
use thiserror::Error;

/// Failure reported by an adapter for a single operation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("key not found")]
    NotFound,

    #[error("conflicting concurrent update")]
    Conflict,

    #[error("engine error: {0}")]
    Engine(String),
}

/// Outcome of a single adapter call
pub type AdapterResult<T = ()> = std::result::Result<T, AdapterError>;

/// Storage-engine interface driven by the executors
pub trait KvAdapter: Send + Sync + 'static {
    /// Per-thread setup, called on the executor thread before the start barrier
    fn initialize_worker(&self, _worker_id: usize) {}

    /// Per-thread teardown, called on the executor thread after its loop exits
    fn shutdown_worker(&self, _worker_id: usize) {}

    /// Insert every record of `load`
    fn bulk_load(&self, load: &BulkLoad) -> AdapterResult;

    /// Insert `key` (or overwrite it if present)
    fn put(&self, key: Key, value: &[u8]) -> AdapterResult;

    /// Read `key` into `value_out`, replacing its contents
    fn get(&self, key: Key, value_out: &mut Vec<u8>) -> AdapterResult;

    /// Overwrite an existing `key`
    fn update(&self, key: Key, value: &[u8]) -> AdapterResult;

    /// Read up to `amount` records starting at the first key `>= key`
    ///
    /// `scan_out` is cleared before it is filled.
    fn scan(&self, key: Key, amount: usize, scan_out: &mut Vec<(Key, Vec<u8>)>) -> AdapterResult;

    /// Remove `key`
    fn delete(&self, key: Key) -> AdapterResult;
}
