//! Benchmark session
//!
//! A [`Session`] pairs a thread count with an adapter shared by every
//! executor. Every run follows the same sequence:
//!
//! 1. Split the workload into one producer per thread
//! 2. Spawn one executor per producer; each sets itself up and checks in
//! 3. Once every executor has checked in, start the clock and raise the start flag
//! 4. Optionally stop the executors when the run duration elapses
//! 5. Join every executor, stop the clock and merge the results
//!
//! The reported run time therefore covers the request loops only, never
//! thread creation or producer preparation.
//!
//! An executor that fails or panics raises the stop flag for the others. The
//! session still joins every thread before returning the first error.
//!
//! # Example
//!
//! ```
//! use kvpulse::coordinator::{RunOptions, Session};
//! use kvpulse::engine::reference::ReferenceAdapter;
//! use kvpulse::generator::trace::{Trace, TraceOptions, TraceRecord};
//! use kvpulse::generator::Operation;
//!
//! let records = (0..100)
//!     .map(|key| TraceRecord { op: Operation::Insert, key, scan_amount: 0 })
//!     .collect();
//! let trace = Trace::from_records(records, TraceOptions::default());
//!
//! let session = Session::new(2, ReferenceAdapter::new()).unwrap();
//! let result = session.replay_trace(&trace, &RunOptions::default()).unwrap();
//! assert_eq!(result.counters.inserts.succeeded, 100);
//! assert_eq!(session.adapter().len(), 100);
//! ```

use crate::config::validator::ConfigError;
use crate::config::RunConfig;
use crate::engine::KvAdapter;
use crate::generator::trace::{Trace, TraceWorkload};
use crate::generator::{BulkLoad, Operation, Producer, Workload};
use crate::stats::{ExecutorResult, SessionResult};
use crate::worker::{Executor, Flag};
use crate::Result;
use anyhow::{anyhow, Context};
use crossbeam::channel;
use crossbeam::sync::WaitGroup;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Per-run execution settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Time every Nth request (values below 1 are treated as 1)
    pub latency_sample_period: usize,
    /// Latency samples kept per executor; extra samples are counted as dropped
    pub max_latency_samples: usize,
    /// Stop executors after this long even if requests remain
    pub duration: Option<Duration>,
    /// Pin executor `i` to `pin_to_cores[i % len]` (empty disables pinning)
    pub pin_to_cores: Vec<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            latency_sample_period: 1,
            max_latency_samples: 10_000_000,
            duration: None,
            pin_to_cores: Vec::new(),
        }
    }
}

impl From<&RunConfig> for RunOptions {
    fn from(run: &RunConfig) -> Self {
        Self {
            latency_sample_period: run.latency_sample_period,
            max_latency_samples: run.max_latency_samples,
            duration: run.duration_secs.map(Duration::from_secs),
            pin_to_cores: run.pin_to_cores.clone(),
        }
    }
}

/// Runs workloads on a fixed number of threads against one adapter
pub struct Session<A: KvAdapter> {
    num_threads: usize,
    adapter: Arc<A>,
}

impl<A: KvAdapter> Session<A> {
    /// Create a session that owns `adapter`
    pub fn new(num_threads: usize, adapter: A) -> Result<Self> {
        Self::with_shared(num_threads, Arc::new(adapter))
    }

    /// Create a session around an adapter the caller keeps a handle to
    pub fn with_shared(num_threads: usize, adapter: Arc<A>) -> Result<Self> {
        if num_threads == 0 {
            return Err(ConfigError::ZeroThreads.into());
        }
        let cores = num_cpus::get();
        if num_threads > cores {
            warn!(threads = num_threads, cores, "More executor threads than CPU cores");
        }
        Ok(Self { num_threads, adapter })
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Bulk load `load` on the calling thread and time it
    pub fn load(&self, load: &BulkLoad) -> Result<SessionResult> {
        let started_at = Instant::now();
        let outcome = self.adapter.bulk_load(load);
        let run_time = started_at.elapsed();

        let mut result = ExecutorResult::new(0);
        result.run_time = run_time;
        result
            .counters
            .record_many(Operation::Insert, load.len() as u64, outcome.is_ok());
        if outcome.is_ok() {
            result.counters.write_bytes = load.total_bytes();
        }
        outcome.with_context(|| format!("Bulk load of {} records failed", load.len()))?;

        info!(records = load.len(), elapsed_ms = run_time.as_millis() as u64, "Bulk load complete");
        Ok(SessionResult::merge(vec![result], run_time, started_at))
    }

    /// Run `workload` split across the session's threads
    pub fn run_workload<W: Workload>(&self, workload: &W, options: &RunOptions) -> Result<SessionResult> {
        let producers = workload
            .producers(self.num_threads)
            .context("Failed to build producers")?;
        self.run_producers(producers, options)
    }

    /// Replay `trace`, each thread taking a contiguous slice
    pub fn replay_trace(&self, trace: &Trace, options: &RunOptions) -> Result<SessionResult> {
        self.run_workload(&TraceWorkload::new(trace), options)
    }

    /// Run one executor per producer
    pub fn run_producers<P: Producer + 'static>(&self, producers: Vec<P>, options: &RunOptions) -> Result<SessionResult> {
        if producers.len() != self.num_threads {
            anyhow::bail!(
                "Session has {} threads but received {} producers",
                self.num_threads,
                producers.len()
            );
        }

        let can_start = Arc::new(Flag::new());
        let stop = Arc::new(AtomicBool::new(false));
        let ready = WaitGroup::new();
        // Every executor holds a sender; the channel closes when the last one exits
        let (done_tx, done_rx) = channel::bounded::<()>(0);

        let mut handles = Vec::with_capacity(producers.len());
        for (id, producer) in producers.into_iter().enumerate() {
            let executor = Executor::new(
                id,
                Arc::clone(&self.adapter),
                producer,
                Arc::clone(&can_start),
                Arc::clone(&stop),
                options.clone(),
            );
            let ready = ready.clone();
            let done = done_tx.clone();
            let executor_stop = Arc::clone(&stop);
            let spawned = thread::Builder::new()
                .name(format!("executor-{}", id))
                .spawn(move || {
                    let stop_on_failure = StopOnFailure::new(executor_stop);
                    let result = executor.run(ready);
                    if result.is_ok() {
                        stop_on_failure.disarm();
                    }
                    drop(done);
                    result
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Release the executors already waiting so they exit immediately
                    stop.store(true, Ordering::SeqCst);
                    can_start.raise();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(e).context(format!("Failed to spawn executor {}", id));
                }
            }
        }
        drop(done_tx);

        ready.wait();
        debug!(executors = handles.len(), "All executors ready");
        let started_at = Instant::now();
        can_start.raise();

        if let Some(limit) = options.duration {
            channel::select! {
                recv(done_rx) -> _ => {}
                recv(channel::after(limit)) -> _ => {
                    stop.store(true, Ordering::Relaxed);
                    debug!(limit_ms = limit.as_millis() as u64, "Run duration elapsed, stopping executors");
                }
            }
        }

        let mut per_executor = Vec::with_capacity(handles.len());
        let mut first_error = None;
        // Join every executor even after a failure so none outlives the run
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok(result)) => per_executor.push(result),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(_) => {
                    first_error.get_or_insert_with(|| anyhow!("Executor {} panicked", id));
                }
            }
        }
        let run_time = started_at.elapsed();
        if let Some(e) = first_error {
            return Err(e);
        }

        let result = SessionResult::merge(per_executor, run_time, started_at);
        info!(
            threads = self.num_threads,
            requests = result.total_requests(),
            failed = result.counters.total_failed(),
            elapsed_ms = run_time.as_millis() as u64,
            "Run complete"
        );
        Ok(result)
    }
}

/// Raises the shared stop flag unless disarmed, including while unwinding
struct StopOnFailure {
    stop: Option<Arc<AtomicBool>>,
}

impl StopOnFailure {
    fn new(stop: Arc<AtomicBool>) -> Self {
        Self { stop: Some(stop) }
    }

    fn disarm(mut self) {
        self.stop = None;
    }
}

impl Drop for StopOnFailure {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop.store(true, Ordering::SeqCst);
        }
    }
}
