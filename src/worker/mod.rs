//! Executors
//!
//! An [`Executor`] drives one producer against the shared adapter on its own
//! thread. Its life has two halves:
//!
//! 1. **Setup** (not measured): optional CPU pinning, adapter per-thread
//!    initialization and [`Producer::prepare`]. The executor then signals the
//!    session that it is ready and blocks on the start [`Flag`].
//! 2. **Request loop**: pull requests until the producer runs dry or the stop
//!    flag is set, dispatch each one to the adapter and count the outcome.
//!
//! # Latency sampling
//!
//! Only every `latency_sample_period`-th request is timed, so a run of `N`
//! requests yields `floor(N / period)` samples. Untimed requests skip the
//! clock reads entirely.
//!
//! # Failures
//!
//! Adapter errors are counted per operation kind and never stop the loop. A
//! negative read succeeds when the adapter reports the key as not found.

pub mod affinity;
pub mod flag;

pub use flag::Flag;

use crate::coordinator::RunOptions;
use crate::engine::{AdapterError, KvAdapter};
use crate::generator::{Key, Operation, Producer, Request};
use crate::stats::{ExecutorResult, OperationCounters};
use crate::Result;
use anyhow::Context;
use crossbeam::sync::WaitGroup;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Buffers reused across requests so reads and scans do not allocate per call
#[derive(Debug, Default)]
struct Scratch {
    value: Vec<u8>,
    scan: Vec<(Key, Vec<u8>)>,
}

/// Single-threaded request loop for one producer
pub struct Executor<A: KvAdapter, P: Producer> {
    id: usize,
    adapter: Arc<A>,
    producer: P,
    can_start: Arc<Flag>,
    stop: Arc<AtomicBool>,
    options: RunOptions,
}

impl<A: KvAdapter, P: Producer> Executor<A, P> {
    pub fn new(
        id: usize,
        adapter: Arc<A>,
        producer: P,
        can_start: Arc<Flag>,
        stop: Arc<AtomicBool>,
        options: RunOptions,
    ) -> Self {
        Self {
            id,
            adapter,
            producer,
            can_start,
            stop,
            options,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Set up, wait for the start flag, then run the request loop
    ///
    /// `ready` is dropped once setup is done; the session waits on its
    /// [`WaitGroup`] before raising the start flag.
    pub fn run(mut self, ready: WaitGroup) -> Result<ExecutorResult> {
        if let Some(core) = affinity::core_for_worker(&self.options.pin_to_cores, self.id) {
            affinity::pin_current_thread(core)
                .with_context(|| format!("Executor {} could not be pinned", self.id))?;
        }

        self.adapter.initialize_worker(self.id);
        if let Err(e) = self.producer.prepare() {
            self.adapter.shutdown_worker(self.id);
            return Err(e).with_context(|| format!("Executor {} failed to prepare its producer", self.id));
        }

        drop(ready);
        self.can_start.wait();

        let result = self.workload_loop();
        self.adapter.shutdown_worker(self.id);

        debug!(
            worker = self.id,
            requests = result.counters.total_requests(),
            failed = result.counters.total_failed(),
            samples = result.latency_samples.len(),
            run_time_ms = result.run_time.as_millis() as u64,
            "Executor finished"
        );
        Ok(result)
    }

    /// The request loop on its own, without setup or the start barrier
    pub fn workload_loop(&mut self) -> ExecutorResult {
        let adapter = &*self.adapter;
        let stop = &*self.stop;
        let producer = &mut self.producer;
        let period = self.options.latency_sample_period.max(1);
        let max_samples = self.options.max_latency_samples;

        let mut result = ExecutorResult::new(self.id);
        let mut scratch = Scratch::default();
        let mut until_sample = period;

        let started = Instant::now();
        while producer.has_next() {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            let request = producer.next();

            until_sample -= 1;
            let succeeded = if until_sample == 0 {
                until_sample = period;
                let began = Instant::now();
                let succeeded = execute(adapter, &request, &mut scratch, &mut result.counters);
                let latency = began.elapsed();
                if result.latency_samples.len() < max_samples {
                    result.latency_samples.push(latency);
                } else {
                    result.dropped_samples += 1;
                }
                succeeded
            } else {
                execute(adapter, &request, &mut scratch, &mut result.counters)
            };
            result.counters.record(request.op, succeeded);
        }
        result.run_time = started.elapsed();
        result
    }
}

/// Dispatch one request and account for the bytes it moved
#[inline]
fn execute<A: KvAdapter>(
    adapter: &A,
    request: &Request<'_>,
    scratch: &mut Scratch,
    counters: &mut OperationCounters,
) -> bool {
    let key = request.key;
    let succeeded = match request.op {
        Operation::Read => {
            let found = adapter.get(key, &mut scratch.value).is_ok();
            if found {
                counters.read_bytes += scratch.value.len() as u64;
            }
            found
        }
        Operation::NegativeRead => matches!(adapter.get(key, &mut scratch.value), Err(AdapterError::NotFound)),
        Operation::ReadModifyWrite => {
            let found = adapter.get(key, &mut scratch.value).is_ok();
            if found {
                counters.read_bytes += scratch.value.len() as u64;
            }
            found && adapter.update(key, request.value).is_ok()
        }
        Operation::Scan => {
            let scanned = adapter.scan(key, request.scan_amount, &mut scratch.scan).is_ok();
            if scanned {
                counters.scanned_records += scratch.scan.len() as u64;
                counters.read_bytes += scratch.scan.iter().map(|(_, v)| v.len() as u64).sum::<u64>();
            }
            scanned
        }
        Operation::Update => adapter.update(key, request.value).is_ok(),
        Operation::Insert => adapter.put(key, request.value).is_ok(),
        Operation::Delete => adapter.delete(key).is_ok(),
    };

    if succeeded && request.op.writes_value() && request.op != Operation::Delete {
        counters.write_bytes += request.value.len() as u64;
    }
    succeeded
}
