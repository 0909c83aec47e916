//! Run statistics
//!
//! Each executor produces an [`ExecutorResult`]: per-operation success and
//! failure counts, byte and record totals, its own run time and the latency
//! samples it took. A session merges those into a [`SessionResult`] whose run
//! time is measured by the session itself, from the moment executors are
//! released until the last one is joined.
//!
//! Latency samples are plain durations; build a
//! [`histogram::LatencyHistogram`] from them for percentile queries.

pub mod histogram;

use crate::generator::Operation;
use histogram::{LatencyHistogram, LatencySummary};
use serde::Serialize;
use std::ops::AddAssign;
use std::time::{Duration, Instant};

/// Success and failure count for one operation kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpCounter {
    pub succeeded: u64,
    pub failed: u64,
}

impl OpCounter {
    #[inline]
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }
}

impl AddAssign for OpCounter {
    fn add_assign(&mut self, other: Self) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }
}

/// Per-operation request counts plus data volume
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationCounters {
    pub reads: OpCounter,
    pub read_modify_writes: OpCounter,
    pub negative_reads: OpCounter,
    pub scans: OpCounter,
    pub updates: OpCounter,
    pub deletes: OpCounter,
    pub inserts: OpCounter,
    /// Records returned by successful scans
    pub scanned_records: u64,
    /// Value bytes returned by reads and scans
    pub read_bytes: u64,
    /// Value bytes sent by inserts, updates and read-modify-writes
    pub write_bytes: u64,
}

impl OperationCounters {
    #[inline]
    pub fn counter(&self, op: Operation) -> &OpCounter {
        match op {
            Operation::Read => &self.reads,
            Operation::ReadModifyWrite => &self.read_modify_writes,
            Operation::NegativeRead => &self.negative_reads,
            Operation::Scan => &self.scans,
            Operation::Update => &self.updates,
            Operation::Delete => &self.deletes,
            Operation::Insert => &self.inserts,
        }
    }

    #[inline]
    fn counter_mut(&mut self, op: Operation) -> &mut OpCounter {
        match op {
            Operation::Read => &mut self.reads,
            Operation::ReadModifyWrite => &mut self.read_modify_writes,
            Operation::NegativeRead => &mut self.negative_reads,
            Operation::Scan => &mut self.scans,
            Operation::Update => &mut self.updates,
            Operation::Delete => &mut self.deletes,
            Operation::Insert => &mut self.inserts,
        }
    }

    /// Count one request of kind `op`
    #[inline]
    pub fn record(&mut self, op: Operation, succeeded: bool) {
        let counter = self.counter_mut(op);
        if succeeded {
            counter.succeeded += 1;
        } else {
            counter.failed += 1;
        }
    }

    /// Count `n` requests of kind `op` with the same outcome
    pub fn record_many(&mut self, op: Operation, n: u64, succeeded: bool) {
        let counter = self.counter_mut(op);
        if succeeded {
            counter.succeeded += n;
        } else {
            counter.failed += n;
        }
    }

    /// Requests of every kind, successful or not
    pub fn total_requests(&self) -> u64 {
        Operation::ALL.iter().map(|op| self.counter(*op).total()).sum()
    }

    pub fn total_succeeded(&self) -> u64 {
        Operation::ALL.iter().map(|op| self.counter(*op).succeeded).sum()
    }

    pub fn total_failed(&self) -> u64 {
        Operation::ALL.iter().map(|op| self.counter(*op).failed).sum()
    }
}

impl AddAssign<&OperationCounters> for OperationCounters {
    fn add_assign(&mut self, other: &OperationCounters) {
        for op in Operation::ALL {
            *self.counter_mut(op) += *other.counter(op);
        }
        self.scanned_records += other.scanned_records;
        self.read_bytes += other.read_bytes;
        self.write_bytes += other.write_bytes;
    }
}

/// What one executor did
#[derive(Debug, Clone, Default)]
pub struct ExecutorResult {
    pub worker_id: usize,
    pub counters: OperationCounters,
    /// Time spent in the request loop
    pub run_time: Duration,
    pub latency_samples: Vec<Duration>,
    /// Samples due but not kept because the sample buffer was full
    pub dropped_samples: u64,
}

impl ExecutorResult {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            ..Default::default()
        }
    }
}

/// Merged outcome of a session run or load
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub counters: OperationCounters,
    /// Wall-clock time from release of the executors to the last join
    pub run_time: Duration,
    /// Samples from every executor, concatenated in worker order
    pub latency_samples: Vec<Duration>,
    pub dropped_samples: u64,
    /// When the executors were released
    pub started_at: Instant,
    pub per_executor: Vec<ExecutorResult>,
}

impl SessionResult {
    /// Merge executor results under a run time measured by the caller
    ///
    /// Per-executor latency samples are moved into the merged list.
    pub fn merge(mut per_executor: Vec<ExecutorResult>, run_time: Duration, started_at: Instant) -> Self {
        let mut counters = OperationCounters::default();
        let mut latency_samples = Vec::with_capacity(per_executor.iter().map(|r| r.latency_samples.len()).sum());
        let mut dropped_samples = 0;
        for result in per_executor.iter_mut() {
            counters += &result.counters;
            latency_samples.append(&mut result.latency_samples);
            dropped_samples += result.dropped_samples;
        }
        Self {
            counters,
            run_time,
            latency_samples,
            dropped_samples,
            started_at,
            per_executor,
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.counters.total_requests()
    }

    /// Requests per second over the session run time
    pub fn throughput(&self) -> f64 {
        per_second(self.total_requests(), self.run_time)
    }

    /// Bytes moved per second (reads plus writes)
    pub fn bandwidth(&self) -> f64 {
        per_second(self.counters.read_bytes + self.counters.write_bytes, self.run_time)
    }

    pub fn latency_histogram(&self) -> LatencyHistogram {
        LatencyHistogram::from_samples(&self.latency_samples)
    }

    pub fn latency_summary(&self) -> LatencySummary {
        self.latency_histogram().summary()
    }
}

/// `count` events over `elapsed`, zero for an empty interval
pub fn per_second(count: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        count as f64 / seconds
    } else {
        0.0
    }
}
