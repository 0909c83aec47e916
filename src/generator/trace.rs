//! Recorded request traces
//!
//! A [`Trace`] is a fixed, in-memory sequence of requests. It can be captured
//! from any [`Producer`] (to replay the exact same stream against several
//! adapters) or built directly from records. [`TraceWorkload`] replays it by
//! cutting the sequence into contiguous partitions, one per producer, so each
//! thread sees its slice in the original order.
//!
//! Traces keep operation, key and scan length only; payloads are regenerated
//! from a seeded [`ValueGenerator`] at replay time.

use super::request::{Key, Operation, Request};
use super::value::ValueGenerator;
use super::{share, Producer, Workload};
use crate::config::validator::validate_value;
use crate::distribution::Prng;
use crate::Result;
use anyhow::Context;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One recorded request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub op: Operation,
    pub key: Key,
    pub scan_amount: usize,
}

impl From<&Request<'_>> for TraceRecord {
    fn from(request: &Request<'_>) -> Self {
        Self {
            op: request.op,
            key: request.key,
            scan_amount: request.scan_amount,
        }
    }
}

/// Payload settings used when replaying a trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceOptions {
    pub value_size: usize,
    pub num_values: usize,
    pub seed: u64,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            value_size: 16,
            num_values: 1024,
            seed: 0,
        }
    }
}

/// Immutable request sequence
#[derive(Debug, Clone)]
pub struct Trace {
    records: Arc<Vec<TraceRecord>>,
    options: TraceOptions,
}

impl Trace {
    pub fn from_records(records: Vec<TraceRecord>, options: TraceOptions) -> Self {
        Self {
            records: Arc::new(records),
            options,
        }
    }

    /// Drain `producer` into a trace
    ///
    /// Calls [`Producer::prepare`] first, so pass a fresh producer.
    pub fn record<P: Producer + ?Sized>(producer: &mut P, options: TraceOptions) -> Result<Self> {
        producer.prepare().context("Failed to prepare producer for recording")?;
        let mut records = Vec::new();
        while producer.has_next() {
            records.push(TraceRecord::from(&producer.next()));
        }
        Ok(Self::from_records(records, options))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn options(&self) -> &TraceOptions {
        &self.options
    }

    /// Number of records with operation `op`
    pub fn count(&self, op: Operation) -> usize {
        self.records.iter().filter(|r| r.op == op).count()
    }
}

/// Replays a [`Trace`] across producers
#[derive(Debug, Clone)]
pub struct TraceWorkload {
    trace: Trace,
}

impl TraceWorkload {
    pub fn new(trace: &Trace) -> Self {
        Self { trace: trace.clone() }
    }
}

impl Workload for TraceWorkload {
    type Producer = TraceProducer;

    fn producers(&self, num_producers: usize) -> Result<Vec<TraceProducer>> {
        if num_producers == 0 {
            anyhow::bail!("Cannot split a trace across zero producers");
        }

        let options = self.trace.options;
        validate_value(options.value_size, options.num_values).context("Invalid trace payload options")?;

        let mut start = 0;
        let mut producers = Vec::with_capacity(num_producers);
        for index in 0..num_producers {
            let end = start + share(self.trace.len(), num_producers, index);
            let mut rng = Prng::seed_from_u64(options.seed.wrapping_add(index as u64));
            producers.push(TraceProducer {
                records: Arc::clone(&self.trace.records),
                next: start,
                end,
                values: ValueGenerator::new(options.value_size, options.num_values, &mut rng),
            });
            start = end;
        }
        Ok(producers)
    }
}

/// Replays one contiguous slice of a trace
pub struct TraceProducer {
    records: Arc<Vec<TraceRecord>>,
    next: usize,
    end: usize,
    values: ValueGenerator,
}

impl TraceProducer {
    /// Records left to replay
    pub fn remaining(&self) -> usize {
        self.end - self.next
    }
}

impl Producer for TraceProducer {
    #[inline]
    fn has_next(&self) -> bool {
        self.next < self.end
    }

    fn next(&mut self) -> Request<'_> {
        let record = self.records[self.next];
        self.next += 1;
        let value = match record.op {
            Operation::Delete => self.values.last_value(),
            op if op.writes_value() => self.values.next_value(),
            _ => &[][..],
        };
        Request::new(record.op, record.key, value, record.scan_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<TraceRecord> {
        (0..n)
            .map(|i| TraceRecord {
                op: if i % 2 == 0 { Operation::Read } else { Operation::Update },
                key: i as Key,
                scan_amount: 0,
            })
            .collect()
    }

    #[test]
    fn test_partitions_are_contiguous() {
        let trace = Trace::from_records(records(10), TraceOptions::default());
        let producers = TraceWorkload::new(&trace).producers(3).unwrap();
        let remaining: Vec<_> = producers.iter().map(TraceProducer::remaining).collect();
        assert_eq!(remaining, vec![4, 3, 3]);

        let mut keys = Vec::new();
        for mut p in producers {
            p.prepare().unwrap();
            while p.has_next() {
                keys.push(p.next().key);
            }
        }
        assert_eq!(keys, (0..10).collect::<Vec<Key>>());
    }

    #[test]
    fn test_replay_attaches_values() {
        let trace = Trace::from_records(records(4), TraceOptions { value_size: 8, ..Default::default() });
        let mut producer = TraceWorkload::new(&trace).producers(1).unwrap().remove(0);
        let read = producer.next();
        assert!(read.value.is_empty());
        let update = producer.next();
        assert_eq!(update.value.len(), 8);
    }

    #[test]
    fn test_record_from_producer() {
        let source = Trace::from_records(records(6), TraceOptions::default());
        let mut producer = TraceWorkload::new(&source).producers(1).unwrap().remove(0);
        let copy = Trace::record(&mut producer, TraceOptions::default()).unwrap();
        assert_eq!(copy.records(), source.records());
        assert_eq!(copy.count(Operation::Update), 3);
    }

    #[test]
    fn test_invalid_payload_options_rejected() {
        use crate::config::validator::ConfigError;

        let trace = Trace::from_records(records(4), TraceOptions { num_values: 1, ..Default::default() });
        let err = TraceWorkload::new(&trace).producers(1).err().unwrap();
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::TooFewValues(1)));

        let trace = Trace::from_records(records(4), TraceOptions { value_size: 2, ..Default::default() });
        let err = TraceWorkload::new(&trace).producers(2).err().unwrap();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::ValueTooSmall { size: 2, .. })));
    }

    #[test]
    fn test_more_producers_than_records() {
        let trace = Trace::from_records(records(2), TraceOptions::default());
        let producers = TraceWorkload::new(&trace).producers(4).unwrap();
        assert_eq!(producers.iter().filter(|p| p.has_next()).count(), 2);
    }
}
