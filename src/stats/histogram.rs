//! Latency histogram using HdrHistogram
//!
//! Executors keep raw latency samples so a session can concatenate them
//! across threads; reports fold those samples into a [`LatencyHistogram`] to
//! answer percentile queries.
//!
//! # Example
//!
//! ```
//! use kvpulse::stats::histogram::LatencyHistogram;
//! use std::time::Duration;
//!
//! let samples = [Duration::from_micros(100), Duration::from_micros(300)];
//! let hist = LatencyHistogram::from_samples(&samples);
//! assert_eq!(hist.len(), 2);
//! assert!(hist.percentile(99.0).unwrap() >= Duration::from_micros(299));
//! ```

use hdrhistogram::Histogram;
use serde::Serialize;
use std::time::Duration;

/// Largest trackable latency (one hour, in nanoseconds)
const MAX_LATENCY_NANOS: u64 = 3_600_000_000_000;

/// Significant digits kept by the histogram (0.1% precision)
const SIGNIFICANT_DIGITS: u8 = 3;

/// Latency histogram covering 1ns to 1 hour
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyHistogram {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_LATENCY_NANOS, SIGNIFICANT_DIGITS)
            .expect("constant histogram bounds are valid");
        Self { histogram }
    }

    /// Build a histogram from raw samples
    pub fn from_samples(samples: &[Duration]) -> Self {
        let mut hist = Self::new();
        for sample in samples {
            hist.record(*sample);
        }
        hist
    }

    /// Record one latency (clamped to the trackable range)
    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let nanos = (latency.as_nanos() as u64).clamp(1, MAX_LATENCY_NANOS);
        let _ = self.histogram.record(nanos);
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Latency at `percentile` (0-100), `None` when empty
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_nanos(self.histogram.value_at_percentile(percentile)))
    }

    pub fn min(&self) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_nanos(self.histogram.min()))
    }

    pub fn max(&self) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_nanos(self.histogram.max()))
    }

    pub fn mean(&self) -> Option<Duration> {
        (!self.is_empty()).then(|| Duration::from_nanos(self.histogram.mean() as u64))
    }

    /// Fixed set of percentiles for reports
    pub fn summary(&self) -> LatencySummary {
        let nanos = |d: Option<Duration>| d.map_or(0, |d| d.as_nanos() as u64);
        LatencySummary {
            samples: self.len(),
            min_ns: nanos(self.min()),
            mean_ns: nanos(self.mean()),
            p50_ns: nanos(self.percentile(50.0)),
            p90_ns: nanos(self.percentile(90.0)),
            p99_ns: nanos(self.percentile(99.0)),
            p999_ns: nanos(self.percentile(99.9)),
            max_ns: nanos(self.max()),
        }
    }
}

/// Report-friendly latency percentiles (all zero when no samples were taken)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LatencySummary {
    pub samples: u64,
    pub min_ns: u64,
    pub mean_ns: u64,
    pub p50_ns: u64,
    pub p90_ns: u64,
    pub p99_ns: u64,
    pub p999_ns: u64,
    pub max_ns: u64,
}
