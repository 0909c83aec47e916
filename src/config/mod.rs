//! Configuration module
//!
//! A benchmark is described by a TOML file with four parts:
//!
//! - `[run]`: thread count, latency sampling, duration bound, repetitions
//! - `[load]`: size of the initial key population and the key range it lives in
//! - `[value]`: payload size and how many distinct payloads to cycle through
//! - `[[phases]]`: the ordered request mix, one table per phase
//!
//! CLI flags override the file (see [`toml::merge_cli_with_config`]) and the
//! merged result is checked by [`validator::validate_config`] before anything
//! runs.
//!
//! # Example
//!
//! ```toml
//! [run]
//! threads = 4
//! latency_sample_period = 10
//!
//! [load]
//! num_records = 100000
//! key_range = { min = 0, max = 10000000 }
//!
//! [value]
//! size = 64
//!
//! [[phases]]
//! num_requests = 1000000
//! read = { proportion = 0.95, distribution = { type = "zipfian", theta = 0.99 } }
//! insert = { proportion = 0.05 }
//! ```

pub mod cli;
pub mod toml;
pub mod validator;
pub mod workload;

use crate::generator::range::Range;
use crate::generator::request::{Key, Operation};
use crate::generator::sampling::SamplingAlgorithm;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use workload::*;

/// Complete benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(flatten)]
    pub workload: WorkloadConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// How a workload is executed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of executor threads
    #[serde(default = "default_threads")]
    pub threads: usize,
    /// Measure latency of every Nth request per thread
    #[serde(default = "default_latency_sample_period")]
    pub latency_sample_period: usize,
    /// Upper bound on retained latency samples per thread
    #[serde(default = "default_max_latency_samples")]
    pub max_latency_samples: usize,
    /// Stop executors after this many seconds even if requests remain
    #[serde(default)]
    pub duration_secs: Option<u64>,
    /// Number of times the workload is repeated against the same loaded state
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Workload seed (random when absent)
    #[serde(default)]
    pub seed: Option<u64>,
    /// Pin executor `i` to `pin_to_cores[i % len]`
    #[serde(default)]
    pub pin_to_cores: Vec<usize>,
    /// Storage adapter to drive
    #[serde(default)]
    pub engine: EngineType,
}

fn default_threads() -> usize {
    1
}

fn default_latency_sample_period() -> usize {
    1
}

fn default_max_latency_samples() -> usize {
    10_000_000
}

fn default_runs() -> usize {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            latency_sample_period: default_latency_sample_period(),
            max_latency_samples: default_max_latency_samples(),
            duration_secs: None,
            runs: default_runs(),
            seed: None,
            pin_to_cores: Vec::new(),
            engine: EngineType::default(),
        }
    }
}

/// Everything needed to generate requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    pub load: LoadConfig,
    #[serde(default)]
    pub value: ValueConfig,
    pub phases: Vec<PhaseConfig>,
}

/// Initial key population
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Keys bulk loaded before the first phase
    pub num_records: usize,
    /// Inclusive range every key (loaded or inserted later) is drawn from
    pub key_range: Range<Key>,
    /// Algorithm used to draw distinct keys
    #[serde(default)]
    pub sampling: SamplingAlgorithm,
}

/// Payload pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueConfig {
    /// Bytes per value
    #[serde(default = "default_value_size")]
    pub size: usize,
    /// Slots in the pool, including the reserved tombstone slot
    #[serde(default = "default_num_values")]
    pub num_values: usize,
}

fn default_value_size() -> usize {
    16
}

fn default_num_values() -> usize {
    1024
}

impl Default for ValueConfig {
    fn default() -> Self {
        Self {
            size: default_value_size(),
            num_values: default_num_values(),
        }
    }
}

/// Key-addressed operation in a phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationConfig {
    pub proportion: f64,
    #[serde(default)]
    pub distribution: DistributionType,
}

/// Scan operation in a phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub proportion: f64,
    #[serde(default)]
    pub distribution: DistributionType,
    /// Scan lengths are drawn uniformly from `1..=max_length`
    pub max_length: usize,
}

/// Insert operation in a phase (keys come from the pre-sampled insert pool)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertConfig {
    pub proportion: f64,
}

/// One phase of the request mix
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhaseConfig {
    pub num_requests: usize,
    #[serde(default)]
    pub read: Option<OperationConfig>,
    #[serde(default)]
    pub read_modify_write: Option<OperationConfig>,
    #[serde(default)]
    pub negative_read: Option<OperationConfig>,
    #[serde(default)]
    pub scan: Option<ScanConfig>,
    #[serde(default)]
    pub update: Option<OperationConfig>,
    #[serde(default)]
    pub delete: Option<OperationConfig>,
    #[serde(default)]
    pub insert: Option<InsertConfig>,
}

impl PhaseConfig {
    /// Proportion configured for `op` (zero when the operation is absent)
    pub fn proportion(&self, op: Operation) -> f64 {
        match op {
            Operation::Read => self.read.as_ref().map_or(0.0, |o| o.proportion),
            Operation::ReadModifyWrite => self.read_modify_write.as_ref().map_or(0.0, |o| o.proportion),
            Operation::NegativeRead => self.negative_read.as_ref().map_or(0.0, |o| o.proportion),
            Operation::Scan => self.scan.as_ref().map_or(0.0, |o| o.proportion),
            Operation::Update => self.update.as_ref().map_or(0.0, |o| o.proportion),
            Operation::Delete => self.delete.as_ref().map_or(0.0, |o| o.proportion),
            Operation::Insert => self.insert.as_ref().map_or(0.0, |o| o.proportion),
        }
    }

    /// Key distribution configured for a key-addressed `op`
    pub fn distribution(&self, op: Operation) -> Option<&DistributionType> {
        match op {
            Operation::Read => self.read.as_ref().map(|o| &o.distribution),
            Operation::ReadModifyWrite => self.read_modify_write.as_ref().map(|o| &o.distribution),
            Operation::NegativeRead => self.negative_read.as_ref().map(|o| &o.distribution),
            Operation::Scan => self.scan.as_ref().map(|o| &o.distribution),
            Operation::Update => self.update.as_ref().map(|o| &o.distribution),
            Operation::Delete => self.delete.as_ref().map(|o| &o.distribution),
            Operation::Insert => None,
        }
    }

    /// Total inserts this phase performs across all threads
    pub fn insert_count(&self) -> usize {
        budget(self.num_requests, self.proportion(Operation::Insert))
    }

    /// Total deletes this phase performs across all threads
    pub fn delete_count(&self) -> usize {
        budget(self.num_requests, self.proportion(Operation::Delete))
    }
}

fn budget(num_requests: usize, proportion: f64) -> usize {
    (num_requests as f64 * proportion).round() as usize
}

impl WorkloadConfig {
    /// Inserts performed by every phase together
    pub fn total_inserts(&self) -> usize {
        self.phases.iter().map(PhaseConfig::insert_count).sum()
    }

    /// Requests issued by every phase together
    pub fn total_requests(&self) -> usize {
        self.phases.iter().map(|p| p.num_requests).sum()
    }
}

/// Where results go
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Write the JSON report here instead of stdout
    #[serde(default)]
    pub json_path: Option<PathBuf>,
}

impl fmt::Display for PhaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requests:", self.num_requests)?;
        for op in Operation::ALL {
            let proportion = self.proportion(op);
            if proportion <= 0.0 {
                continue;
            }
            write!(f, " {} {:.1}%", op, proportion * 100.0)?;
            if let Some(dist) = self.distribution(op) {
                write!(f, " ({})", dist)?;
            }
        }
        Ok(())
    }
}
