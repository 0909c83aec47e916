//! KVPulse - Workload generation and replay harness for key-value engines
//!
//! KVPulse generates YCSB-style request streams from a declarative phase
//! description and replays them concurrently against a storage adapter,
//! measuring per-operation outcomes, throughput and sampled latency.
//!
//! # Architecture
//!
//! - **Key sampling**: distinct keys drawn from a range (Floyd, selection, Fisher-Yates)
//! - **Distributions**: uniform, Zipfian, hotspot and latest choosers over a live key population
//! - **Phases**: ordered request mixes with insert/delete budgets
//! - **Executors**: one thread per producer, released together by a start barrier
//! - **Sessions**: bulk load, run, stop early on a deadline, merge per-thread results

pub mod config;
pub mod coordinator;
pub mod distribution;
pub mod engine;
pub mod generator;
pub mod output;
pub mod stats;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{RunOptions, Session};
pub use engine::KvAdapter;
pub use generator::{Operation, Request};

/// Result type used throughout KVPulse
pub type Result<T> = anyhow::Result<T>;
