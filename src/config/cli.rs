//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// KVPulse - Workload generator and replay harness for key-value engines
#[derive(Parser, Debug)]
#[command(name = "kvpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Workload description (TOML)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    // === Run Options ===
    /// Number of executor threads
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Measure latency of every Nth request per thread
    #[arg(long)]
    pub latency_sample_period: Option<usize>,

    /// Stop early after this long (e.g., 30s, 5m, 1h)
    #[arg(short = 'd', long)]
    pub duration: Option<String>,

    /// Repeat the workload this many times against the loaded state
    #[arg(long)]
    pub runs: Option<usize>,

    /// Workload seed (random when omitted)
    #[arg(long, env = "KVPULSE_SEED")]
    pub seed: Option<u64>,

    /// Comma-separated cores to pin executors to (e.g., "0,2,4")
    #[arg(long, value_delimiter = ',')]
    pub cpu_cores: Option<Vec<usize>>,

    /// Storage engine to drive
    #[arg(short = 'e', long, value_enum)]
    pub engine: Option<EngineArg>,

    // === Output Options ===
    /// Report format
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<FormatArg>,

    /// Write the JSON report to this file instead of stdout
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Validate configuration and print it without running
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Storage engine selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    /// In-memory ordered map
    Reference,
    /// Accepts every request without storing anything
    Noop,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
}

impl Cli {
    /// Parse arguments from the process command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter directive implied by `-v` (used when `RUST_LOG` is unset)
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
