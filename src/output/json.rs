//! JSON output formatting
//!
//! One report per invocation: the effective configuration, the bulk load and
//! every run, each with per-operation counters and latency percentiles.

use crate::config::Config;
use crate::stats::histogram::LatencySummary;
use crate::stats::{OperationCounters, SessionResult};
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Complete benchmark report
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub timestamp: String,
    pub version: &'static str,
    pub seed: u64,
    pub config: Config,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<JsonRun>,
    pub runs: Vec<JsonRun>,
}

impl JsonReport {
    pub fn new(config: &Config, seed: u64) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            seed,
            config: config.clone(),
            load: None,
            runs: Vec::new(),
        }
    }
}

/// Summary of one session result
#[derive(Debug, Clone, Serialize)]
pub struct JsonRun {
    pub run: usize,
    pub run_time_ns: u64,
    pub total_requests: u64,
    pub failed_requests: u64,
    pub throughput_rps: f64,
    pub bandwidth_bytes_per_sec: f64,
    pub counters: OperationCounters,
    pub latency: LatencySummary,
    pub dropped_samples: u64,
}

impl JsonRun {
    pub fn from_result(run: usize, result: &SessionResult) -> Self {
        Self {
            run,
            run_time_ns: result.run_time.as_nanos() as u64,
            total_requests: result.total_requests(),
            failed_requests: result.counters.total_failed(),
            throughput_rps: result.throughput(),
            bandwidth_bytes_per_sec: result.bandwidth(),
            counters: result.counters.clone(),
            latency: result.latency_summary(),
            dropped_samples: result.dropped_samples,
        }
    }
}

/// Write `report` to `path`, or to stdout when no path is given
pub fn write_json(report: &JsonReport, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create JSON output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, report).context("Failed to serialize JSON report")?;
            writer.flush().context("Failed to write JSON report")?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, report).context("Failed to serialize JSON report")?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Operation;
    use crate::stats::ExecutorResult;
    use std::time::{Duration, Instant};

    fn config() -> Config {
        ::toml::from_str(
            r#"
            [load]
            num_records = 10
            key_range = { min = 0, max = 99 }

            [[phases]]
            num_requests = 10
            read = { proportion = 1.0 }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_report_to_file() {
        let mut executor = ExecutorResult::new(0);
        executor.counters.record_many(Operation::Read, 10, true);
        executor.latency_samples = vec![Duration::from_micros(3); 10];
        let result = SessionResult::merge(vec![executor], Duration::from_millis(10), Instant::now());

        let mut report = JsonReport::new(&config(), 7);
        report.runs.push(JsonRun::from_result(0, &result));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_json(&report, Some(&path)).unwrap();

        let value: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(value["seed"], 7);
        assert_eq!(value["runs"][0]["total_requests"], 10);
        assert_eq!(value["runs"][0]["counters"]["reads"]["succeeded"], 10);
        assert_eq!(value["runs"][0]["latency"]["samples"], 10);
        assert_eq!(value["config"]["load"]["num_records"], 10);
        assert!(value.get("load").is_none());
    }
}
