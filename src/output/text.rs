//! Text output formatting

use crate::config::Config;
use crate::generator::Operation;
use crate::stats::SessionResult;
use crate::util::units::{format_bytes, format_count, format_duration, format_rate};
use std::fmt::Write;
use std::time::Duration;

const RULE: &str = "═══════════════════════════════════════════════════════════";

/// Print the effective configuration before running
pub fn print_configuration(config: &Config) {
    print!("{}", format_configuration(config));
}

/// Print a bulk-load summary
pub fn print_load(result: &SessionResult) {
    println!(
        "Loaded {} records in {} ({} records/s, {})",
        format_count(result.counters.inserts.succeeded),
        format_duration(result.run_time),
        format_rate(result.throughput()),
        format_bytes(result.counters.write_bytes)
    );
    println!();
}

/// Print the results of one run
pub fn print_results(run: usize, result: &SessionResult) {
    print!("{}", format_results(run, result));
}

pub fn format_configuration(config: &Config) -> String {
    let mut out = String::new();
    let run = &config.run;
    let workload = &config.workload;

    let _ = writeln!(out, "kvpulse configuration");
    let _ = writeln!(out, "  Engine:          {}", run.engine);
    let _ = writeln!(out, "  Threads:         {}", run.threads);
    let _ = writeln!(out, "  Latency sample:  every {} request(s)", run.latency_sample_period);
    if let Some(secs) = run.duration_secs {
        let _ = writeln!(out, "  Duration limit:  {}s", secs);
    }
    if run.runs > 1 {
        let _ = writeln!(out, "  Runs:            {}", run.runs);
    }
    if !run.pin_to_cores.is_empty() {
        let _ = writeln!(out, "  Pinned cores:    {:?}", run.pin_to_cores);
    }
    let _ = writeln!(
        out,
        "  Load:            {} records from {} ({} sampling)",
        format_count(workload.load.num_records as u64),
        workload.load.key_range,
        workload.load.sampling
    );
    let _ = writeln!(
        out,
        "  Values:          {} bytes, {} slots",
        workload.value.size, workload.value.num_values
    );
    for (i, phase) in workload.phases.iter().enumerate() {
        let _ = writeln!(out, "  Phase {}:         {}", i, phase);
    }
    let _ = writeln!(out);
    out
}

pub fn format_results(run: usize, result: &SessionResult) -> String {
    let mut out = String::new();
    let counters = &result.counters;

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "                    RUN {} RESULTS", run + 1);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out);
    let _ = writeln!(out, "Elapsed Time: {:.3}s", result.run_time.as_secs_f64());
    let _ = writeln!(out);

    let _ = writeln!(out, "Operations:");
    for op in Operation::ALL {
        let counter = counters.counter(op);
        if counter.total() == 0 {
            continue;
        }
        let _ = write!(
            out,
            "  {:<18} {:>14} ok",
            op.to_string(),
            format_count(counter.succeeded)
        );
        if counter.failed > 0 {
            let _ = write!(out, "  {:>10} failed", format_count(counter.failed));
        }
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "  {:<18} {:>14}", "total", format_count(counters.total_requests()));
    if counters.scanned_records > 0 {
        let _ = writeln!(out, "  Scanned records:   {}", format_count(counters.scanned_records));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Throughput:");
    let _ = writeln!(out, "  Requests: {} req/s", format_rate(result.throughput()));
    let _ = writeln!(out, "  Data:     {}/s", format_bytes(result.bandwidth() as u64));
    let _ = writeln!(out);

    let hist = result.latency_histogram();
    let _ = writeln!(out, "Latency ({} samples):", format_count(hist.len()));
    if hist.is_empty() {
        let _ = writeln!(out, "  (none)");
    } else {
        let show = |d: Option<Duration>| d.map_or_else(|| "-".to_string(), format_duration);
        let _ = writeln!(out, "  Min:    {}", show(hist.min()));
        let _ = writeln!(out, "  Mean:   {}", show(hist.mean()));
        let _ = writeln!(out, "  p50:    {}", show(hist.percentile(50.0)));
        let _ = writeln!(out, "  p90:    {}", show(hist.percentile(90.0)));
        let _ = writeln!(out, "  p99:    {}", show(hist.percentile(99.0)));
        let _ = writeln!(out, "  p99.9:  {}", show(hist.percentile(99.9)));
        let _ = writeln!(out, "  Max:    {}", show(hist.max()));
    }
    if result.dropped_samples > 0 {
        let _ = writeln!(out, "  Dropped samples: {}", format_count(result.dropped_samples));
    }
    let _ = writeln!(out);
    out
}
