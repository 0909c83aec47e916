//! TOML configuration file parsing

use super::*;
use crate::config::cli::{Cli, EngineArg, FormatArg};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    if let Some(threads) = cli.threads {
        config.run.threads = threads;
    }
    if let Some(period) = cli.latency_sample_period {
        config.run.latency_sample_period = period;
    }
    if let Some(runs) = cli.runs {
        config.run.runs = runs;
    }
    if let Some(seed) = cli.seed {
        config.run.seed = Some(seed);
    }
    if let Some(ref cores) = cli.cpu_cores {
        config.run.pin_to_cores = cores.clone();
    }

    // Duration 0 means "run every request"
    if let Some(ref duration_str) = cli.duration {
        let seconds = parse_duration(duration_str).context("Invalid duration")?;
        config.run.duration_secs = (seconds > 0).then_some(seconds);
    }

    if let Some(engine) = cli.engine {
        config.run.engine = match engine {
            EngineArg::Reference => EngineType::Reference,
            EngineArg::Noop => EngineType::NoOp,
        };
    }

    if let Some(format) = cli.format {
        config.output.format = match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        };
    }
    if let Some(ref path) = cli.json_output {
        config.output.json_path = Some(path.clone());
        config.output.format = OutputFormat::Json;
    }

    Ok(config)
}

/// Parse duration string (e.g., "60s", "5m", "1h", "1500ms") to seconds
///
/// A bare number is taken as seconds. Millisecond values round up to whole
/// seconds.
pub fn parse_duration(s: &str) -> Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    let (num_str, unit) = if let Some(num) = s.strip_suffix("ms") {
        (num, "ms")
    } else if s.ends_with(|c: char| c.is_ascii_alphabetic()) {
        let unit_start = s.len() - 1;
        (&s[..unit_start], &s[unit_start..])
    } else {
        (s, "s")
    };

    let num: u64 = num_str.parse()
        .with_context(|| format!("Invalid number in duration: {}", num_str))?;

    let seconds = match unit {
        "s" => num,
        "m" => num * 60,
        "h" => num * 3600,
        "ms" => num.div_ceil(1000),
        _ => anyhow::bail!("Invalid duration unit: {}. Use s, m, h, or ms", unit),
    };

    Ok(seconds)
}
