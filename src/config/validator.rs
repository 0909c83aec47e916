//! Configuration validation
//!
//! Everything that would otherwise surface as a panic deep inside a producer
//! (empty choosers, impossible key budgets, bad distribution parameters) is
//! rejected here with a [`ConfigError`].

use super::*;
use crate::generator::request::NEGATIVE_KEY_BIT;
use crate::generator::value::MIN_VALUE_SIZE;
use thiserror::Error;

/// Proportions in a phase may drift this far from 1.0
const PROPORTION_TOLERANCE: f64 = 1e-6;

/// Reasons a configuration is rejected
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("threads must be at least 1")]
    ZeroThreads,

    #[error("latency_sample_period must be at least 1")]
    ZeroLatencySamplePeriod,

    #[error("runs must be at least 1")]
    ZeroRuns,

    #[error("duration_secs must be greater than 0 when set")]
    ZeroDuration,

    #[error("value size {size} is smaller than the minimum of {min} bytes")]
    ValueTooSmall { size: usize, min: usize },

    #[error("num_values must be at least 2 (one payload plus the tombstone), got {0}")]
    TooFewValues(usize),

    #[error("key range min ({min}) exceeds max ({max})")]
    InvertedKeyRange { min: Key, max: Key },

    #[error("key range covers the entire 64-bit domain")]
    KeyRangeTooWide,

    #[error("workload needs {needed} distinct keys but the key range only holds {available}")]
    KeyRangeTooSmall { needed: u64, available: u64 },

    #[error("negative reads set bit 63 of a key, so key range max must be below 2^63 (got {0})")]
    KeyRangeOverlapsNegativeKeys(Key),

    #[error("at least one phase is required")]
    NoPhases,

    #[error("phase {phase}: num_requests must be greater than 0")]
    EmptyPhase { phase: usize },

    #[error("phase {phase}: {op} proportion {value} must be in [0, 1]")]
    InvalidProportion { phase: usize, op: Operation, value: f64 },

    #[error("phase {phase}: proportions sum to {sum}, expected 1.0")]
    ProportionSum { phase: usize, sum: f64 },

    #[error("phase {phase}: scan max_length must be at least 1")]
    ZeroScanLength { phase: usize },

    #[error("phase {phase}: invalid {op} distribution: {reason}")]
    InvalidDistribution { phase: usize, op: Operation, reason: String },

    #[error("phase {phase}: {op} requests need existing keys but none are loaded or inserted before it")]
    EmptyKeyPopulation { phase: usize, op: Operation },
}

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_run(&config.run)?;
    validate_workload(&config.workload)?;
    Ok(())
}

/// Validate execution settings
pub fn validate_run(run: &RunConfig) -> Result<(), ConfigError> {
    if run.threads == 0 {
        return Err(ConfigError::ZeroThreads);
    }
    if run.latency_sample_period == 0 {
        return Err(ConfigError::ZeroLatencySamplePeriod);
    }
    if run.runs == 0 {
        return Err(ConfigError::ZeroRuns);
    }
    if run.duration_secs == Some(0) {
        return Err(ConfigError::ZeroDuration);
    }
    Ok(())
}

/// Validate load, value and phase definitions together
pub fn validate_workload(workload: &WorkloadConfig) -> Result<(), ConfigError> {
    validate_value(workload.value.size, workload.value.num_values)?;

    let range = &workload.load.key_range;
    if range.min() > range.max() {
        return Err(ConfigError::InvertedKeyRange {
            min: range.min(),
            max: range.max(),
        });
    }
    if range.min() == 0 && range.max() == Key::MAX {
        return Err(ConfigError::KeyRangeTooWide);
    }

    if workload.phases.is_empty() {
        return Err(ConfigError::NoPhases);
    }

    // Live keys at the start of each phase
    let mut live_keys = workload.load.num_records;
    for (index, phase) in workload.phases.iter().enumerate() {
        validate_phase(index, phase, live_keys)?;
        live_keys += phase.insert_count();
    }

    let needed = (workload.load.num_records + workload.total_inserts()) as u64;
    if needed > range.size() {
        return Err(ConfigError::KeyRangeTooSmall {
            needed,
            available: range.size(),
        });
    }

    let uses_negative_reads = workload
        .phases
        .iter()
        .any(|p| p.proportion(Operation::NegativeRead) > 0.0);
    if uses_negative_reads && range.max() & NEGATIVE_KEY_BIT != 0 {
        return Err(ConfigError::KeyRangeOverlapsNegativeKeys(range.max()));
    }

    Ok(())
}

/// Payload pool shape: `size` bytes per value, `num_values` slots including the tombstone
pub fn validate_value(size: usize, num_values: usize) -> Result<(), ConfigError> {
    if size < MIN_VALUE_SIZE {
        return Err(ConfigError::ValueTooSmall {
            size,
            min: MIN_VALUE_SIZE,
        });
    }
    if num_values < 2 {
        return Err(ConfigError::TooFewValues(num_values));
    }
    Ok(())
}

/// Validate a single phase given the key population it starts with
pub fn validate_phase(index: usize, phase: &PhaseConfig, live_keys: usize) -> Result<(), ConfigError> {
    if phase.num_requests == 0 {
        return Err(ConfigError::EmptyPhase { phase: index });
    }

    let mut sum = 0.0;
    for op in Operation::ALL {
        let value = phase.proportion(op);
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidProportion { phase: index, op, value });
        }
        sum += value;
    }
    if (sum - 1.0).abs() > PROPORTION_TOLERANCE {
        return Err(ConfigError::ProportionSum { phase: index, sum });
    }

    if let Some(scan) = &phase.scan {
        if scan.proportion > 0.0 && scan.max_length == 0 {
            return Err(ConfigError::ZeroScanLength { phase: index });
        }
    }

    let inserts_first = phase.proportion(Operation::Insert) > 0.0;
    for op in Operation::KEYED {
        if phase.proportion(op) <= 0.0 {
            continue;
        }
        if let Some(dist) = phase.distribution(op) {
            validate_distribution(dist).map_err(|reason| ConfigError::InvalidDistribution {
                phase: index,
                op,
                reason,
            })?;
        }
        if live_keys == 0 && !inserts_first {
            return Err(ConfigError::EmptyKeyPopulation { phase: index, op });
        }
    }

    Ok(())
}

fn validate_distribution(dist: &DistributionType) -> Result<(), String> {
    match *dist {
        DistributionType::Uniform => Ok(()),
        DistributionType::Zipfian { theta, .. } | DistributionType::Latest { theta } => {
            if theta > 0.0 && theta < 1.0 {
                Ok(())
            } else {
                Err(format!("theta must be in (0, 1), got {}", theta))
            }
        }
        DistributionType::Hotspot { hot_fraction, hot_op_fraction } => {
            if !(0.0..=1.0).contains(&hot_fraction) {
                Err(format!("hot_fraction must be in [0, 1], got {}", hot_fraction))
            } else if !(0.0..=1.0).contains(&hot_op_fraction) {
                Err(format!("hot_op_fraction must be in [0, 1], got {}", hot_op_fraction))
            } else {
                Ok(())
            }
        }
    }
}
