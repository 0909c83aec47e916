//! Workload definition structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key distribution for a chooser
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionType {
    #[default]
    Uniform,
    /// Power law over item rank; `salt` scrambles hot items across the key space
    Zipfian {
        #[serde(default = "default_theta")]
        theta: f64,
        #[serde(default)]
        salt: Option<u64>,
    },
    /// `hot_fraction` of the items receive `hot_op_fraction` of the draws
    Hotspot { hot_fraction: f64, hot_op_fraction: f64 },
    /// Power law over recency (newest items hottest)
    Latest {
        #[serde(default = "default_theta")]
        theta: f64,
    },
}

fn default_theta() -> f64 {
    0.99
}

/// Storage-engine adapter the binary drives
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngineType {
    /// In-memory ordered map
    #[default]
    Reference,
    /// Accepts every request without doing work (harness overhead)
    #[serde(rename = "noop")]
    NoOp,
}

/// Report format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// Display trait implementations

impl fmt::Display for DistributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionType::Uniform => write!(f, "uniform"),
            DistributionType::Zipfian { theta, salt: None } => write!(f, "zipfian(theta={})", theta),
            DistributionType::Zipfian { theta, salt: Some(salt) } => {
                write!(f, "zipfian(theta={}, salt={})", theta, salt)
            }
            DistributionType::Hotspot { hot_fraction, hot_op_fraction } => write!(
                f,
                "hotspot({:.0}% of ops on {:.0}% of keys)",
                hot_op_fraction * 100.0,
                hot_fraction * 100.0
            ),
            DistributionType::Latest { theta } => write!(f, "latest(theta={})", theta),
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineType::Reference => write!(f, "reference"),
            EngineType::NoOp => write!(f, "noop"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
