//! Advisory severity levels

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of an advisory, totally ordered from `Low` to `Critical`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Rank 0
    #[default]
    #[serde(alias = "info")]
    Low,
    /// Rank 1
    #[serde(alias = "medium")]
    Moderate,
    /// Rank 2
    High,
    /// Rank 3
    Critical,
}

impl Severity {
    /// Returns all severities from lowest to highest rank
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Low,
            Severity::Moderate,
            Severity::High,
            Severity::Critical,
        ]
    }

    /// Numeric rank used for filtering and counting
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Low => 0,
            Severity::Moderate => 1,
            Severity::High => 2,
            Severity::Critical => 3,
        }
    }

    /// Returns true if this severity passes a minimum-severity filter
    pub fn meets(&self, minimum: Severity) -> bool {
        self.rank() >= minimum.rank()
    }

    /// Lowercase name as used by advisory feeds
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Parses an advisory feed severity, mapping unknown labels to `Low`
    pub fn from_feed(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "moderate" | "medium" => Severity::Moderate,
            _ => Severity::Low,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "moderate" => Ok(Severity::Moderate),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(ConfigError::InvalidSeverity {
                value: s.to_string(),
            }),
        }
    }
}
