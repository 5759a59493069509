//! Scan summary and result types
//!
//! Provides the counters reported per scan and the result object handed to
//! the presentation layer.

use super::{Finding, PackageAlternative, ResolvedDependency, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters for one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    /// Number of resolved dependencies
    pub total: usize,
    /// Number of findings
    pub vulnerable: usize,
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl SummaryCounts {
    /// Creates counters for a dependency set of the given size
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Increments the bucket for a severity
    pub fn record(&mut self, severity: Severity) {
        *self.bucket_mut(severity) += 1;
    }

    /// Count for a severity
    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Moderate => self.moderate,
            Severity::Low => self.low,
        }
    }

    fn bucket_mut(&mut self, severity: Severity) -> &mut usize {
        match severity {
            Severity::Critical => &mut self.critical,
            Severity::High => &mut self.high,
            Severity::Moderate => &mut self.moderate,
            Severity::Low => &mut self.low,
        }
    }
}

/// Full result of one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub summary: SummaryCounts,
    pub vulnerabilities: Vec<Finding>,
    pub dependencies: Vec<ResolvedDependency>,
    /// Alternatives keyed by vulnerable package name
    pub alternatives: BTreeMap<String, Vec<PackageAlternative>>,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    /// Returns true if any finding was reported
    pub fn has_findings(&self) -> bool {
        !self.vulnerabilities.is_empty()
    }

    /// Findings at high or critical severity
    pub fn severe_findings(&self) -> impl Iterator<Item = &Finding> {
        self.vulnerabilities
            .iter()
            .filter(|f| f.severity >= Severity::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_new() {
        let summary = SummaryCounts::new(12);
        assert_eq!(summary.total, 12);
        assert_eq!(summary.vulnerable, 0);
        assert_eq!(summary.critical + summary.high + summary.moderate + summary.low, 0);
    }

    #[test]
    fn test_summary_record() {
        let mut summary = SummaryCounts::new(3);
        summary.record(Severity::High);
        summary.record(Severity::High);
        summary.record(Severity::Low);

        assert_eq!(summary.count(Severity::High), 2);
        assert_eq!(summary.count(Severity::Low), 1);
        assert_eq!(summary.count(Severity::Critical), 0);
    }

    #[test]
    fn test_summary_serializes_flat() {
        let json = serde_json::to_value(SummaryCounts::new(4)).unwrap();
        assert_eq!(json["total"], 4);
        assert_eq!(json["moderate"], 0);
    }
}
