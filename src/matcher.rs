//! Matching of resolved dependencies against advisories
//!
//! Every advisory is looked up by exact package name. An advisory produces
//! one finding when the installed version lies in its vulnerable range and
//! its severity meets the configured minimum. Findings are never merged, so
//! two advisories for one package yield two findings.

use crate::domain::{AdvisoryRecord, Finding, ResolvedDependency, Severity, SummaryCounts};
use crate::manifest::is_version_vulnerable;
use std::collections::HashMap;

/// Findings together with their counts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    pub findings: Vec<Finding>,
    pub summary: SummaryCounts,
}

/// Matches dependencies against an advisory feed
#[derive(Debug, Clone, Copy, Default)]
pub struct VulnerabilityMatcher {
    min_severity: Severity,
}

impl VulnerabilityMatcher {
    /// Create a matcher that drops advisories below `min_severity`
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }

    /// Minimum severity reported
    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }

    /// Produces one finding per matching advisory, in advisory order
    pub fn match_all(
        &self,
        dependencies: &[ResolvedDependency],
        advisories: &[AdvisoryRecord],
    ) -> MatchOutcome {
        let by_name: HashMap<&str, &ResolvedDependency> = dependencies
            .iter()
            .map(|dep| (dep.name.as_str(), dep))
            .collect();

        let mut summary = SummaryCounts::new(dependencies.len());
        let mut findings = Vec::new();

        for advisory in advisories {
            let Some(dependency) = by_name.get(advisory.package_name.as_str()) else {
                continue;
            };

            if !is_version_vulnerable(dependency.installed(), &advisory.vulnerable_version_range) {
                continue;
            }

            if !advisory.severity.meets(self.min_severity) {
                continue;
            }

            summary.record(advisory.severity);
            findings.push(Finding::new(advisory, dependency));
        }

        summary.vulnerable = findings.len();

        MatchOutcome { findings, summary }
    }
}
