//! Findings: advisories matched against installed dependencies

use super::advisory::known_patched;
use super::{AdvisoryRecord, DeclarationKind, ResolvedDependency, Severity};
use serde::{Deserialize, Serialize};

/// An advisory that applies to the installed version of a dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    /// Affected package name
    pub package: String,
    pub installed_version: Option<String>,
    pub severity: Severity,
    pub title: String,
    pub overview: String,
    pub recommendation: String,
    pub vulnerable_versions: String,
    pub patched_versions: Option<String>,
    pub references: Vec<String>,
    pub is_direct: bool,
    #[serde(rename = "dependencyType")]
    pub declaration_kind: DeclarationKind,
    pub source: String,
}

impl Finding {
    /// Builds a finding from the matching advisory and dependency
    pub fn new(advisory: &AdvisoryRecord, dependency: &ResolvedDependency) -> Self {
        Self {
            id: advisory.id.clone(),
            package: advisory.package_name.clone(),
            installed_version: dependency.installed_version.clone(),
            severity: advisory.severity,
            title: advisory.title.clone(),
            overview: advisory.overview.clone(),
            recommendation: advisory.recommendation.clone(),
            vulnerable_versions: advisory.vulnerable_version_range.clone(),
            patched_versions: advisory.patched_version_range.clone(),
            references: advisory.references.clone(),
            is_direct: dependency.is_direct,
            declaration_kind: dependency.declaration_kind,
            source: advisory.source.clone(),
        }
    }

    /// Patched range unless absent or `unknown`
    pub fn known_patched_range(&self) -> Option<&str> {
        known_patched(self.patched_versions.as_deref())
    }

    /// Direct dependency with a usable patched range
    pub fn is_fixable(&self) -> bool {
        self.is_direct && self.known_patched_range().is_some()
    }
}
