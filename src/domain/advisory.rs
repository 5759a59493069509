//! Advisory records supplied by the vulnerability database

use super::Severity;
use serde::{Deserialize, Deserializer, Serialize};

/// Marker used by advisory feeds when no patched release exists
pub const UNKNOWN_PATCHED_RANGE: &str = "unknown";

/// A known vulnerability affecting a range of versions of one package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryRecord {
    /// npm feeds use numeric ids, GitHub advisories use `GHSA-...` strings
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(alias = "module_name")]
    pub package_name: String,
    pub severity: Severity,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(alias = "vulnerable_versions")]
    pub vulnerable_version_range: String,
    /// Comma-separated version expressions, or `unknown`
    #[serde(alias = "patched_versions", default)]
    pub patched_version_range: Option<String>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub source: String,
}

impl AdvisoryRecord {
    /// Creates an advisory with the required matching fields
    pub fn new(
        id: impl Into<String>,
        package_name: impl Into<String>,
        severity: Severity,
        vulnerable_version_range: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            package_name: package_name.into(),
            severity,
            title: String::new(),
            overview: String::new(),
            recommendation: String::new(),
            vulnerable_version_range: vulnerable_version_range.into(),
            patched_version_range: None,
            references: Vec::new(),
            source: String::new(),
        }
    }

    /// Sets the patched range (builder pattern)
    pub fn with_patched(mut self, range: impl Into<String>) -> Self {
        self.patched_version_range = Some(range.into());
        self
    }

    /// Sets the title (builder pattern)
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Returns the patched range unless it is absent or `unknown`
    pub fn known_patched_range(&self) -> Option<&str> {
        known_patched(self.patched_version_range.as_deref())
    }
}

/// Advisory id as it appears in a feed
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdvisoryId {
    Number(u64),
    Text(String),
}

impl From<AdvisoryId> for String {
    fn from(id: AdvisoryId) -> Self {
        match id {
            AdvisoryId::Number(n) => n.to_string(),
            AdvisoryId::Text(s) => s,
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    AdvisoryId::deserialize(deserializer).map(String::from)
}

/// Filters out absent and `unknown` patched ranges
pub(crate) fn known_patched(range: Option<&str>) -> Option<&str> {
    range
        .map(str::trim)
        .filter(|r| !r.is_empty() && *r != UNKNOWN_PATCHED_RANGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_npm_audit_shape() {
        let json = r#"{
            "id": "GHSA-jf85-cpcp-j695",
            "module_name": "lodash",
            "severity": "high",
            "title": "Prototype Pollution in lodash",
            "vulnerable_versions": "<4.17.21",
            "patched_versions": ">=4.17.21",
            "references": ["https://github.com/advisories/GHSA-jf85-cpcp-j695"],
            "source": "npm"
        }"#;

        let advisory: AdvisoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(advisory.package_name, "lodash");
        assert_eq!(advisory.severity, Severity::High);
        assert_eq!(advisory.vulnerable_version_range, "<4.17.21");
        assert_eq!(advisory.known_patched_range(), Some(">=4.17.21"));
        assert!(advisory.overview.is_empty());
    }

    #[test]
    fn test_deserialize_numeric_id() {
        let json = r#"{
            "id": 1179,
            "module_name": "minimist",
            "severity": "low",
            "vulnerable_versions": "<0.2.1"
        }"#;

        let advisory: AdvisoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(advisory.id, "1179");
        assert_eq!(advisory.package_name, "minimist");
    }

    #[test]
    fn test_deserialize_rejects_non_scalar_id() {
        let json = r#"{
            "id": ["1179"],
            "module_name": "minimist",
            "severity": "low",
            "vulnerable_versions": "<0.2.1"
        }"#;

        assert!(serde_json::from_str::<AdvisoryRecord>(json).is_err());
    }

    #[test]
    fn test_unknown_patched_range() {
        let advisory =
            AdvisoryRecord::new("1", "pkg", Severity::Low, "<1.0.0").with_patched("unknown");
        assert_eq!(advisory.known_patched_range(), None);

        let absent = AdvisoryRecord::new("2", "pkg", Severity::Low, "<1.0.0");
        assert_eq!(absent.known_patched_range(), None);
    }
}
