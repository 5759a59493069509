//! Advisory database read from a local JSON file
//!
//! The file holds either an array of advisories or an object with
//! `advisories` and an optional `alternatives` map. Advisory fields accept
//! both camelCase names and the npm feed names (`module_name`,
//! `vulnerable_versions`, `patched_versions`).

use super::VulnerabilityDatabase;
use crate::domain::{AdvisoryRecord, PackageAlternative, ResolvedDependency};
use crate::error::DatabaseError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const SOURCE: &str = "local";

#[derive(Deserialize)]
#[serde(untagged)]
enum AdvisoryFile {
    List(Vec<AdvisoryRecord>),
    Full {
        advisories: Vec<AdvisoryRecord>,
        #[serde(default)]
        alternatives: BTreeMap<String, Vec<PackageAlternative>>,
    },
}

/// In-memory advisory set
#[derive(Debug, Clone, Default)]
pub struct LocalAdvisoryDatabase {
    advisories: Vec<AdvisoryRecord>,
    alternatives: BTreeMap<String, Vec<PackageAlternative>>,
}

impl LocalAdvisoryDatabase {
    pub fn new(advisories: Vec<AdvisoryRecord>) -> Self {
        Self {
            advisories,
            alternatives: BTreeMap::new(),
        }
    }

    /// Adds alternatives for one package (builder pattern)
    pub fn with_alternatives(
        mut self,
        package: impl Into<String>,
        alternatives: Vec<PackageAlternative>,
    ) -> Self {
        self.alternatives.insert(package.into(), alternatives);
        self
    }

    /// Parses advisory file content
    pub fn from_json(content: &str, origin: &str) -> Result<Self, DatabaseError> {
        let file: AdvisoryFile = serde_json::from_str(content)
            .map_err(|e| DatabaseError::invalid_response("advisories", origin, e.to_string()))?;

        let (mut advisories, alternatives) = match file {
            AdvisoryFile::List(advisories) => (advisories, BTreeMap::new()),
            AdvisoryFile::Full {
                advisories,
                alternatives,
            } => (advisories, alternatives),
        };

        for advisory in &mut advisories {
            if advisory.source.is_empty() {
                advisory.source = SOURCE.to_string();
            }
        }

        Ok(Self {
            advisories,
            alternatives,
        })
    }

    /// Reads an advisory file
    pub fn from_file(path: &Path) -> Result<Self, DatabaseError> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DatabaseError::network_error("advisories", &origin, e.to_string()))?;
        Self::from_json(&content, &origin)
    }

    pub fn len(&self) -> usize {
        self.advisories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.advisories.is_empty()
    }
}

#[async_trait]
impl VulnerabilityDatabase for LocalAdvisoryDatabase {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn get_vulnerabilities(
        &self,
        dependencies: &[ResolvedDependency],
    ) -> Result<Vec<AdvisoryRecord>, DatabaseError> {
        let names: HashSet<&str> = dependencies.iter().map(|d| d.name.as_str()).collect();
        Ok(self
            .advisories
            .iter()
            .filter(|a| names.contains(a.package_name.as_str()))
            .cloned()
            .collect())
    }

    async fn get_package_alternatives(
        &self,
        package: &str,
    ) -> Result<Vec<PackageAlternative>, DatabaseError> {
        Ok(self.alternatives.get(package).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeclarationKind, Severity};

    #[test]
    fn test_from_json_list_with_feed_names() {
        let db = LocalAdvisoryDatabase::from_json(
            r#"[{
                "id": "GHSA-jf85-cpcp-j695",
                "module_name": "lodash",
                "severity": "high",
                "title": "Prototype Pollution in lodash",
                "vulnerable_versions": "<4.17.21",
                "patched_versions": ">=4.17.21"
            }]"#,
            "test",
        )
        .unwrap();

        assert_eq!(db.len(), 1);
        let advisory = &db.advisories[0];
        assert_eq!(advisory.package_name, "lodash");
        assert_eq!(advisory.severity, Severity::High);
        assert_eq!(advisory.source, "local");
    }

    #[test]
    fn test_from_json_full_document() {
        let db = LocalAdvisoryDatabase::from_json(
            r#"{
                "advisories": [{
                    "id": "1",
                    "packageName": "request",
                    "severity": "moderate",
                    "vulnerableVersionRange": "<=2.88.2",
                    "patchedVersionRange": "unknown",
                    "source": "github"
                }],
                "alternatives": {
                    "request": [{ "name": "axios", "quality": 0.9, "stars": 0.9, "downloads": 5 }]
                }
            }"#,
            "test",
        )
        .unwrap();

        assert_eq!(db.advisories[0].source, "github");
        assert_eq!(db.alternatives["request"][0].name, "axios");
    }

    #[test]
    fn test_from_json_numeric_ids() {
        let db = LocalAdvisoryDatabase::from_json(
            r#"[
                { "id": 1179, "module_name": "minimist", "severity": "low", "vulnerable_versions": "<0.2.1" },
                { "id": "GHSA-35jh-r3h4-6jhm", "module_name": "lodash", "severity": "high", "vulnerable_versions": "<4.17.21" }
            ]"#,
            "test",
        )
        .unwrap();

        assert_eq!(db.len(), 2);
        assert_eq!(db.advisories[0].id, "1179");
        assert_eq!(db.advisories[1].id, "GHSA-35jh-r3h4-6jhm");
    }

    #[test]
    fn test_from_json_invalid() {
        let err = LocalAdvisoryDatabase::from_json("{\"nope\": 1}", "test").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_get_vulnerabilities_filters_by_name() {
        let db = LocalAdvisoryDatabase::new(vec![
            AdvisoryRecord::new("1", "lodash", Severity::High, "<4.17.21"),
            AdvisoryRecord::new("2", "minimist", Severity::Critical, "<1.2.6"),
        ]);
        let deps = vec![ResolvedDependency::direct(
            "lodash",
            "4.17.20",
            DeclarationKind::Dependencies,
        )];

        let advisories = db.get_vulnerabilities(&deps).await.unwrap();
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].id, "1");
    }

    #[tokio::test]
    async fn test_get_package_alternatives_unknown_package() {
        let db = LocalAdvisoryDatabase::default();
        assert!(db.get_package_alternatives("left-pad").await.unwrap().is_empty());
    }
}
