//! npm advisory database
//!
//! Advisories come from the registry "quick audit" endpoint:
//! `POST {registry}/-/npm/v1/security/audits/quick`
//!
//! Alternatives come from the npms.io search API:
//! `GET {search}/v2/search?q={package}&size=10`, with weekly downloads from
//! `GET {downloads}/downloads/point/last-week/{package}`.

use super::{HttpClient, VulnerabilityDatabase};
use crate::domain::{
    AdvisoryId, AdvisoryRecord, PackageAlternative, ResolvedDependency, Severity,
};
use crate::error::DatabaseError;
use crate::version;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// npm registry base URL
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// npms.io search API base URL
pub const DEFAULT_SEARCH_URL: &str = "https://api.npms.io";

/// npm downloads API base URL
pub const DEFAULT_DOWNLOADS_URL: &str = "https://api.npmjs.org";

/// Maximum alternatives returned per package
pub const MAX_ALTERNATIVES: usize = 5;

const SEARCH_SIZE: &str = "10";
const AUDIT_PROJECT_NAME: &str = "vuln-scan-audit";
const SOURCE: &str = "npm";

/// Advisory database backed by the npm registry and npms.io
pub struct NpmAuditDatabase {
    client: HttpClient,
    registry_url: String,
    search_url: String,
    downloads_url: String,
}

/// Quick audit request body
#[derive(Debug, Serialize)]
struct AuditRequest<'a> {
    name: &'a str,
    version: &'a str,
    requires: BTreeMap<&'a str, &'a str>,
    dependencies: BTreeMap<&'a str, AuditDependency<'a>>,
}

#[derive(Debug, Serialize)]
struct AuditDependency<'a> {
    version: &'a str,
}

/// Quick audit response
#[derive(Debug, Deserialize)]
struct AuditResponse {
    #[serde(default)]
    advisories: BTreeMap<String, NpmAdvisory>,
}

#[derive(Debug, Deserialize)]
struct NpmAdvisory {
    id: AdvisoryId,
    #[serde(default)]
    github_advisory_id: Option<String>,
    module_name: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    recommendation: String,
    vulnerable_versions: String,
    #[serde(default)]
    patched_versions: Option<String>,
    /// Markdown list as one string, or a plain array
    #[serde(default)]
    references: Value,
    #[serde(default)]
    url: Option<String>,
}

/// npms.io search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    package: SearchPackage,
    #[serde(default)]
    score: SearchScore,
}

#[derive(Debug, Deserialize)]
struct SearchPackage {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchScore {
    #[serde(default)]
    detail: ScoreDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ScoreDetail {
    #[serde(default)]
    quality: f64,
    #[serde(default)]
    popularity: f64,
}

#[derive(Debug, Deserialize)]
struct DownloadsResponse {
    #[serde(default)]
    downloads: u64,
}

impl NpmAuditDatabase {
    /// Create a database using the public npm services
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            downloads_url: DEFAULT_DOWNLOADS_URL.to_string(),
        }
    }

    /// Override the registry base URL
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = trim_base(url.into());
        self
    }

    /// Override the search API base URL
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = trim_base(url.into());
        self
    }

    /// Override the downloads API base URL
    pub fn with_downloads_url(mut self, url: impl Into<String>) -> Self {
        self.downloads_url = trim_base(url.into());
        self
    }

    fn audit_url(&self) -> String {
        format!("{}/-/npm/v1/security/audits/quick", self.registry_url)
    }

    fn search_endpoint(&self, package: &str) -> Result<Url, DatabaseError> {
        Url::parse_with_params(
            &format!("{}/v2/search", self.search_url),
            &[("q", package), ("size", SEARCH_SIZE)],
        )
        .map_err(|e| DatabaseError::invalid_response(package, "npms.io", e.to_string()))
    }

    fn downloads_endpoint(&self, package: &str) -> String {
        format!(
            "{}/downloads/point/last-week/{}",
            self.downloads_url, package
        )
    }

    async fn weekly_downloads(&self, package: &str) -> u64 {
        match self
            .client
            .get_json::<DownloadsResponse>(&self.downloads_endpoint(package), package, "npm downloads")
            .await
        {
            Ok(response) => response.downloads,
            Err(e) => {
                debug!(package, error = %e, "download count unavailable");
                0
            }
        }
    }
}

#[async_trait]
impl VulnerabilityDatabase for NpmAuditDatabase {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn get_vulnerabilities(
        &self,
        dependencies: &[ResolvedDependency],
    ) -> Result<Vec<AdvisoryRecord>, DatabaseError> {
        let request = build_audit_request(dependencies);
        if request.dependencies.is_empty() {
            debug!("no concrete versions to audit");
            return Ok(Vec::new());
        }

        let response: AuditResponse = self
            .client
            .post_json(&self.audit_url(), &request, "advisories", self.name())
            .await?;

        Ok(response
            .advisories
            .into_values()
            .map(NpmAdvisory::into_record)
            .collect())
    }

    async fn get_package_alternatives(
        &self,
        package: &str,
    ) -> Result<Vec<PackageAlternative>, DatabaseError> {
        let url = self.search_endpoint(package)?;
        let response: SearchResponse = self
            .client
            .get_json(url.as_str(), package, "npms.io")
            .await?;

        let mut alternatives = Vec::new();
        for result in response
            .results
            .into_iter()
            .filter(|r| r.package.name != package)
            .take(MAX_ALTERNATIVES)
        {
            let downloads = self.weekly_downloads(&result.package.name).await;
            alternatives.push(PackageAlternative {
                name: result.package.name,
                description: result.package.description.unwrap_or_default(),
                quality: result.score.detail.quality,
                stars: result.score.detail.popularity,
                downloads,
            });
        }

        Ok(alternatives)
    }
}

/// Audit payload listing every dependency with a concrete version
fn build_audit_request(dependencies: &[ResolvedDependency]) -> AuditRequest<'_> {
    let mut requires = BTreeMap::new();
    let mut audited = BTreeMap::new();

    for dep in dependencies {
        let Some(installed) = dep.installed().filter(|v| version::is_exact(v)) else {
            continue;
        };
        if dep.is_direct {
            requires.insert(dep.name.as_str(), installed);
        }
        audited.insert(dep.name.as_str(), AuditDependency { version: installed });
    }

    AuditRequest {
        name: AUDIT_PROJECT_NAME,
        version: "0.0.0",
        requires,
        dependencies: audited,
    }
}

impl NpmAdvisory {
    fn into_record(self) -> AdvisoryRecord {
        let id = match (self.github_advisory_id, self.id) {
            (Some(ghsa), _) if !ghsa.is_empty() => ghsa,
            (_, id) => String::from(id),
        };

        let mut references = parse_references(&self.references);
        if let Some(url) = self.url.filter(|u| !u.is_empty()) {
            if !references.contains(&url) {
                references.push(url);
            }
        }

        AdvisoryRecord {
            id,
            package_name: self.module_name,
            severity: Severity::from_feed(&self.severity),
            title: self.title,
            overview: self.overview,
            recommendation: self.recommendation,
            vulnerable_version_range: self.vulnerable_versions,
            patched_version_range: self.patched_versions,
            references,
            source: SOURCE.to_string(),
        }
    }
}

fn parse_references(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => text
            .lines()
            .map(|line| line.trim().trim_start_matches('-').trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeclarationKind;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn database(server: &MockServer) -> NpmAuditDatabase {
        let client = HttpClient::with_config(Duration::from_secs(5), "test/1.0")
            .unwrap()
            .with_max_retries(0);
        NpmAuditDatabase::new(client)
            .with_registry_url(server.uri())
            .with_search_url(format!("{}/", server.uri()))
            .with_downloads_url(server.uri())
    }

    fn locked(name: &str, version: &str, direct: bool) -> ResolvedDependency {
        if direct {
            let mut dep = ResolvedDependency::direct(name, "^0", DeclarationKind::Dependencies);
            dep.installed_version = Some(version.to_string());
            dep
        } else {
            ResolvedDependency::transitive(name, Some(version.to_string()))
        }
    }

    #[test]
    fn test_build_audit_request_skips_ranges() {
        let deps = vec![
            locked("lodash", "4.17.20", true),
            locked("ms", "2.0.0", false),
            ResolvedDependency::direct("react", "^18.0.0", DeclarationKind::Dependencies),
        ];

        let request = build_audit_request(&deps);
        assert_eq!(request.requires.len(), 1);
        assert_eq!(request.requires["lodash"], "4.17.20");
        assert_eq!(request.dependencies.len(), 2);
        assert!(!request.dependencies.contains_key("react"));
    }

    #[test]
    fn test_parse_references() {
        let refs = parse_references(&json!("- https://a.example\n- https://b.example\n"));
        assert_eq!(refs, vec!["https://a.example", "https://b.example"]);

        let refs = parse_references(&json!(["https://c.example"]));
        assert_eq!(refs, vec!["https://c.example"]);

        assert!(parse_references(&Value::Null).is_empty());
    }

    #[test]
    fn test_into_record() {
        let advisory: NpmAdvisory = serde_json::from_value(json!({
            "id": 1523,
            "module_name": "lodash",
            "severity": "info",
            "title": "Prototype Pollution",
            "vulnerable_versions": "<4.17.19",
            "patched_versions": ">=4.17.19",
            "references": "- https://github.com/lodash/lodash/pull/4759",
            "url": "https://npmjs.com/advisories/1523"
        }))
        .unwrap();

        let record = advisory.into_record();
        assert_eq!(record.id, "1523");
        assert_eq!(record.package_name, "lodash");
        assert_eq!(record.severity, Severity::Low);
        assert_eq!(record.patched_version_range.as_deref(), Some(">=4.17.19"));
        assert_eq!(record.references.len(), 2);
        assert_eq!(record.source, "npm");
    }

    #[test]
    fn test_into_record_prefers_github_id() {
        let advisory: NpmAdvisory = serde_json::from_value(json!({
            "id": "x",
            "github_advisory_id": "GHSA-jf85-cpcp-j695",
            "module_name": "lodash",
            "vulnerable_versions": "<4.17.21"
        }))
        .unwrap();
        assert_eq!(advisory.into_record().id, "GHSA-jf85-cpcp-j695");
    }

    #[tokio::test]
    async fn test_get_vulnerabilities() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/-/npm/v1/security/audits/quick"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "advisories": {
                    "1523": {
                        "id": 1523,
                        "module_name": "lodash",
                        "severity": "high",
                        "title": "Prototype Pollution",
                        "vulnerable_versions": "<4.17.21",
                        "patched_versions": ">=4.17.21",
                        "references": "",
                        "url": "https://npmjs.com/advisories/1523"
                    }
                },
                "metadata": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let advisories = database(&server)
            .get_vulnerabilities(&[locked("lodash", "4.17.20", true)])
            .await
            .unwrap();

        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].severity, Severity::High);
        assert_eq!(advisories[0].vulnerable_version_range, "<4.17.21");
    }

    #[tokio::test]
    async fn test_get_vulnerabilities_without_concrete_versions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let deps = vec![ResolvedDependency::direct(
            "react",
            "^18.0.0",
            DeclarationKind::Dependencies,
        )];
        let advisories = database(&server).get_vulnerabilities(&deps).await.unwrap();
        assert!(advisories.is_empty());
    }

    #[tokio::test]
    async fn test_get_vulnerabilities_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = database(&server)
            .get_vulnerabilities(&[locked("lodash", "4.17.20", true)])
            .await;
        assert!(matches!(result, Err(DatabaseError::NetworkError { .. })));
    }

    #[tokio::test]
    async fn test_get_package_alternatives() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/search"))
            .and(query_param("q", "request"))
            .and(query_param("size", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    { "package": { "name": "request", "description": "itself" },
                      "score": { "detail": { "quality": 0.9, "popularity": 0.9 } } },
                    { "package": { "name": "axios", "description": "Promise based HTTP client" },
                      "score": { "detail": { "quality": 0.95, "popularity": 0.98 } } },
                    { "package": { "name": "got" },
                      "score": { "detail": { "quality": 0.8, "popularity": 0.7 } } }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/downloads/point/last-week/axios"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"downloads": 1000})))
            .mount(&server)
            .await;

        let alternatives = database(&server)
            .get_package_alternatives("request")
            .await
            .unwrap();

        assert_eq!(alternatives.len(), 2);
        assert_eq!(alternatives[0].name, "axios");
        assert_eq!(alternatives[0].downloads, 1000);
        assert_eq!(alternatives[0].quality_percent(), 95);
        assert_eq!(alternatives[1].name, "got");
        assert_eq!(alternatives[1].description, "");
        assert_eq!(alternatives[1].downloads, 0);
    }

    #[tokio::test]
    async fn test_get_package_alternatives_caps_results() {
        let server = MockServer::start().await;
        let results: Vec<Value> = (0..10)
            .map(|i| json!({ "package": { "name": format!("pkg-{i}") } }))
            .collect();
        Mock::given(method("GET"))
            .and(path("/v2/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
            .mount(&server)
            .await;

        let alternatives = database(&server)
            .get_package_alternatives("left-pad")
            .await
            .unwrap();
        assert_eq!(alternatives.len(), MAX_ALTERNATIVES);
    }
}
