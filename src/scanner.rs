//! Scan orchestration
//!
//! This module provides:
//! - Workflow coordination: parse → fetch advisories → match → alternatives
//! - Bounded parallel alternatives lookup
//! - Per-package failure isolation for the alternatives phase

use crate::database::VulnerabilityDatabase;
use crate::domain::{
    AdvisoryRecord, Finding, PackageAlternative, ResolvedDependency, ScanResult, Severity,
};
use crate::error::{AppError, DatabaseError};
use crate::manifest::ManifestParser;
use crate::matcher::{MatchOutcome, VulnerabilityMatcher};
use crate::progress::Progress;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Maximum number of vulnerable packages queried for alternatives
pub const MAX_ALTERNATIVE_PACKAGES: usize = 5;

/// Concurrency limit for alternatives requests
pub const ALTERNATIVES_CONCURRENCY: usize = 5;

/// Options for one scan
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Project directory containing package.json
    pub path: PathBuf,
    /// Findings below this severity are dropped
    pub min_severity: Severity,
    /// Look up alternative packages for vulnerable dependencies
    pub alternatives: bool,
    /// Show spinners on stderr
    pub show_progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            min_severity: Severity::Low,
            alternatives: false,
            show_progress: false,
        }
    }
}

impl ScanOptions {
    /// Options for scanning `path` with defaults otherwise
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    pub fn with_alternatives(mut self, enabled: bool) -> Self {
        self.alternatives = enabled;
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }
}

/// Scanner for one project directory
pub struct Scanner {
    options: ScanOptions,
    database: Arc<dyn VulnerabilityDatabase>,
}

impl Scanner {
    /// Create a scanner backed by `database`
    pub fn new(options: ScanOptions, database: Arc<dyn VulnerabilityDatabase>) -> Self {
        Self { options, database }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Runs the scan
    ///
    /// A missing manifest or a failed advisory lookup aborts the scan.
    /// Alternatives lookup failures only drop that package's suggestions.
    pub async fn scan(&self) -> Result<ScanResult, AppError> {
        let mut progress = Progress::new(self.options.show_progress);

        progress.spinner("Reading package.json...");
        let parser = ManifestParser::new(&self.options.path);
        let dependencies = parser.get_all_dependencies()?;
        progress.finish_and_clear();
        info!(
            path = %self.options.path.display(),
            dependencies = dependencies.len(),
            "resolved dependencies"
        );

        progress.spinner("Fetching vulnerability data...");
        let advisories = self.database.get_vulnerabilities(&dependencies).await?;
        progress.finish_and_clear();
        debug!(
            advisories = advisories.len(),
            database = self.database.name(),
            "fetched advisories"
        );

        let MatchOutcome { findings, summary } = self.analyze(&dependencies, &advisories);
        info!(findings = findings.len(), "matched advisories");

        let alternatives = if self.options.alternatives && !findings.is_empty() {
            self.collect_alternatives(&findings, &mut progress).await
        } else {
            BTreeMap::new()
        };

        Ok(ScanResult {
            summary,
            vulnerabilities: findings,
            dependencies,
            alternatives,
            scanned_at: Utc::now(),
        })
    }

    /// Matches advisories against dependencies using the configured threshold
    pub fn analyze(
        &self,
        dependencies: &[ResolvedDependency],
        advisories: &[AdvisoryRecord],
    ) -> MatchOutcome {
        VulnerabilityMatcher::new(self.options.min_severity).match_all(dependencies, advisories)
    }

    /// Alternatives for a single package
    pub async fn find_alternatives(
        &self,
        package: &str,
    ) -> Result<Vec<PackageAlternative>, DatabaseError> {
        self.database.get_package_alternatives(package).await
    }

    async fn collect_alternatives(
        &self,
        findings: &[Finding],
        progress: &mut Progress,
    ) -> BTreeMap<String, Vec<PackageAlternative>> {
        let packages = packages_for_alternatives(findings);
        let semaphore = Arc::new(Semaphore::new(ALTERNATIVES_CONCURRENCY));
        let mut tasks = JoinSet::new();

        progress.start(packages.len() as u64, "Finding alternatives");

        for package in packages {
            let database = Arc::clone(&self.database);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = database.get_package_alternatives(&package).await;
                (package, result)
            });
        }

        let mut alternatives = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((package, Ok(found))) => {
                    if !found.is_empty() {
                        alternatives.insert(package, found);
                    }
                }
                Ok((package, Err(e))) => {
                    warn!(package = %package, error = %e, "failed to fetch alternatives");
                }
                Err(e) => {
                    warn!(error = %e, "alternatives lookup task failed");
                }
            }
            progress.inc();
        }
        progress.finish_and_clear();

        alternatives
    }
}

/// Unique finding packages in first-seen order, capped
fn packages_for_alternatives(findings: &[Finding]) -> Vec<String> {
    let mut seen = HashSet::new();
    findings
        .iter()
        .filter(|f| seen.insert(f.package.as_str()))
        .take(MAX_ALTERNATIVE_PACKAGES)
        .map(|f| f.package.clone())
        .collect()
}
