//! Vulnerability databases
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - npm quick-audit / npms.io database
//! - Offline database loaded from an advisory file

mod client;
mod local;
mod npm_audit;

pub use client::{HttpClient, DEFAULT_TIMEOUT, MAX_RETRIES};
pub use local::LocalAdvisoryDatabase;
pub use npm_audit::{
    NpmAuditDatabase, DEFAULT_DOWNLOADS_URL, DEFAULT_REGISTRY_URL, DEFAULT_SEARCH_URL,
    MAX_ALTERNATIVES,
};

use crate::domain::{AdvisoryRecord, PackageAlternative, ResolvedDependency};
use crate::error::DatabaseError;
use async_trait::async_trait;

/// Source of advisories and alternative package suggestions
#[async_trait]
pub trait VulnerabilityDatabase: Send + Sync {
    /// Name used in log output and error messages
    fn name(&self) -> &'static str;

    /// Advisories for the given dependencies
    ///
    /// May return advisories for packages not in the list; callers match by
    /// name.
    async fn get_vulnerabilities(
        &self,
        dependencies: &[ResolvedDependency],
    ) -> Result<Vec<AdvisoryRecord>, DatabaseError>;

    /// Packages suggested in place of `package`
    async fn get_package_alternatives(
        &self,
        package: &str,
    ) -> Result<Vec<PackageAlternative>, DatabaseError>;
}
