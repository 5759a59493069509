//! Core domain models for vuln-scan
//!
//! This module contains the fundamental types used throughout the application:
//! - Severity levels and their ranking
//! - Resolved dependency records and declaration kinds
//! - Advisory records from the vulnerability database
//! - Findings, fix plans and alternatives
//! - Summary and result structures

mod advisory;
mod alternative;
mod dependency;
mod finding;
mod fix_plan;
mod severity;
mod summary;

pub use advisory::{AdvisoryId, AdvisoryRecord, UNKNOWN_PATCHED_RANGE};
pub use alternative::PackageAlternative;
pub use dependency::{DeclarationKind, ResolvedDependency};
pub use finding::Finding;
pub use fix_plan::{ApplyOutcome, FixPlan};
pub use severity::Severity;
pub use summary::{ScanResult, SummaryCounts};
