//! Remediation of vulnerable direct dependencies
//!
//! This module provides:
//! - Fix planning: target version selection and breaking-change classification
//! - A backup/restore transaction around file mutations
//! - The auto-fixer that writes plans back and regenerates the lock file

mod fixer;
mod planner;
mod transaction;

pub use fixer::{AutoFixer, FixReport};
pub use planner::{
    determine_update_strategy, find_best_patched_version, PlanSet, RemediationPlanner,
    UpdateStrategy,
};
pub use transaction::{backup_path, ManifestTransaction, BACKUP_SUFFIX};
