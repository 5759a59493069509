//! Remediation plans for direct dependencies

use super::{DeclarationKind, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A proposed, not yet applied, version update for one direct dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixPlan {
    pub package_name: String,
    pub current_version: String,
    /// Specifier currently written in package.json
    pub current_range: String,
    pub target_version: String,
    /// Specifier to write back
    pub target_range: String,
    pub declaration_kind: DeclarationKind,
    pub severity: Severity,
    pub reason: String,
    pub breaking: bool,
}

impl fmt::Display for FixPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.package_name, self.current_range, self.target_range
        )
    }
}

/// Outcome of applying one plan to the in-memory manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The specifier was rewritten
    Applied { package: String, kind: DeclarationKind },
    /// The specifier could not be rewritten
    Failed { package: String, message: String },
}

impl ApplyOutcome {
    /// Returns true if the plan was applied
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }

    /// Package the outcome refers to
    pub fn package(&self) -> &str {
        match self {
            ApplyOutcome::Applied { package, .. } | ApplyOutcome::Failed { package, .. } => package,
        }
    }
}
