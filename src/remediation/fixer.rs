//! Applying fix plans to a project directory

use super::planner::{PlanSet, RemediationPlanner};
use super::transaction::ManifestTransaction;
use crate::domain::{ApplyOutcome, Finding, FixPlan};
use crate::error::{FixError, ManifestError};
use crate::manifest::{ManifestParser, ManifestWriter};
use crate::package_manager::{
    regenerate_lockfile, InstallResult, PackageManagerRunner, SystemPackageManager,
};
use std::path::PathBuf;
use tracing::{info, warn};

/// What a fix run changed
#[derive(Debug, Clone, Default)]
pub struct FixReport {
    /// One outcome per plan, in plan order
    pub outcomes: Vec<ApplyOutcome>,
    /// Whether package.json was rewritten
    pub manifest_written: bool,
    /// Successful installer result, if the lock file was regenerated
    pub install: Option<InstallResult>,
}

impl FixReport {
    /// Number of plans applied
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_applied()).count()
    }

    /// Number of plans that could not be applied
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.applied_count()
    }

    /// Returns true if the installer ran and succeeded
    pub fn lockfile_regenerated(&self) -> bool {
        self.install.as_ref().is_some_and(|r| r.success)
    }
}

/// Applies fix plans to one project, with backup and restore
pub struct AutoFixer<R = SystemPackageManager> {
    parser: ManifestParser,
    planner: RemediationPlanner,
    runner: R,
    dry_run: bool,
    regenerate_lock: bool,
}

impl AutoFixer<SystemPackageManager> {
    /// Create a fixer that regenerates the lock file with `npm install`
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self::with_runner(project_path, SystemPackageManager::new())
    }
}

impl<R: PackageManagerRunner> AutoFixer<R> {
    /// Create a fixer with a custom installer
    pub fn with_runner(project_path: impl Into<PathBuf>, runner: R) -> Self {
        Self {
            parser: ManifestParser::new(project_path),
            planner: RemediationPlanner::new(),
            runner,
            dry_run: false,
            regenerate_lock: true,
        }
    }

    /// Plan and apply in memory only
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether to regenerate the lock file after writing the manifest
    pub fn with_lock_regeneration(mut self, enabled: bool) -> Self {
        self.regenerate_lock = enabled;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Plans fixes for `findings` against the current manifest
    pub fn plan<'a>(&self, findings: &'a [Finding]) -> Result<PlanSet<'a>, ManifestError> {
        let manifest = self.parser.parse_manifest()?;
        Ok(self.planner.plan_all(findings, &manifest))
    }

    /// Applies `plans` to the project
    ///
    /// package.json and package-lock.json are backed up first and restored
    /// if anything fails, including an unsuccessful install.
    pub fn fix(&self, plans: &[FixPlan]) -> Result<FixReport, FixError> {
        let mut manifest = self.parser.parse_manifest()?;

        if self.dry_run {
            let outcomes = self.planner.apply_plans(&mut manifest, plans);
            return Ok(FixReport {
                outcomes,
                ..FixReport::default()
            });
        }

        let files = [self.parser.manifest_path(), self.parser.lockfile_path()];
        ManifestTransaction::run(&files, || {
            let mut report = FixReport {
                outcomes: self.planner.apply_plans(&mut manifest, plans),
                ..FixReport::default()
            };

            if report.applied_count() == 0 {
                return Ok(report);
            }

            report.manifest_written = ManifestWriter::new(false).write(&manifest)?;
            info!(
                applied = report.applied_count(),
                path = %manifest.path().display(),
                "manifest updated"
            );

            if self.regenerate_lock {
                let install = regenerate_lockfile(&self.runner, self.parser.project_path())?;
                if !install.success {
                    warn!(
                        command = %install.command,
                        stderr = %install.stderr.trim(),
                        "lock file regeneration failed"
                    );
                    return Err(FixError::Install {
                        command: install.command,
                        stderr: install.stderr.trim().to_string(),
                    });
                }
                report.install = Some(install);
            }

            Ok(report)
        })
    }
}
