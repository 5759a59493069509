//! Fix planning for direct dependencies
//!
//! A plan is only produced for a finding whose package is declared in the
//! manifest and whose patched range names a release newer than the
//! installed version. The target is the version of the first qualifying
//! comma-separated clause, not the highest one.

use crate::domain::{ApplyOutcome, Finding, FixPlan};
use crate::manifest::PackageManifest;
use crate::version;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// How a dependency should be moved to its target version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStrategy {
    /// Specifier written to the manifest
    pub target_range: String,
    pub reason: String,
    pub breaking: bool,
}

/// Plans produced for a batch of findings
#[derive(Debug, Clone, Default)]
pub struct PlanSet<'a> {
    /// At most one plan per package, in first-seen order
    pub plans: Vec<FixPlan>,
    /// Findings no plan could be produced for
    pub unfixable: Vec<&'a Finding>,
}

/// Plans and applies version updates for vulnerable direct dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct RemediationPlanner;

impl RemediationPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Splits findings into candidates for automatic fixing and the rest
    ///
    /// A candidate is a direct dependency with a known patched range.
    pub fn partition<'a>(&self, findings: &'a [Finding]) -> (Vec<&'a Finding>, Vec<&'a Finding>) {
        findings.iter().partition(|finding| finding.is_fixable())
    }

    /// Computes the fix plan for one finding
    pub fn plan_fix(&self, finding: &Finding, manifest: &PackageManifest) -> Option<FixPlan> {
        let Some((kind, current_range)) = manifest.find_declaration(&finding.package) else {
            debug!(package = %finding.package, "not declared in manifest, skipping");
            return None;
        };

        let current_version = finding.installed_version.as_deref()?;
        let target_version =
            find_best_patched_version(current_version, finding.known_patched_range())?;
        let strategy = determine_update_strategy(current_version, &target_version);

        Some(FixPlan {
            package_name: finding.package.clone(),
            current_version: current_version.to_string(),
            current_range: current_range.to_string(),
            target_version,
            target_range: strategy.target_range,
            declaration_kind: kind,
            severity: finding.severity,
            reason: strategy.reason,
            breaking: strategy.breaking,
        })
    }

    /// Plans every fixable finding against the manifest
    ///
    /// Each fixable finding still gets its own [`plan_fix`](Self::plan_fix)
    /// call. When several findings concern one package, their plans are
    /// merged before anything is applied: the highest target version is
    /// kept, with the highest severity among them.
    pub fn plan_all<'a>(&self, findings: &'a [Finding], manifest: &PackageManifest) -> PlanSet<'a> {
        let (fixable, mut unfixable) = self.partition(findings);
        let mut plans: Vec<FixPlan> = Vec::new();

        for finding in fixable {
            let Some(plan) = self.plan_fix(finding, manifest) else {
                unfixable.push(finding);
                continue;
            };

            match plans.iter_mut().find(|p| p.package_name == plan.package_name) {
                Some(existing) => merge_plan(existing, plan),
                None => plans.push(plan),
            }
        }

        PlanSet { plans, unfixable }
    }

    /// Rewrites manifest specifiers for each plan
    ///
    /// A plan that cannot be applied is reported and does not stop the rest.
    pub fn apply_plans(
        &self,
        manifest: &mut PackageManifest,
        plans: &[FixPlan],
    ) -> Vec<ApplyOutcome> {
        plans
            .iter()
            .map(|plan| {
                let applied = manifest.set_specifier(
                    plan.declaration_kind,
                    &plan.package_name,
                    &plan.target_range,
                );
                match applied {
                    Ok(()) => ApplyOutcome::Applied {
                        package: plan.package_name.clone(),
                        kind: plan.declaration_kind,
                    },
                    Err(e) => {
                        warn!(package = %plan.package_name, error = %e, "failed to apply fix");
                        ApplyOutcome::Failed {
                            package: plan.package_name.clone(),
                            message: e.to_string(),
                        }
                    }
                }
            })
            .collect()
    }
}

/// First version named by a patched-range clause that is newer than `current`
///
/// Clauses are separated by commas. Each contributes the first bare
/// `X.Y.Z` it contains; clauses without one, or whose version cannot be
/// compared, are skipped.
pub fn find_best_patched_version(current: &str, patched_range: Option<&str>) -> Option<String> {
    let patched_range = patched_range?;

    for clause in patched_range.split(',') {
        let Some(candidate) = version::extract_version(clause) else {
            continue;
        };

        match version::greater_than(candidate, current) {
            Ok(true) => return Some(candidate.to_string()),
            Ok(false) => {}
            Err(e) => {
                warn!(current, candidate, error = %e, "could not compare versions");
            }
        }
    }

    None
}

/// Classifies the move from `current` to `target`
pub fn determine_update_strategy(current: &str, target: &str) -> UpdateStrategy {
    let majors = version::major_of(current).and_then(|c| Ok((c, version::major_of(target)?)));

    match majors {
        Ok((current_major, target_major)) if current_major == target_major => UpdateStrategy {
            target_range: format!("^{target}"),
            reason: format!("Update to patched version {target}"),
            breaking: false,
        },
        Ok(_) => UpdateStrategy {
            target_range: format!("^{target}"),
            reason: format!("Major version update to {target} (may contain breaking changes)"),
            breaking: true,
        },
        Err(e) => {
            warn!(current, target, error = %e, "could not classify update");
            UpdateStrategy {
                target_range: target.to_string(),
                reason: format!("Update to specific version {target}"),
                breaking: true,
            }
        }
    }
}

fn merge_plan(existing: &mut FixPlan, candidate: FixPlan) {
    let severity = existing.severity.max(candidate.severity);
    let newer = matches!(
        version::compare(&candidate.target_version, &existing.target_version),
        Ok(Ordering::Greater)
    );
    if newer {
        *existing = candidate;
    }
    existing.severity = severity;
}
