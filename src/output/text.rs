//! Table output formatter for human-readable display
//!
//! This module provides:
//! - Summary block with per-severity counts
//! - Aligned findings table
//! - Details for critical and high severity findings
//! - Alternative package listings
//! - Fix plan and fix report listings for the remediation flow

use crate::domain::{
    ApplyOutcome, Finding, FixPlan, PackageAlternative, ScanResult, Severity, SummaryCounts,
};
use crate::output::{OutputFormatter, Verbosity};
use crate::remediation::FixReport;
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::Write;

const TITLE_WIDTH: usize = 40;
const DETAIL_REFERENCES: usize = 2;
const RULE_WIDTH: usize = 50;

/// Table formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new table formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new table formatter with color option
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn heading(&self, text: &str, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.color {
            writeln!(writer, "\n{}", text.blue().bold())
        } else {
            writeln!(writer, "\n{}", text)
        }
    }

    fn severity_label(&self, severity: Severity, width: usize) -> String {
        let label = format!("{:width$}", severity.as_str().to_uppercase(), width = width);
        if !self.color {
            return label;
        }
        match severity {
            Severity::Critical => label.red().bold().to_string(),
            Severity::High => label.red().to_string(),
            Severity::Moderate => label.yellow().to_string(),
            Severity::Low => label.dimmed().to_string(),
        }
    }

    fn format_findings_table(
        &self,
        findings: &[Finding],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.heading("Vulnerabilities:", writer)?;

        let rows: Vec<[String; 4]> = findings
            .iter()
            .map(|f| {
                [
                    f.package.clone(),
                    installed_label(f).to_string(),
                    truncate_title(&f.title),
                    dependency_type(f).to_string(),
                ]
            })
            .collect();

        let width = |idx: usize, header: &str| {
            rows.iter()
                .map(|r| r[idx].chars().count())
                .max()
                .unwrap_or(0)
                .max(header.len())
        };
        let name_w = width(0, "Package");
        let version_w = width(1, "Version");
        let severity_w = "critical".len().max("Severity".len());
        let title_w = width(2, "Title");

        let header = format!(
            "  {:name_w$}  {:version_w$}  {:severity_w$}  {:title_w$}  {}",
            "Package",
            "Version",
            "Severity",
            "Title",
            "Type",
            name_w = name_w,
            version_w = version_w,
            severity_w = severity_w,
            title_w = title_w
        );
        if self.color {
            writeln!(writer, "{}", header.bold())?;
        } else {
            writeln!(writer, "{}", header)?;
        }
        writeln!(
            writer,
            "  {}",
            "-".repeat(name_w + version_w + severity_w + title_w + "Transitive".len() + 8)
        )?;

        for (finding, row) in findings.iter().zip(&rows) {
            writeln!(
                writer,
                "  {:name_w$}  {:version_w$}  {}  {:title_w$}  {}",
                row[0],
                row[1],
                self.severity_label(finding.severity, severity_w),
                row[2],
                row[3],
                name_w = name_w,
                version_w = version_w,
                title_w = title_w
            )?;
        }
        Ok(())
    }

    fn format_severe_details(
        &self,
        result: &ScanResult,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let severe: Vec<&Finding> = result.severe_findings().collect();
        if severe.is_empty() {
            return Ok(());
        }

        if self.color {
            writeln!(writer, "\n{}", "Critical & High Severity Details:".red().bold())?;
        } else {
            writeln!(writer, "\nCritical & High Severity Details:")?;
        }

        for finding in severe {
            let version = installed_label(finding);
            if self.color {
                writeln!(
                    writer,
                    "\n{} {} ({})",
                    "●".red().bold(),
                    finding.package.white().bold(),
                    version
                )?;
                writeln!(
                    writer,
                    "  {} {}",
                    "Severity:".red(),
                    finding.severity.as_str().to_uppercase()
                )?;
            } else {
                writeln!(writer, "\n* {} ({})", finding.package, version)?;
                writeln!(
                    writer,
                    "  Severity: {}",
                    finding.severity.as_str().to_uppercase()
                )?;
            }
            writeln!(writer, "  Title: {}", finding.title)?;
            if self.verbosity == Verbosity::Verbose && !finding.overview.is_empty() {
                writeln!(writer, "  Overview: {}", finding.overview)?;
            }
            writeln!(writer, "  Recommendation: {}", finding.recommendation)?;
            if !finding.references.is_empty() {
                let refs: Vec<&str> = finding
                    .references
                    .iter()
                    .take(DETAIL_REFERENCES)
                    .map(String::as_str)
                    .collect();
                writeln!(writer, "  References: {}", refs.join(", "))?;
            }
        }
        Ok(())
    }

    /// Write alternatives for every package in the map, in key order
    pub fn format_alternatives(
        &self,
        alternatives: &BTreeMap<String, Vec<PackageAlternative>>,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if alternatives.is_empty() {
            return Ok(());
        }

        self.heading("Alternative Packages:", writer)?;
        for (package, alts) in alternatives {
            if self.color {
                writeln!(writer, "\n{} alternatives:", package.yellow().bold())?;
            } else {
                writeln!(writer, "\n{} alternatives:", package)?;
            }
            self.format_alternative_list(alts, writer)?;
        }
        Ok(())
    }

    /// Write the alternatives found for a single package
    pub fn format_package_alternatives(
        &self,
        package: &str,
        alternatives: &[PackageAlternative],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.heading(&format!("Alternatives for {}:", package), writer)?;
        if alternatives.is_empty() {
            writeln!(writer, "  No alternatives found.")?;
            return Ok(());
        }

        for alt in alternatives {
            if self.color {
                writeln!(writer, "  • {} - {}", alt.name.green(), alt.description)?;
                writeln!(
                    writer,
                    "    {}",
                    format!(
                        "Downloads: {} | Quality: {}% | Popularity: {}%",
                        alt.downloads,
                        alt.quality_percent(),
                        alt.popularity_percent()
                    )
                    .dimmed()
                )?;
            } else {
                writeln!(writer, "  * {} - {}", alt.name, alt.description)?;
                writeln!(
                    writer,
                    "    Downloads: {} | Quality: {}% | Popularity: {}%",
                    alt.downloads,
                    alt.quality_percent(),
                    alt.popularity_percent()
                )?;
            }
        }
        Ok(())
    }

    fn format_alternative_list(
        &self,
        alternatives: &[PackageAlternative],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        for (index, alt) in alternatives.iter().enumerate() {
            let name = if self.color {
                alt.name.green().to_string()
            } else {
                alt.name.clone()
            };
            writeln!(writer, "  {}. {} - {}", index + 1, name, alt.description)?;
            writeln!(
                writer,
                "     Quality: {}% | Popularity: {}%",
                alt.quality_percent(),
                alt.popularity_percent()
            )?;
        }
        Ok(())
    }

    /// Write the auto-fix analysis: planned updates and what needs manual work
    pub fn format_fix_analysis(
        &self,
        plans: &[FixPlan],
        unfixable: &[&Finding],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.heading("Auto-fix Analysis:", writer)?;

        if plans.is_empty() {
            writeln!(writer, "No automatically fixable vulnerabilities found.")?;
            if self.verbosity != Verbosity::Quiet {
                writeln!(
                    writer,
                    "Most vulnerabilities are in transitive dependencies or require manual intervention."
                )?;
            }
        } else {
            let count = plans.len().to_string();
            let count = if self.color {
                count.green().to_string()
            } else {
                count
            };
            writeln!(writer, "Found {} potentially fixable vulnerabilities.", count)?;

            let name_w = plans
                .iter()
                .map(|p| p.package_name.len())
                .max()
                .unwrap_or(0);
            for plan in plans {
                let marker = if plan.breaking { " (breaking)" } else { "" };
                if self.color {
                    writeln!(
                        writer,
                        "  {:name_w$} {} {} {}{}",
                        plan.package_name,
                        plan.current_range.dimmed(),
                        "→".dimmed(),
                        plan.target_range.bright_white().bold(),
                        marker.yellow(),
                        name_w = name_w
                    )?;
                } else {
                    writeln!(
                        writer,
                        "  {:name_w$} {} -> {}{}",
                        plan.package_name,
                        plan.current_range,
                        plan.target_range,
                        marker,
                        name_w = name_w
                    )?;
                }
                if self.verbosity == Verbosity::Verbose {
                    writeln!(writer, "    {}", plan.reason)?;
                }
            }
        }

        if !unfixable.is_empty() && self.verbosity != Verbosity::Quiet {
            writeln!(writer, "\nRequires manual intervention:")?;
            for finding in unfixable {
                writeln!(
                    writer,
                    "  {} ({}) {}",
                    finding.package,
                    dependency_type(finding),
                    finding.title
                )?;
            }
        }
        Ok(())
    }

    /// Write the outcome of an auto-fix run
    pub fn format_fix_report(
        &self,
        report: &FixReport,
        dry_run: bool,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let prefix = if dry_run { "[dry-run] " } else { "" };

        for outcome in &report.outcomes {
            match outcome {
                ApplyOutcome::Applied { package, kind } => {
                    let mark = if self.color {
                        "✓".green().to_string()
                    } else {
                        "ok".to_string()
                    };
                    writeln!(writer, "{}{} {} ({})", prefix, mark, package, kind.as_str())?;
                }
                ApplyOutcome::Failed { package, message } => {
                    let mark = if self.color {
                        "✗".red().to_string()
                    } else {
                        "failed".to_string()
                    };
                    writeln!(writer, "{}{} {}: {}", prefix, mark, package, message)?;
                }
            }
        }

        if let Some(install) = &report.install {
            writeln!(writer, "Regenerated package-lock.json ({})", install.command)?;
        }

        let line = format!(
            "{}Applied {} fix(es), {} failed",
            prefix,
            report.applied_count(),
            report.failed_count()
        );
        if self.color {
            writeln!(writer, "{}", line.bold())
        } else {
            writeln!(writer, "{}", line)
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &ScanResult, writer: &mut dyn Write) -> std::io::Result<()> {
        if self.verbosity != Verbosity::Quiet {
            self.heading("Vulnerability Scan Results", writer)?;
            writeln!(writer, "{}", "=".repeat(RULE_WIDTH))?;
        }
        self.format_summary(&result.summary, writer)?;

        if !result.has_findings() {
            if self.color {
                writeln!(writer, "\n{}", "No vulnerabilities found!".green().bold())?;
            } else {
                writeln!(writer, "\nNo vulnerabilities found!")?;
            }
            return Ok(());
        }

        self.format_findings_table(&result.vulnerabilities, writer)?;
        if self.verbosity != Verbosity::Quiet {
            self.format_severe_details(result, writer)?;
        }
        self.format_alternatives(&result.alternatives, writer)
    }

    fn format_summary(
        &self,
        summary: &SummaryCounts,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        writeln!(writer, "\nSummary:")?;
        if self.color {
            writeln!(
                writer,
                "Total dependencies: {}",
                summary.total.to_string().blue()
            )?;
            writeln!(
                writer,
                "Vulnerable packages: {}",
                summary.vulnerable.to_string().red()
            )?;
        } else {
            writeln!(writer, "Total dependencies: {}", summary.total)?;
            writeln!(writer, "Vulnerable packages: {}", summary.vulnerable)?;
        }

        for severity in Severity::all().iter().rev() {
            let count = summary.count(*severity);
            if count == 0 {
                continue;
            }
            let label = capitalize(severity.as_str());
            if self.color {
                let value = count.to_string();
                let value = match severity {
                    Severity::Critical => value.red().bold(),
                    Severity::High => value.red(),
                    Severity::Moderate => value.yellow(),
                    Severity::Low => value.dimmed(),
                };
                writeln!(writer, "{}: {}", label, value)?;
            } else {
                writeln!(writer, "{}: {}", label, count)?;
            }
        }
        Ok(())
    }
}

fn installed_label(finding: &Finding) -> &str {
    finding.installed_version.as_deref().unwrap_or("unknown")
}

fn dependency_type(finding: &Finding) -> &'static str {
    if finding.is_direct {
        "Direct"
    } else {
        "Transitive"
    }
}

/// Cuts a title to the table width, appending "..." when shortened
fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_WIDTH {
        let cut: String = title.chars().take(TITLE_WIDTH).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdvisoryRecord, DeclarationKind, ResolvedDependency};
    use crate::package_manager::InstallResult;
    use chrono::Utc;

    fn formatter(verbosity: Verbosity) -> TextFormatter {
        TextFormatter::new(verbosity).with_color(false)
    }

    fn render(result: &ScanResult, verbosity: Verbosity) -> String {
        let mut output = Vec::new();
        formatter(verbosity).format(result, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn finding(name: &str, severity: Severity, title: &str, direct: bool) -> Finding {
        let dep = if direct {
            ResolvedDependency::direct(name, "1.0.0", DeclarationKind::Dependencies)
        } else {
            ResolvedDependency::transitive(name, Some("1.0.0".to_string()))
        };
        let mut advisory = AdvisoryRecord::new(format!("ID-{}", name), name, severity, "<2.0.0")
            .with_title(title)
            .with_patched(">=2.0.0");
        advisory.recommendation = "Upgrade to version 2.0.0 or later".to_string();
        advisory.references = vec![
            "https://example.com/1".to_string(),
            "https://example.com/2".to_string(),
            "https://example.com/3".to_string(),
        ];
        Finding::new(&advisory, &dep)
    }

    fn result_with(findings: Vec<Finding>) -> ScanResult {
        let mut summary = SummaryCounts::new(findings.len() + 2);
        for f in &findings {
            summary.record(f.severity);
        }
        summary.vulnerable = findings.len();
        ScanResult {
            summary,
            vulnerabilities: findings,
            dependencies: Vec::new(),
            alternatives: BTreeMap::new(),
            scanned_at: Utc::now(),
        }
    }

    #[test]
    fn test_truncate_title() {
        let long = "a".repeat(45);
        assert_eq!(truncate_title(&long), format!("{}...", "a".repeat(40)));
        assert_eq!(truncate_title("short"), "short");
        assert_eq!(truncate_title(&"b".repeat(40)), "b".repeat(40));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("moderate"), "Moderate");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_format_no_findings() {
        let output = render(&result_with(Vec::new()), Verbosity::Normal);
        assert!(output.contains("Total dependencies: 2"));
        assert!(output.contains("Vulnerable packages: 0"));
        assert!(output.contains("No vulnerabilities found!"));
        assert!(!output.contains("Vulnerabilities:"));
    }

    #[test]
    fn test_format_summary_skips_zero_counts() {
        let output = render(
            &result_with(vec![finding("lodash", Severity::High, "Prototype Pollution", true)]),
            Verbosity::Normal,
        );
        assert!(output.contains("High: 1"));
        assert!(!output.contains("Critical:"));
        assert!(!output.contains("Low:"));
    }

    #[test]
    fn test_format_table_rows() {
        let output = render(
            &result_with(vec![
                finding("lodash", Severity::High, "Prototype Pollution", true),
                finding("minimist", Severity::Low, "Something minor", false),
            ]),
            Verbosity::Normal,
        );
        assert!(output.contains("Package"));
        assert!(output.contains("HIGH"));
        assert!(output.contains("LOW"));
        assert!(output.contains("Direct"));
        assert!(output.contains("Transitive"));
    }

    #[test]
    fn test_format_details_for_severe_only() {
        let output = render(
            &result_with(vec![
                finding("lodash", Severity::Critical, "Prototype Pollution", true),
                finding("minimist", Severity::Moderate, "Something minor", true),
            ]),
            Verbosity::Normal,
        );
        assert!(output.contains("Critical & High Severity Details:"));
        assert!(output.contains("* lodash (1.0.0)"));
        assert!(!output.contains("* minimist"));
        assert!(output.contains("References: https://example.com/1, https://example.com/2\n"));
        assert!(!output.contains("https://example.com/3"));
    }

    #[test]
    fn test_format_quiet_omits_details() {
        let output = render(
            &result_with(vec![finding("lodash", Severity::High, "Prototype Pollution", true)]),
            Verbosity::Quiet,
        );
        assert!(!output.contains("Vulnerability Scan Results"));
        assert!(!output.contains("Details"));
        assert!(output.contains("lodash"));
    }

    #[test]
    fn test_format_alternatives_block() {
        let mut result = result_with(vec![finding("request", Severity::Moderate, "SSRF", true)]);
        result.alternatives.insert(
            "request".to_string(),
            vec![PackageAlternative {
                name: "axios".to_string(),
                description: "Promise based HTTP client".to_string(),
                quality: 0.93,
                stars: 0.871,
                downloads: 1000,
            }],
        );

        let output = render(&result, Verbosity::Normal);
        assert!(output.contains("Alternative Packages:"));
        assert!(output.contains("request alternatives:"));
        assert!(output.contains("1. axios - Promise based HTTP client"));
        assert!(output.contains("Quality: 93% | Popularity: 87%"));
    }

    #[test]
    fn test_format_package_alternatives_empty() {
        let mut output = Vec::new();
        formatter(Verbosity::Normal)
            .format_package_alternatives("left-pad", &[], &mut output)
            .unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Alternatives for left-pad:"));
        assert!(output.contains("No alternatives found."));
    }

    #[test]
    fn test_format_fix_analysis() {
        let plan = FixPlan {
            package_name: "lodash".to_string(),
            current_version: "4.17.20".to_string(),
            current_range: "^4.17.20".to_string(),
            target_version: "4.17.21".to_string(),
            target_range: "^4.17.21".to_string(),
            declaration_kind: DeclarationKind::Dependencies,
            severity: Severity::High,
            reason: "Update to patched version 4.17.21".to_string(),
            breaking: false,
        };
        let manual = finding("debug", Severity::Low, "ReDoS", false);

        let mut output = Vec::new();
        formatter(Verbosity::Verbose)
            .format_fix_analysis(&[plan], &[&manual], &mut output)
            .unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("Found 1 potentially fixable vulnerabilities."));
        assert!(output.contains("lodash ^4.17.20 -> ^4.17.21"));
        assert!(output.contains("Update to patched version 4.17.21"));
        assert!(output.contains("debug (Transitive) ReDoS"));
    }

    #[test]
    fn test_format_fix_analysis_nothing_fixable() {
        let mut output = Vec::new();
        formatter(Verbosity::Normal)
            .format_fix_analysis(&[], &[], &mut output)
            .unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("No automatically fixable vulnerabilities found."));
    }

    #[test]
    fn test_format_fix_report() {
        let report = FixReport {
            outcomes: vec![
                ApplyOutcome::Applied {
                    package: "lodash".to_string(),
                    kind: DeclarationKind::Dependencies,
                },
                ApplyOutcome::Failed {
                    package: "ghost".to_string(),
                    message: "not declared".to_string(),
                },
            ],
            manifest_written: true,
            install: Some(InstallResult::success(
                "npm install".to_string(),
                String::new(),
                String::new(),
            )),
        };

        let mut output = Vec::new();
        formatter(Verbosity::Normal)
            .format_fix_report(&report, false, &mut output)
            .unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("ok lodash (dependencies)"));
        assert!(output.contains("failed ghost: not declared"));
        assert!(output.contains("Regenerated package-lock.json (npm install)"));
        assert!(output.contains("Applied 1 fix(es), 1 failed"));
    }
}
