//! CSV output formatter
//!
//! One header line, then one row per finding with every field quoted.

use crate::domain::{Finding, ScanResult, Severity, SummaryCounts};
use crate::output::OutputFormatter;
use std::io::Write;

const HEADER: &str = "Package,Version,Severity,Title,Type,Recommendation";

/// CSV formatter for spreadsheet import
#[derive(Debug, Default)]
pub struct CsvFormatter;

impl CsvFormatter {
    /// Create a new CSV formatter
    pub fn new() -> Self {
        Self
    }

    fn row(finding: &Finding) -> String {
        let kind = if finding.is_direct {
            "Direct"
        } else {
            "Transitive"
        };
        [
            finding.package.as_str(),
            finding.installed_version.as_deref().unwrap_or(""),
            finding.severity.as_str(),
            finding.title.as_str(),
            kind,
            finding.recommendation.as_str(),
        ]
        .iter()
        .map(|field| quote(field))
        .collect::<Vec<_>>()
        .join(",")
    }
}

/// Wraps a field in quotes, doubling embedded quotes
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

impl OutputFormatter for CsvFormatter {
    fn format(&self, result: &ScanResult, writer: &mut dyn Write) -> std::io::Result<()> {
        writeln!(writer, "{}", HEADER)?;
        for finding in &result.vulnerabilities {
            writeln!(writer, "{}", Self::row(finding))?;
        }
        Ok(())
    }

    fn format_summary(
        &self,
        summary: &SummaryCounts,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        writeln!(writer, "Total,Vulnerable,Critical,High,Moderate,Low")?;
        writeln!(
            writer,
            "{},{},{},{},{},{}",
            summary.total,
            summary.vulnerable,
            summary.count(Severity::Critical),
            summary.count(Severity::High),
            summary.count(Severity::Moderate),
            summary.count(Severity::Low)
        )
    }
}
