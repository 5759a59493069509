//! JSON output formatter for machine processing
//!
//! The scan result is written as one pretty-printed document with
//! camelCase keys.

use crate::domain::{ScanResult, SummaryCounts};
use crate::output::OutputFormatter;
use serde::Serialize;
use std::io::Write;

/// JSON formatter for machine-readable output
#[derive(Debug, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }

    fn write_value<T: Serialize>(value: &T, writer: &mut dyn Write) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{}", json)
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &ScanResult, writer: &mut dyn Write) -> std::io::Result<()> {
        Self::write_value(result, writer)
    }

    fn format_summary(
        &self,
        summary: &SummaryCounts,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        Self::write_value(summary, writer)
    }
}
