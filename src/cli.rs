//! CLI argument parsing module for vuln-scan

use crate::domain::Severity;
use crate::output::{OutputFormat, Verbosity};
use crate::scanner::ScanOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Dependency vulnerability scanner for Node.js applications
#[derive(Parser, Debug, Clone)]
#[command(
    name = "vuln-scan",
    version,
    about = "Dependency vulnerability scanner for Node.js applications"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output (debug logging, advisory overviews)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    // Data sources
    /// npm registry base URL used for security audits and download counts
    #[arg(long, global = true, value_name = "URL")]
    pub registry: Option<String>,

    /// npms.io base URL used for alternative package search
    #[arg(long = "search-api", global = true, value_name = "URL")]
    pub search_api: Option<String>,

    /// Read advisories from a local JSON file instead of the network
    #[arg(long, global = true, value_name = "FILE")]
    pub advisories: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scan package.json and package-lock.json for vulnerabilities
    Scan(ScanArgs),

    /// Find alternative packages for a specific dependency
    CheckAlternatives {
        /// Package name to look up
        package: String,
    },
}

/// Arguments of the `scan` subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct ScanArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Automatically fix vulnerabilities when possible
    #[arg(short, long)]
    pub fix: bool,

    /// Apply fixes without asking for confirmation
    #[arg(short, long, requires = "fix")]
    pub yes: bool,

    /// Show what --fix would change without writing anything
    #[arg(short = 'n', long, requires = "fix")]
    pub dry_run: bool,

    /// Skip regenerating package-lock.json after fixing
    #[arg(long)]
    pub no_install: bool,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Minimum severity level (low, moderate, high, critical)
    #[arg(short, long, default_value_t = Severity::Low)]
    pub severity: Severity,

    /// Show alternative packages for vulnerable dependencies
    #[arg(short, long)]
    pub alternatives: bool,
}

impl CliArgs {
    /// Verbosity derived from --verbose / --quiet
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }

    /// Default log filter when RUST_LOG is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "vuln_scan=debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}

impl ScanArgs {
    /// Scanner options for this invocation
    ///
    /// Progress is shown only for table output outside quiet mode.
    pub fn scan_options(&self, quiet: bool) -> ScanOptions {
        ScanOptions::new(self.path.clone())
            .with_min_severity(self.severity)
            .with_alternatives(self.alternatives)
            .with_progress(!quiet && !self.output.is_machine_readable())
    }
}

/// Interprets an answer to a yes/no prompt; an empty answer means yes
pub fn parse_confirmation(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "" | "y" | "yes"
    )
}
