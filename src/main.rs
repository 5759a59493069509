//! vuln-scan - Dependency vulnerability scanner for Node.js applications
//!
//! Scans package.json and package-lock.json against an advisory database,
//! reports findings, and optionally rewrites vulnerable direct dependency
//! specifiers to patched versions.

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vuln_scan::cli::{parse_confirmation, CliArgs, Command, ScanArgs};
use vuln_scan::database::{
    HttpClient, LocalAdvisoryDatabase, NpmAuditDatabase, VulnerabilityDatabase,
};
use vuln_scan::domain::ScanResult;
use vuln_scan::output::{create_formatter, OutputConfig, TextFormatter};
use vuln_scan::progress::Progress;
use vuln_scan::remediation::AutoFixer;
use vuln_scan::scanner::{ScanOptions, Scanner};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(&args);

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr log subscriber; RUST_LOG overrides the flag-derived filter
fn init_tracing(args: &CliArgs) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!args.no_color),
        )
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("vuln-scan v{}", env!("CARGO_PKG_VERSION"));
    }

    let database = build_database(&args)?;

    match &args.command {
        Command::Scan(scan) => run_scan(&args, scan, database).await,
        Command::CheckAlternatives { package } => {
            run_check_alternatives(&args, package, database).await
        }
    }
}

/// Offline file database when --advisories is given, npm otherwise
fn build_database(args: &CliArgs) -> anyhow::Result<Arc<dyn VulnerabilityDatabase>> {
    if let Some(path) = &args.advisories {
        let database = LocalAdvisoryDatabase::from_file(path)?;
        tracing::debug!(path = %path.display(), advisories = database.len(), "loaded advisory file");
        return Ok(Arc::new(database));
    }

    let mut database = NpmAuditDatabase::new(HttpClient::new()?);
    if let Some(url) = &args.registry {
        database = database.with_registry_url(url);
    }
    if let Some(url) = &args.search_api {
        database = database.with_search_url(url);
    }
    Ok(Arc::new(database))
}

async fn run_scan(
    args: &CliArgs,
    scan: &ScanArgs,
    database: Arc<dyn VulnerabilityDatabase>,
) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("Target: {}", scan.path.display());
    }

    let scanner = Scanner::new(scan.scan_options(args.quiet), database);
    let result = scanner.scan().await?;

    let output_config = OutputConfig::new(scan.output, args.verbosity()).with_color(!args.no_color);
    let formatter = create_formatter(&output_config);

    let mut stdout = io::stdout().lock();
    formatter.format(&result, &mut stdout)?;
    stdout.flush()?;
    drop(stdout);

    if scan.fix {
        let text = TextFormatter::new(args.verbosity()).with_color(!args.no_color);
        // Keep stdout parseable for machine-readable formats
        if scan.output.is_machine_readable() {
            run_fix(scan, &result, &text, &mut io::stderr().lock())?;
        } else {
            run_fix(scan, &result, &text, &mut io::stdout().lock())?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Plan, confirm and apply fixes for the scanned project
fn run_fix(
    scan: &ScanArgs,
    result: &ScanResult,
    text: &TextFormatter,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    if !result.has_findings() {
        writeln!(out, "\nNo vulnerabilities to fix!")?;
        return Ok(());
    }

    let fixer = AutoFixer::new(&scan.path)
        .with_dry_run(scan.dry_run)
        .with_lock_regeneration(!scan.no_install);
    let plan_set = fixer.plan(&result.vulnerabilities)?;
    text.format_fix_analysis(&plan_set.plans, &plan_set.unfixable, out)?;
    out.flush()?;

    if plan_set.plans.is_empty() {
        return Ok(());
    }

    if !scan.yes && !scan.dry_run && !confirm("Do you want to proceed with automatic fixes?")? {
        writeln!(out, "Fix cancelled.")?;
        return Ok(());
    }

    let mut progress = Progress::new(!scan.output.is_machine_readable() && !scan.dry_run);
    progress.spinner(&fix_message(&scan.path, scan.no_install));
    let report = fixer.fix(&plan_set.plans);
    progress.finish_and_clear();

    text.format_fix_report(&report?, fixer.is_dry_run(), out)?;
    Ok(())
}

fn fix_message(path: &Path, no_install: bool) -> String {
    if no_install {
        format!("Updating {}...", path.join("package.json").display())
    } else {
        format!(
            "Updating {} and regenerating package-lock.json...",
            path.join("package.json").display()
        )
    }
}

/// Ask a yes/no question on stderr and read the answer from stdin
fn confirm(prompt: &str) -> io::Result<bool> {
    eprint!("{} [Y/n] ", prompt);
    io::stderr().flush()?;

    let mut answer = String::new();
    let read = io::stdin().lock().read_line(&mut answer)?;
    // No input at all (closed stdin) is not consent
    if read == 0 {
        return Ok(false);
    }
    Ok(parse_confirmation(&answer))
}

async fn run_check_alternatives(
    args: &CliArgs,
    package: &str,
    database: Arc<dyn VulnerabilityDatabase>,
) -> anyhow::Result<ExitCode> {
    let scanner = Scanner::new(ScanOptions::default(), database);

    let mut progress = Progress::new(!args.quiet);
    progress.spinner(&format!("Finding alternatives for {}...", package));
    let alternatives = scanner.find_alternatives(package).await;
    progress.finish_and_clear();
    let alternatives = alternatives?;

    let text = TextFormatter::new(args.verbosity()).with_color(!args.no_color);
    let mut stdout = io::stdout().lock();
    text.format_package_alternatives(package, &alternatives, &mut stdout)?;
    stdout.flush()?;

    Ok(ExitCode::SUCCESS)
}
