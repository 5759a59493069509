//! Package manager integration for regenerating the lock file after fixes
//!
//! This module provides:
//! - Removal of the stale lock file and node_modules
//! - Execution of the npm install command

use crate::error::FixError;
use crate::manifest::LOCKFILE_FILENAME;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tracing::debug;

const NODE_MODULES_DIR: &str = "node_modules";
const DEFAULT_PROGRAM: &str = "npm";

/// Result of a package manager installation
#[derive(Debug, Clone)]
pub struct InstallResult {
    /// The command that was executed
    pub command: String,
    /// Whether the command succeeded
    pub success: bool,
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
}

impl InstallResult {
    /// Create a successful install result
    pub fn success(command: String, stdout: String, stderr: String) -> Self {
        Self {
            command,
            success: true,
            stdout,
            stderr,
        }
    }

    /// Create a failed install result
    pub fn failure(command: String, stdout: String, stderr: String) -> Self {
        Self {
            command,
            success: false,
            stdout,
            stderr,
        }
    }
}

/// Trait for running package manager install commands
pub trait PackageManagerRunner {
    /// Run the install command in the specified directory
    fn run_install(&self, working_dir: &Path) -> InstallResult;
}

/// Default package manager runner that executes real commands
#[derive(Debug, Clone)]
pub struct SystemPackageManager {
    program: String,
}

impl Default for SystemPackageManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemPackageManager {
    /// Create a runner using `npm`
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
        }
    }

    /// Create a runner using another npm-compatible executable
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Install command as displayed to the user
    pub fn command_line(&self) -> String {
        format!("{} install", self.program)
    }

    /// Run a command and capture output
    fn run_command(&self, working_dir: &Path) -> std::io::Result<Output> {
        Command::new(&self.program)
            .arg("install")
            .current_dir(working_dir)
            .output()
    }
}

impl PackageManagerRunner for SystemPackageManager {
    fn run_install(&self, working_dir: &Path) -> InstallResult {
        let command_str = self.command_line();
        debug!(command = %command_str, dir = %working_dir.display(), "running installer");

        match self.run_command(working_dir) {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();

                if output.status.success() {
                    InstallResult::success(command_str, stdout, stderr)
                } else {
                    InstallResult::failure(command_str, stdout, stderr)
                }
            }
            Err(e) => InstallResult::failure(
                command_str,
                String::new(),
                format!("Failed to execute command: {}", e),
            ),
        }
    }
}

/// Removes package-lock.json and node_modules, then runs the installer
///
/// Removal errors are returned; an unsuccessful install is reported through
/// the returned [`InstallResult`].
pub fn regenerate_lockfile<R: PackageManagerRunner + ?Sized>(
    runner: &R,
    project_dir: &Path,
) -> Result<InstallResult, FixError> {
    let lockfile = project_dir.join(LOCKFILE_FILENAME);
    if lockfile.exists() {
        fs::remove_file(&lockfile).map_err(|e| FixError::Remove {
            path: lockfile.clone(),
            source: e,
        })?;
    }

    let node_modules = project_dir.join(NODE_MODULES_DIR);
    if node_modules.is_dir() {
        fs::remove_dir_all(&node_modules).map_err(|e| FixError::Remove {
            path: node_modules.clone(),
            source: e,
        })?;
    }

    Ok(runner.run_install(project_dir))
}
