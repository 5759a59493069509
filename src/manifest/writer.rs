//! Manifest file writing
//!
//! This module provides:
//! - ManifestWriter for persisting an updated manifest
//! - Dry-run mode support (no actual file modifications)

use crate::error::ManifestError;
use crate::manifest::PackageManifest;
use std::fs;
use std::path::Path;

/// Writer for package.json
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestWriter {
    /// Whether to run in dry-run mode (no file modifications)
    dry_run: bool,
}

impl ManifestWriter {
    /// Create a new ManifestWriter
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Create a ManifestWriter in dry-run mode
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    /// Check if this writer is in dry-run mode
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Writes the manifest back to the path it was read from
    ///
    /// Returns whether the file was actually modified.
    pub fn write(&self, manifest: &PackageManifest) -> Result<bool, ManifestError> {
        let content = manifest.to_pretty_json()?;
        if self.dry_run {
            return Ok(false);
        }
        write_manifest(manifest.path(), &content)?;
        Ok(true)
    }
}

/// Read a manifest file content safely
pub fn read_manifest(path: &Path) -> Result<String, ManifestError> {
    fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))
}

/// Write content to a manifest file
pub fn write_manifest(path: &Path, content: &str) -> Result<(), ManifestError> {
    fs::write(path, content).map_err(|e| ManifestError::write_error(path, e))
}
