//! Manifest and lock file parsing
//!
//! This module provides functionality to:
//! - Read package.json from a project directory
//! - Read package-lock.json in either schema generation
//! - Merge both into one flattened list of resolved dependencies

mod lockfile;
mod package_json;
mod writer;

pub use lockfile::{LockGeneration, LockedPackage, PackageLock};
pub use package_json::PackageManifest;
pub use writer::{read_manifest, write_manifest, ManifestWriter};

use crate::domain::{DeclarationKind, ResolvedDependency};
use crate::error::{LockfileError, ManifestError};
use crate::version;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Manifest file name
pub const MANIFEST_FILENAME: &str = "package.json";

/// Lock file name
pub const LOCKFILE_FILENAME: &str = "package-lock.json";

/// Reads the manifest and lock file of one project directory
#[derive(Debug, Clone)]
pub struct ManifestParser {
    project_path: PathBuf,
}

impl ManifestParser {
    /// Create a parser bound to a project directory
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
        }
    }

    /// Project directory
    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Path of package.json
    pub fn manifest_path(&self) -> PathBuf {
        self.project_path.join(MANIFEST_FILENAME)
    }

    /// Path of package-lock.json
    pub fn lockfile_path(&self) -> PathBuf {
        self.project_path.join(LOCKFILE_FILENAME)
    }

    /// Reads package.json
    ///
    /// Fails with [`ManifestError::NotFound`] if the file does not exist.
    pub fn parse_manifest(&self) -> Result<PackageManifest, ManifestError> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Err(ManifestError::not_found(&self.project_path));
        }

        let content = read_manifest(&path)?;
        PackageManifest::parse(&content, &path)
    }

    /// Reads package-lock.json
    ///
    /// An absent file is not an error. A file that cannot be read or parsed
    /// is logged and treated as absent.
    pub fn parse_lockfile(&self) -> Option<PackageLock> {
        let path = self.lockfile_path();
        if !path.is_file() {
            debug!(path = %path.display(), "no lock file, using manifest data only");
            return None;
        }

        match self.read_lockfile(&path) {
            Ok(lock) => Some(lock),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable lock file");
                None
            }
        }
    }

    /// Merged list of direct and transitive dependencies
    pub fn get_all_dependencies(&self) -> Result<Vec<ResolvedDependency>, ManifestError> {
        let manifest = self.parse_manifest()?;
        let lock = self.parse_lockfile();
        Ok(resolve_dependencies(&manifest, lock.as_ref()))
    }

    fn read_lockfile(&self, path: &Path) -> Result<PackageLock, LockfileError> {
        let content = fs::read_to_string(path).map_err(|e| LockfileError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        PackageLock::parse(&content, path)
    }
}

/// Merges manifest declarations with lock data
///
/// Manifest entries are seeded first, their installed version set to the
/// declared specifier. Lock entries then overwrite only the installed
/// version of a known name, or are added as transitive records. The result
/// is sorted by name.
pub fn resolve_dependencies(
    manifest: &PackageManifest,
    lock: Option<&PackageLock>,
) -> Vec<ResolvedDependency> {
    let mut resolved: BTreeMap<String, ResolvedDependency> = BTreeMap::new();

    for kind in DeclarationKind::MANIFEST_ORDER {
        for name in manifest.malformed_entries(kind) {
            warn!(package = name, section = %kind, "skipping non-string version specifier");
        }
        for (name, specifier) in manifest.declared(kind) {
            resolved.insert(
                name.to_string(),
                ResolvedDependency::direct(name, specifier, kind),
            );
        }
    }

    if let Some(lock) = lock {
        for package in lock.packages() {
            match resolved.get_mut(&package.name) {
                Some(existing) => {
                    if let Some(version) = package.version {
                        existing.installed_version = Some(version);
                    }
                }
                None => {
                    let record = ResolvedDependency::transitive(&package.name, package.version);
                    resolved.insert(package.name, record);
                }
            }
        }
    }

    resolved.into_values().collect()
}

/// Returns true if `installed` lies within `vulnerable_range`
///
/// An unknown installed version, or one that cannot be parsed against the
/// range, is treated as not vulnerable.
pub fn is_version_vulnerable(installed: Option<&str>, vulnerable_range: &str) -> bool {
    let Some(installed) = installed else {
        return false;
    };

    match version::satisfies(installed, vulnerable_range) {
        Ok(vulnerable) => vulnerable,
        Err(e) => {
            warn!(
                version = installed,
                range = vulnerable_range,
                error = %e,
                "could not check version against range"
            );
            false
        }
    }
}
