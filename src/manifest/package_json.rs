//! package.json model for Node.js projects
//!
//! Handles:
//! - dependencies
//! - devDependencies
//! - peerDependencies
//! - optionalDependencies
//!
//! The document is kept as parsed JSON so that a rewritten manifest keeps
//! every unrelated field and the original key order.

use crate::domain::DeclarationKind;
use crate::error::ManifestError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const DEFAULT_NAME: &str = "unknown";
const DEFAULT_VERSION: &str = "0.0.0";

/// Parsed package.json
#[derive(Debug, Clone, PartialEq)]
pub struct PackageManifest {
    /// Project name, `unknown` when absent
    pub name: String,
    /// Project version, `0.0.0` when absent
    pub version: String,
    path: PathBuf,
    document: Map<String, Value>,
}

impl PackageManifest {
    /// Parses manifest content read from `path`
    pub fn parse(content: &str, path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref().to_path_buf();
        let json: Value = serde_json::from_str(content)
            .map_err(|e| ManifestError::json_parse_error(&path, e.to_string()))?;

        let Value::Object(document) = json else {
            return Err(ManifestError::InvalidStructure {
                path,
                message: "top-level value is not an object".to_string(),
            });
        };

        let name = string_field(&document, "name").unwrap_or(DEFAULT_NAME);
        let version = string_field(&document, "version").unwrap_or(DEFAULT_VERSION);

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            path,
            document,
        })
    }

    /// Path the manifest was read from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Declared `(name, specifier)` pairs of one section, in file order
    ///
    /// Entries whose specifier is not a string are skipped.
    pub fn declared(&self, kind: DeclarationKind) -> impl Iterator<Item = (&str, &str)> {
        self.section(kind)
            .into_iter()
            .flat_map(|deps| deps.iter())
            .filter_map(|(name, value)| value.as_str().map(|spec| (name.as_str(), spec)))
    }

    /// Names of entries in one section whose specifier is not a string
    pub fn malformed_entries(&self, kind: DeclarationKind) -> Vec<&str> {
        self.section(kind)
            .into_iter()
            .flat_map(|deps| deps.iter())
            .filter(|(_, value)| !value.is_string())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Specifier for `package` in one section
    pub fn specifier(&self, kind: DeclarationKind, package: &str) -> Option<&str> {
        self.section(kind)?.get(package)?.as_str()
    }

    /// First section declaring `package` with a non-empty specifier
    ///
    /// Sections are checked in [`DeclarationKind::MANIFEST_ORDER`].
    pub fn find_declaration(&self, package: &str) -> Option<(DeclarationKind, &str)> {
        DeclarationKind::MANIFEST_ORDER.iter().find_map(|kind| {
            self.specifier(*kind, package)
                .filter(|spec| !spec.is_empty())
                .map(|spec| (*kind, spec))
        })
    }

    /// Rewrites the specifier of an existing entry
    pub fn set_specifier(
        &mut self,
        kind: DeclarationKind,
        package: &str,
        specifier: &str,
    ) -> Result<(), ManifestError> {
        let not_declared = || ManifestError::PackageNotDeclared {
            package: package.to_string(),
            kind: kind.to_string(),
        };

        let entry = self
            .document
            .get_mut(kind.as_str())
            .and_then(Value::as_object_mut)
            .and_then(|deps| deps.get_mut(package))
            .filter(|value| value.is_string())
            .ok_or_else(not_declared)?;

        *entry = Value::String(specifier.to_string());
        Ok(())
    }

    /// Serializes the manifest with two-space indentation and a trailing newline
    pub fn to_pretty_json(&self) -> Result<String, ManifestError> {
        let mut content = serde_json::to_string_pretty(&self.document)
            .map_err(|e| ManifestError::json_parse_error(&self.path, e.to_string()))?;
        content.push('\n');
        Ok(content)
    }

    fn section(&self, kind: DeclarationKind) -> Option<&Map<String, Value>> {
        if !kind.is_manifest_section() {
            return None;
        }
        self.document.get(kind.as_str())?.as_object()
    }
}

fn string_field<'a>(document: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    document.get(key).and_then(Value::as_str)
}
