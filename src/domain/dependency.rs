//! Resolved dependency records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a dependency was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationKind {
    /// `dependencies` in package.json
    Dependencies,
    /// `devDependencies` in package.json
    DevDependencies,
    /// `peerDependencies` in package.json
    PeerDependencies,
    /// `optionalDependencies` in package.json
    OptionalDependencies,
    /// Only present in the lock file
    Transitive,
}

impl DeclarationKind {
    /// Manifest sections in lookup priority order; first match wins
    pub const MANIFEST_ORDER: [DeclarationKind; 4] = [
        DeclarationKind::Dependencies,
        DeclarationKind::DevDependencies,
        DeclarationKind::PeerDependencies,
        DeclarationKind::OptionalDependencies,
    ];

    /// The package.json key (or `transitive`)
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Dependencies => "dependencies",
            DeclarationKind::DevDependencies => "devDependencies",
            DeclarationKind::PeerDependencies => "peerDependencies",
            DeclarationKind::OptionalDependencies => "optionalDependencies",
            DeclarationKind::Transitive => "transitive",
        }
    }

    /// Returns true for the four manifest sections
    pub fn is_manifest_section(&self) -> bool {
        !matches!(self, DeclarationKind::Transitive)
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency of the scanned project with its resolved version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedDependency {
    /// Package name, unique within one scan
    pub name: String,
    /// Specifier as declared in package.json, or the lock version for transitive entries
    pub requested_version: String,
    /// Concrete version from the lock file, or the declared specifier without lock data
    pub installed_version: Option<String>,
    /// Section the dependency came from
    #[serde(rename = "type")]
    pub declaration_kind: DeclarationKind,
    /// Declared in package.json itself
    pub is_direct: bool,
}

impl ResolvedDependency {
    /// Creates a record for a package.json entry; installed version starts as the specifier
    pub fn direct(
        name: impl Into<String>,
        specifier: impl Into<String>,
        kind: DeclarationKind,
    ) -> Self {
        let specifier = specifier.into();
        Self {
            name: name.into(),
            installed_version: Some(specifier.clone()),
            requested_version: specifier,
            declaration_kind: kind,
            is_direct: true,
        }
    }

    /// Creates a record for a package only found in the lock file
    pub fn transitive(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            requested_version: version.clone().unwrap_or_default(),
            installed_version: version,
            declaration_kind: DeclarationKind::Transitive,
            is_direct: false,
        }
    }

    /// Installed version as a string slice, if known
    pub fn installed(&self) -> Option<&str> {
        self.installed_version.as_deref()
    }
}

impl fmt::Display for ResolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{} [{}]",
            self.name,
            self.installed().unwrap_or("unknown"),
            self.declaration_kind
        )
    }
}
