//! package-lock.json parsing
//!
//! Two schema generations are supported:
//! - `lockfileVersion >= 2`: a flat `packages` map keyed by install path
//!   (`""` for the root project, `node_modules/<name>` otherwise)
//! - older files: a nested `dependencies` tree keyed by package name

use crate::error::LockfileError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

const NODE_MODULES: &str = "node_modules/";

/// Lock file schema generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockGeneration {
    /// npm v7+ flat package-path map
    Flat,
    /// npm v6 recursive dependency tree
    Nested,
}

/// A package discovered while traversing the lock file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedPackage {
    pub name: String,
    pub version: Option<String>,
}

/// Parsed package-lock.json
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageLock {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub lockfile_version: u64,
    #[serde(default)]
    packages: Map<String, Value>,
    #[serde(default)]
    dependencies: Map<String, Value>,
}

impl PackageLock {
    /// Parses lock file content read from `path`
    pub fn parse(content: &str, path: impl AsRef<Path>) -> Result<Self, LockfileError> {
        serde_json::from_str(content).map_err(|e| LockfileError::JsonParseError {
            path: path.as_ref().to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Schema generation detected from `lockfileVersion`
    pub fn generation(&self) -> LockGeneration {
        if self.lockfile_version >= 2 {
            LockGeneration::Flat
        } else {
            LockGeneration::Nested
        }
    }

    /// Every package in traversal order; the same name may appear more than once
    pub fn packages(&self) -> Vec<LockedPackage> {
        let mut found = Vec::new();
        match self.generation() {
            LockGeneration::Flat => {
                for (path, info) in &self.packages {
                    if path.is_empty() {
                        continue;
                    }
                    found.push(LockedPackage {
                        name: package_name_from_path(path, info),
                        version: version_of(info),
                    });
                }
            }
            LockGeneration::Nested => walk_tree(&self.dependencies, &mut found),
        }
        found
    }
}

/// Depth-first, parent before children
fn walk_tree(dependencies: &Map<String, Value>, found: &mut Vec<LockedPackage>) {
    for (name, info) in dependencies {
        found.push(LockedPackage {
            name: name.clone(),
            version: version_of(info),
        });

        if let Some(children) = info.get("dependencies").and_then(Value::as_object) {
            walk_tree(children, found);
        }
    }
}

/// Trailing package name of an install path
///
/// `node_modules/a/node_modules/@scope/b` maps to `@scope/b`. Paths outside
/// `node_modules` (workspace members) use the entry's `name`, or the path.
fn package_name_from_path(path: &str, info: &Value) -> String {
    if let Some(index) = path.rfind(NODE_MODULES) {
        return path[index + NODE_MODULES.len()..].to_string();
    }
    info.get("name")
        .and_then(Value::as_str)
        .unwrap_or(path)
        .to_string()
}

fn version_of(info: &Value) -> Option<String> {
    info.get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> PackageLock {
        PackageLock::parse(content, "package-lock.json").unwrap()
    }

    fn names(lock: &PackageLock) -> Vec<String> {
        lock.packages().into_iter().map(|p| p.name).collect()
    }

    #[test]
    fn test_generation_detection() {
        assert_eq!(parse(r#"{"lockfileVersion": 3}"#).generation(), LockGeneration::Flat);
        assert_eq!(parse(r#"{"lockfileVersion": 2}"#).generation(), LockGeneration::Flat);
        assert_eq!(parse(r#"{"lockfileVersion": 1}"#).generation(), LockGeneration::Nested);
        assert_eq!(parse("{}").generation(), LockGeneration::Nested);
    }

    #[test]
    fn test_flat_map_skips_root() {
        let lock = parse(
            r#"{
                "lockfileVersion": 3,
                "packages": {
                    "": { "name": "app", "version": "1.0.0" },
                    "node_modules/lodash": { "version": "4.17.21" },
                    "node_modules/@babel/core": { "version": "7.24.0" }
                }
            }"#,
        );

        let packages = lock.packages();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "lodash");
        assert_eq!(packages[0].version.as_deref(), Some("4.17.21"));
        assert_eq!(packages[1].name, "@babel/core");
    }

    #[test]
    fn test_flat_map_nested_paths_collapse_to_leaf() {
        let lock = parse(
            r#"{
                "lockfileVersion": 2,
                "packages": {
                    "node_modules/debug": { "version": "4.3.4" },
                    "node_modules/express/node_modules/debug": { "version": "2.6.9" }
                }
            }"#,
        );

        assert_eq!(names(&lock), vec!["debug", "debug"]);
        assert_eq!(lock.packages()[1].version.as_deref(), Some("2.6.9"));
    }

    #[test]
    fn test_flat_map_workspace_entry_uses_name() {
        let lock = parse(
            r#"{
                "lockfileVersion": 3,
                "packages": {
                    "packages/ui": { "name": "@app/ui", "version": "0.1.0" },
                    "packages/bare": { "version": "0.2.0" }
                }
            }"#,
        );

        assert_eq!(names(&lock), vec!["@app/ui", "packages/bare"]);
    }

    #[test]
    fn test_flat_map_entry_without_version() {
        let lock = parse(
            r#"{"lockfileVersion": 3, "packages": {"node_modules/linked": {"link": true}}}"#,
        );
        assert_eq!(lock.packages()[0].version, None);
    }

    #[test]
    fn test_nested_tree_depth_first() {
        let lock = parse(
            r#"{
                "lockfileVersion": 1,
                "dependencies": {
                    "express": {
                        "version": "4.17.1",
                        "dependencies": {
                            "debug": {
                                "version": "2.6.9",
                                "dependencies": { "ms": { "version": "2.0.0" } }
                            }
                        }
                    },
                    "ms": { "version": "2.1.3" }
                }
            }"#,
        );

        assert_eq!(names(&lock), vec!["express", "debug", "ms", "ms"]);
        assert_eq!(lock.packages()[3].version.as_deref(), Some("2.1.3"));
    }

    #[test]
    fn test_flat_generation_ignores_legacy_tree() {
        let lock = parse(
            r#"{
                "lockfileVersion": 2,
                "packages": { "node_modules/a": { "version": "1.0.0" } },
                "dependencies": { "b": { "version": "2.0.0" } }
            }"#,
        );
        assert_eq!(names(&lock), vec!["a"]);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(PackageLock::parse("{ nope", "package-lock.json").is_err());
        assert!(PackageLock::parse(r#"{"packages": []}"#, "package-lock.json").is_err());
    }
}
