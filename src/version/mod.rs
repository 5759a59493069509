//! Semantic version comparison and npm range satisfaction
//!
//! Pure functions, no state. Every function reports unparseable input as a
//! [`VersionError`] so callers can decide whether to warn; none of them
//! logs on its own.
//!
//! Range expressions follow npm semantics (`<`, `<=`, `>`, `>=`, `=`, `^`,
//! `~`, x-ranges, hyphen ranges, `||`). Advisory feeds also write
//! comma-separated clauses (`>= 1.0.0, < 1.2.3`); commas are read as AND
//! and whitespace between an operator and its version is dropped.

use crate::error::VersionError;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static VERSION_TRIPLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+\.\d+)").unwrap());
static OPERATOR_GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(<=|>=|<|>|=|\^|~)\s+").unwrap());

/// Returns true if `version` lies within `range`
pub fn satisfies(version: &str, range: &str) -> Result<bool, VersionError> {
    let version = parse_npm_version(version)?;
    let range = parse_range(range)?;
    Ok(range.satisfies(&version))
}

/// Semantic version precedence of `a` relative to `b`
///
/// Build metadata is ignored; a prerelease sorts before its release.
pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
    let a = parse_version(a)?;
    let b = parse_version(b)?;
    Ok((a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre)))
}

/// Returns true if `a` has strictly higher precedence than `b`
pub fn greater_than(a: &str, b: &str) -> Result<bool, VersionError> {
    Ok(compare(a, b)? == Ordering::Greater)
}

/// Returns true if `version` is a single concrete version rather than a range
pub fn is_exact(version: &str) -> bool {
    parse_version(version).is_ok()
}

/// Major component of a version
pub fn major_of(version: &str) -> Result<u64, VersionError> {
    Ok(parse_version(version)?.major)
}

/// First bare `X.Y.Z` found anywhere in `clause`
///
/// Deliberately loose: operators and prerelease suffixes are ignored, so
/// `>=1.2.3-beta` yields `1.2.3`.
pub fn extract_version(clause: &str) -> Option<&str> {
    VERSION_TRIPLE_RE
        .captures(clause)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Rewrites a feed range into npm range syntax
pub fn normalize_range(range: &str) -> String {
    let replaced = range.replace(',', " ");
    let collapsed = OPERATOR_GAP_RE.replace_all(&replaced, "$1");
    collapsed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_range(range: &str) -> Result<node_semver::Range, VersionError> {
    let normalized = normalize_range(range);
    if normalized.is_empty() {
        return Err(VersionError::invalid_range(range, "empty range"));
    }
    node_semver::Range::parse(&normalized)
        .map_err(|e| VersionError::invalid_range(range, e.to_string()))
}

fn parse_npm_version(version: &str) -> Result<node_semver::Version, VersionError> {
    node_semver::Version::parse(version.trim())
        .map_err(|e| VersionError::invalid_version(version, e.to_string()))
}

fn parse_version(version: &str) -> Result<semver::Version, VersionError> {
    let trimmed = version.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    semver::Version::parse(trimmed)
        .map_err(|e| VersionError::invalid_version(version, e.to_string()))
}
