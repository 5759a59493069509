//! vuln-scan - Dependency vulnerability scanner library for Node.js projects
//!
//! This library provides the core functionality for:
//! - Evaluating npm-style version ranges
//! - Resolving dependencies from package.json and package-lock.json
//! - Matching dependencies against security advisories
//! - Planning and applying version updates to vulnerable direct dependencies

pub mod cli;
pub mod database;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod matcher;
pub mod output;
pub mod package_manager;
pub mod progress;
pub mod remediation;
pub mod scanner;
pub mod version;
