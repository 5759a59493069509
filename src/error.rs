//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: package.json could not be found, read, parsed or written
//! - LockfileError: package-lock.json present but unusable (never fatal)
//! - VersionError: a version or range string could not be parsed (never fatal)
//! - DatabaseError: advisory or alternatives lookup failed
//! - FixError: applying fixes to the project failed
//! - ConfigError: invalid command-line configuration

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Vulnerability database related errors
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Fix application errors
    #[error(transparent)]
    Fix(#[from] FixError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to package.json operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// package.json not found in the project directory
    #[error("package.json not found in the specified directory: {path}")]
    NotFound { path: PathBuf },

    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// Manifest is valid JSON but not an object
    #[error("invalid manifest structure in {path}: {message}")]
    InvalidStructure { path: PathBuf, message: String },

    /// Package is not declared under the given dependency kind
    #[error("package '{package}' is not declared in {kind}")]
    PackageNotDeclared { package: String, kind: String },
}

/// Errors related to package-lock.json; always degraded to a warning
#[derive(Error, Debug)]
pub enum LockfileError {
    /// Failed to read the lock file
    #[error("failed to read lock file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Lock file is not valid JSON or has an unexpected shape
    #[error("failed to parse lock file {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },
}

/// Errors raised when a version or range string cannot be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Not a valid semantic version
    #[error("invalid version '{version}': {message}")]
    InvalidVersion { version: String, message: String },

    /// Not a valid range expression
    #[error("invalid version range '{range}': {message}")]
    InvalidRange { range: String, message: String },
}

/// Errors related to the vulnerability database
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Network request failed
    #[error("failed to fetch {resource} from {service}: {message}")]
    NetworkError {
        resource: String,
        service: String,
        message: String,
    },

    /// Requested package does not exist
    #[error("package '{package}' not found in {service}")]
    PackageNotFound { package: String, service: String },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {service}")]
    RateLimitExceeded { service: String },

    /// Invalid response body
    #[error("invalid response from {service} for {resource}: {message}")]
    InvalidResponse {
        resource: String,
        service: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching {resource} from {service}")]
    Timeout { resource: String, service: String },
}

/// Errors raised while applying fixes to a project
#[derive(Error, Debug)]
pub enum FixError {
    /// Could not create a backup copy before mutating
    #[error("failed to create backup of {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not restore a backup copy after a failure
    #[error("failed to restore backup of {path}: {source}")]
    Restore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write an updated file
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not remove a generated file or directory
    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The installer did not regenerate the lock file
    #[error(
        "lock file regeneration with `{command}` failed: {stderr}; project files were restored, \
         rerun with --no-install to update package.json only"
    )]
    Install { command: String, stderr: String },

    /// Manifest could not be read or updated
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown severity level
    #[error("invalid severity '{value}': expected 'low', 'moderate', 'high', or 'critical'")]
    InvalidSeverity { value: String },

    /// Unknown output format
    #[error("invalid output format '{value}': expected 'table', 'json', or 'csv'")]
    InvalidOutputFormat { value: String },
}

impl ManifestError {
    /// Creates a new NotFound error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        ManifestError::NotFound { path: path.into() }
    }

    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl VersionError {
    /// Creates a new InvalidVersion error
    pub fn invalid_version(version: impl Into<String>, message: impl Into<String>) -> Self {
        VersionError::InvalidVersion {
            version: version.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidRange error
    pub fn invalid_range(range: impl Into<String>, message: impl Into<String>) -> Self {
        VersionError::InvalidRange {
            range: range.into(),
            message: message.into(),
        }
    }
}

impl DatabaseError {
    /// Creates a new NetworkError
    pub fn network_error(
        resource: impl Into<String>,
        service: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DatabaseError::NetworkError {
            resource: resource.into(),
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        resource: impl Into<String>,
        service: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DatabaseError::InvalidResponse {
            resource: resource.into(),
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(resource: impl Into<String>, service: impl Into<String>) -> Self {
        DatabaseError::Timeout {
            resource: resource.into(),
            service: service.into(),
        }
    }
}
