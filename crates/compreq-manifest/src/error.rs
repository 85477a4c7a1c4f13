//! Manifest errors.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or writing manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A file could not be read or written.
    #[error("io error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A TOML document could not be parsed.
    #[error("invalid TOML in {path}: {message}")]
    Toml {
        /// File path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A line of a requirements file is not a requirement.
    #[error("{path}:{line}: {message}")]
    InvalidLine {
        /// File path.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Why the line was rejected.
        message: String,
    },

    /// A dependency entry cannot be interpreted.
    #[error("invalid dependency '{package}': {message}")]
    InvalidDependency {
        /// Package the entry is for.
        package: String,
        /// Why the entry was rejected.
        message: String,
    },

    /// A required table is missing.
    #[error("missing table [{0}]")]
    MissingTable(String),

    /// A dependency group was requested from a format without groups.
    #[error("requirements files have no dependency groups (requested '{0}')")]
    GroupsUnsupported(String),

    /// A key that should hold a table or array holds something else.
    #[error("'{0}' has an unexpected type")]
    UnexpectedType(String),

    /// Requirement model error.
    #[error(transparent)]
    Core(#[from] compreq_core::Error),
}

impl ManifestError {
    /// Create an IO error with context.
    #[must_use]
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Create an invalid dependency error.
    #[must_use]
    pub fn invalid_dependency(package: &str, message: impl ToString) -> Self {
        Self::InvalidDependency {
            package: package.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result type for manifest operations.
pub type Result<T> = std::result::Result<T, ManifestError>;
