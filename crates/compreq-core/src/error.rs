//! Error types for compreq operations.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for compreq.
#[derive(Error, Debug)]
pub enum Error {
    /// A string could not be parsed as a PEP 440 version.
    #[error("invalid version '{input}': {message}")]
    InvalidVersion {
        /// Offending input.
        input: String,
        /// Parser message.
        message: String,
    },

    /// A string could not be parsed as a version specifier.
    #[error("invalid specifier '{input}': {message}")]
    InvalidSpecifier {
        /// Offending input.
        input: String,
        /// Parser message.
        message: String,
    },

    /// A string could not be parsed as a requirement.
    #[error("invalid requirement '{input}': {message}")]
    InvalidRequirement {
        /// Offending input.
        input: String,
        /// Parser message.
        message: String,
    },

    /// A string could not be parsed as an environment marker.
    #[error("invalid marker '{input}': {message}")]
    InvalidMarker {
        /// Offending input.
        input: String,
        /// Parser message.
        message: String,
    },

    /// The specifier is valid but cannot be handled here.
    #[error("unsupported specifier '{0}'")]
    UnsupportedSpecifier(String),

    /// A relative level was applied to a version without a non-zero segment.
    #[error("version {version} has no non-zero release segment")]
    NoSignificantSegment {
        /// The all-zero version.
        version: String,
    },

    /// A release was put into a set belonging to another package.
    #[error("release of '{found}' cannot be added to the release set of '{expected}'")]
    PackageMismatch {
        /// Package of the set.
        expected: String,
        /// Package of the offending release.
        found: String,
    },

    /// An operation needed at least one release.
    #[error("cannot compute {operation} of an empty release set of '{package}'")]
    EmptyReleaseSet {
        /// Package of the set.
        package: String,
        /// Name of the failed operation.
        operation: &'static str,
    },

    /// An operation needed at least one version.
    #[error("cannot compute {0} of an empty list of versions")]
    EmptyVersionList(&'static str),

    /// A specifier set admits no version at all.
    #[error("specifier set '{0}' cannot be satisfied by any version")]
    EmptySpecifierSet(String),

    /// Two requirement fragments name different packages.
    #[error("cannot combine requirements on different packages: '{lhs}' and '{rhs}'")]
    ConflictingPackage {
        /// Left package.
        lhs: String,
        /// Right package.
        rhs: String,
    },

    /// Two requirement fragments carry different URLs.
    #[error("cannot combine requirements with different urls: '{lhs}' and '{rhs}'")]
    ConflictingUrl {
        /// Left url.
        lhs: String,
        /// Right url.
        rhs: String,
    },

    /// A requirement has both a URL and version specifiers.
    #[error("requirement cannot have both url '{url}' and specifiers '{specifier}'")]
    UrlWithSpecifier {
        /// The url.
        url: String,
        /// The specifiers.
        specifier: String,
    },

    /// A requirement was resolved without a package name.
    #[error("requirement has no package: {0}")]
    MissingPackage(String),

    /// A lower bound was required but the specifier set has none.
    #[error("specifier set '{0}' has no lower bound")]
    MissingLowerBound(String),

    /// Distribution introspection was requested but not configured.
    #[error("no distribution inspector is configured")]
    NoInspector,

    /// Release data could not be fetched.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// An installed distribution could not be inspected.
    #[error("introspection error: {0}")]
    Introspection(String),

    /// IO error.
    #[error("io error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Create an IO error with context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create an [`Error::InvalidVersion`].
    #[must_use]
    pub fn invalid_version(input: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidVersion {
            input: input.into(),
            message: message.to_string(),
        }
    }

    /// Create an [`Error::InvalidSpecifier`].
    #[must_use]
    pub fn invalid_specifier(input: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidSpecifier {
            input: input.into(),
            message: message.to_string(),
        }
    }

    /// Create an [`Error::InvalidRequirement`].
    #[must_use]
    pub fn invalid_requirement(input: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidRequirement {
            input: input.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for compreq operations.
pub type Result<T> = std::result::Result<T, Error>;
