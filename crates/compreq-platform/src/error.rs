//! Platform error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors running external programs.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// I/O error with path context.
    #[error("I/O error at '{path}': {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Process spawn failed.
    #[error("failed to spawn process '{command}': {reason}")]
    SpawnFailed {
        /// Command that failed.
        command: String,
        /// Failure reason.
        reason: String,
    },

    /// Process exited with non-zero status.
    #[error("'{command}' exited with code {code}: {output}")]
    ProcessFailed {
        /// Command line.
        command: String,
        /// Exit code, or -1 when killed by a signal.
        code: i32,
        /// Combined output.
        output: String,
    },

    /// Temporary directory error.
    #[error("temp dir error: {0}")]
    TempDir(String),

    /// Distribution metadata could not be read.
    #[error("bad metadata for '{package}': {message}")]
    Metadata {
        /// Package name.
        package: String,
        /// Error message.
        message: String,
    },
}

impl PlatformError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a spawn failed error.
    #[must_use]
    pub fn spawn_failed(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Create a metadata error.
    #[must_use]
    pub fn metadata(package: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Metadata {
            package: package.into(),
            message: message.to_string(),
        }
    }
}

impl From<PlatformError> for compreq_core::Error {
    fn from(err: PlatformError) -> Self {
        Self::Introspection(err.to_string())
    }
}

/// Result type for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PlatformError::io("/test/path", &std::io::Error::from_raw_os_error(2));
        assert!(err.to_string().contains("/test/path"));
    }

    #[test]
    fn converts_to_introspection_error() {
        let err: compreq_core::Error = PlatformError::ProcessFailed {
            command: "pip install foo".into(),
            code: 1,
            output: "no such package".into(),
        }
        .into();
        assert!(matches!(err, compreq_core::Error::Introspection(ref m) if m.contains("pip install foo")));
    }
}
