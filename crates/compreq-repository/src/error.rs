//! Repository-specific error types.

use compreq_core::Error as CoreError;
use std::fmt;

/// Errors fetching or decoding release metadata.
#[derive(Debug)]
pub enum RepositoryError {
    /// The resource does not exist.
    NotFound {
        /// URL that was requested.
        url: String,
    },
    /// Network error during fetch.
    Network {
        /// URL that failed.
        url: String,
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },
    /// Rate limit exceeded.
    RateLimited {
        /// URL that was requested.
        url: String,
        /// Retry after seconds (if known).
        retry_after: Option<u64>,
    },
    /// Timeout during operation.
    Timeout {
        /// URL that timed out.
        url: String,
        /// Timeout duration in seconds.
        timeout_secs: u64,
    },
    /// Response could not be decoded.
    ParseError {
        /// URL or source of the data.
        source: String,
        /// Error message.
        message: String,
    },
    /// Invalid URL.
    InvalidUrl {
        /// The invalid URL.
        url: String,
        /// Error message.
        message: String,
    },
    /// A Python prefilter mentions pre- or dev-releases.
    InvalidPrefilter {
        /// The prefilter.
        specifiers: String,
    },
    /// The HTTP client could not be built.
    Client {
        /// Error message.
        message: String,
    },
}

impl RepositoryError {
    /// Create a parse error.
    pub fn parse(source: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ParseError {
            source: source.into(),
            message: message.to_string(),
        }
    }

    /// Whether repeating the request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network { status, .. } => match status {
                Some(code) => *code >= 500,
                None => true,
            },
            Self::RateLimited { .. } | Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { url } => write!(f, "Not found: {url}"),
            Self::Network {
                url,
                message,
                status,
            } => {
                if let Some(code) = status {
                    write!(f, "HTTP {code} from {url}: {message}")
                } else {
                    write!(f, "Network error fetching {url}: {message}")
                }
            }
            Self::RateLimited { url, retry_after } => {
                if let Some(secs) = retry_after {
                    write!(f, "Rate limited by {url}, retry after {secs}s")
                } else {
                    write!(f, "Rate limited by {url}")
                }
            }
            Self::Timeout { url, timeout_secs } => {
                write!(f, "Request to {url} timed out after {timeout_secs}s")
            }
            Self::ParseError { source, message } => {
                write!(f, "Failed to parse response from {source}: {message}")
            }
            Self::InvalidUrl { url, message } => write!(f, "Invalid URL '{url}': {message}"),
            Self::InvalidPrefilter { specifiers } => write!(
                f,
                "Python prefilter must not mention pre- or dev-releases: {specifiers}"
            ),
            Self::Client { message } => write!(f, "Failed to build HTTP client: {message}"),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        Self::Fetch(err.to_string())
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
