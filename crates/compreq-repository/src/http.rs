//! Blocking HTTP client with timeouts and retry.

use crate::error::{RepositoryError, Result};
use backon::{BlockingRetryable, ExponentialBuilder};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::{debug, trace, warn};
use url::Url;

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Total request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub retries: usize,
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Upper limit for the delay between retries.
    pub max_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(600),
            retries: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP client shared by the fetchers.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("client", &"reqwest::blocking::Client")
            .field("config", &self.config)
            .finish()
    }
}

impl HttpClient {
    /// Create a client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the client cannot be built.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(format!("compreq/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepositoryError::Client {
                message: e.to_string(),
            })?;
        Ok(Self { client, config })
    }

    /// Create a client with default configuration.
    ///
    /// # Errors
    /// Returns error if the client cannot be built.
    pub fn with_defaults() -> Result<Self> {
        Self::new(HttpConfig::default())
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// GET `url` and return the body, retrying transient failures.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted, or immediately for
    /// errors that retrying cannot fix.
    pub fn get_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.config.min_delay)
            .with_max_delay(self.config.max_delay)
            .with_max_times(self.config.retries)
            .with_jitter();
        (|| self.get_once(url))
            .retry(backoff)
            .sleep(std::thread::sleep)
            .when(RepositoryError::is_retryable)
            .notify(|err, delay| {
                warn!(url = %url, error = %err, delay_ms = delay.as_millis() as u64, "retrying request");
            })
            .call()
    }

    /// GET `url` and decode the body as UTF-8 text.
    ///
    /// # Errors
    /// Fails like [`HttpClient::get_bytes`], or if the body is not UTF-8.
    pub fn get_text(&self, url: &Url) -> Result<String> {
        String::from_utf8(self.get_bytes(url)?).map_err(|e| RepositoryError::parse(url.as_str(), e))
    }

    fn get_once(&self, url: &Url) -> Result<Vec<u8>> {
        debug!(url = %url, "GET request starting");
        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|e| self.send_error(url, &e))?;
        let response = check_response(response)?;
        let bytes = response.bytes().map_err(|e| self.send_error(url, &e))?;
        trace!(url = %url, bytes = bytes.len(), "GET request succeeded");
        Ok(bytes.to_vec())
    }

    fn send_error(&self, url: &Url, err: &reqwest::Error) -> RepositoryError {
        if err.is_timeout() {
            RepositoryError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout.as_secs(),
            }
        } else {
            RepositoryError::Network {
                url: url.to_string(),
                message: err.to_string(),
                status: err.status().map(|s| s.as_u16()),
            }
        }
    }
}

fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    match status {
        StatusCode::NOT_FOUND => Err(RepositoryError::NotFound { url }),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            Err(RepositoryError::RateLimited { url, retry_after })
        }
        _ => Err(RepositoryError::Network {
            url,
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
            status: Some(status.as_u16()),
        }),
    }
}

/// Parse `base` and make sure it ends with `/` so relative paths join below it.
///
/// # Errors
/// Returns [`RepositoryError::InvalidUrl`] if `base` is not a URL.
pub fn base_url(base: &str) -> Result<Url> {
    let mut text = base.trim().to_string();
    if !text.ends_with('/') {
        text.push('/');
    }
    Url::parse(&text).map_err(|e| RepositoryError::InvalidUrl {
        url: base.to_string(),
        message: e.to_string(),
    })
}

/// Join `path` below `base`.
///
/// # Errors
/// Returns [`RepositoryError::InvalidUrl`] if the result is not a URL.
pub fn join(base: &Url, path: &str) -> Result<Url> {
    base.join(path).map_err(|e| RepositoryError::InvalidUrl {
        url: format!("{base}{path}"),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let base = base_url("https://pypi.org").unwrap();
        assert_eq!(join(&base, "pypi/foo/json").unwrap().as_str(), "https://pypi.org/pypi/foo/json");
        let nested = base_url("https://www.python.org/ftp/").unwrap();
        assert_eq!(join(&nested, "python/").unwrap().as_str(), "https://www.python.org/ftp/python/");
    }

    #[test]
    fn invalid_base_url() {
        assert!(matches!(base_url("not a url"), Err(RepositoryError::InvalidUrl { .. })));
    }

    #[test]
    fn client_debug_hides_inner() {
        let client = HttpClient::with_defaults().unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("reqwest::blocking::Client"));
        assert_eq!(client.config().retries, 3);
    }
}
