//! Configuration file contents and the resolved settings.

use crate::error::{ConfigError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use compreq_core::SpecifierSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default package index.
pub const DEFAULT_PYPI_URL: &str = "https://pypi.org/";

/// Default root of the Python release archive.
pub const DEFAULT_PYTHON_FTP_URL: &str = "https://www.python.org/ftp/";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Default number of retries after a failed request.
pub const DEFAULT_RETRIES: usize = 3;

/// Default program used to create virtual environments.
pub const DEFAULT_VIRTUALENV: &str = "virtualenv";

/// One layer of configuration: every setting is optional.
///
/// This is the shape of `config.json` and `compreq.json`, and also what
/// environment variables and command-line flags are turned into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigFile {
    /// Package index URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pypi_url: Option<String>,
    /// Python release archive URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_ftp_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Retries after a failed request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<usize>,
    /// Program used to create virtual environments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtualenv: Option<String>,
    /// Fixed "now", as RFC 3339 or `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now: Option<String>,
    /// Supported Python versions, as a specifier set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
}

impl ConfigFile {
    /// Load a layer from a JSON file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        sonic_rs::from_str(&content).map_err(|e| ConfigError::json(path, &e))
    }

    /// Load a layer, treating a missing file as empty.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if path.is_file() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Overlay the settings present in `other`.
    pub fn merge(&mut self, other: &Self) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }
        take(&mut self.pypi_url, &other.pypi_url);
        take(&mut self.python_ftp_url, &other.python_ftp_url);
        take(&mut self.timeout, &other.timeout);
        take(&mut self.retries, &other.retries);
        take(&mut self.virtualenv, &other.virtualenv);
        take(&mut self.now, &other.now);
        take(&mut self.python, &other.python);
    }

    /// Whether no setting is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Package index URL, validated.
    pub pypi_url: String,
    /// Python release archive URL, validated.
    pub python_ftp_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Retries after a failed request.
    pub retries: usize,
    /// Program used to create virtual environments.
    pub virtualenv: String,
    /// Fixed "now"; the wall clock when absent.
    pub now: Option<DateTime<Utc>>,
    /// Supported Python versions, when configured.
    pub python: Option<SpecifierSet>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            pypi_url: DEFAULT_PYPI_URL.to_string(),
            python_ftp_url: DEFAULT_PYTHON_FTP_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
            virtualenv: DEFAULT_VIRTUALENV.to_string(),
            now: None,
            python: None,
        }
    }
}

impl ResolvedConfig {
    /// Apply a merged layer on top of the defaults.
    ///
    /// # Errors
    /// Returns error if a present setting is malformed.
    pub fn from_file(file: &ConfigFile) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = &file.pypi_url {
            config.pypi_url = parse_url("pypi-url", url)?;
        }
        if let Some(url) = &file.python_ftp_url {
            config.python_ftp_url = parse_url("python-ftp-url", url)?;
        }
        if let Some(timeout) = file.timeout {
            if timeout == 0 {
                return Err(ConfigError::invalid("timeout", "0", "must be positive"));
            }
            config.timeout = Duration::from_secs(timeout);
        }
        if let Some(retries) = file.retries {
            config.retries = retries;
        }
        if let Some(virtualenv) = &file.virtualenv {
            if virtualenv.trim().is_empty() {
                return Err(ConfigError::invalid("virtualenv", virtualenv, "must not be empty"));
            }
            config.virtualenv.clone_from(virtualenv);
        }
        if let Some(now) = &file.now {
            config.now = Some(parse_now(now)?);
        }
        if let Some(python) = &file.python {
            config.python = Some(
                python
                    .parse()
                    .map_err(|e| ConfigError::invalid("python", python, e))?,
            );
        }
        Ok(config)
    }
}

fn parse_url(key: &str, value: &str) -> Result<String> {
    let url = Url::parse(value).map_err(|e| ConfigError::invalid(key, value, e))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::invalid(key, value, "not a base URL"));
    }
    Ok(url.into())
}

/// Parse a point in time given as RFC 3339 or as a plain date (midnight UTC).
///
/// # Errors
/// Returns error if `value` is neither.
pub fn parse_now(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc())
        .ok_or_else(|| ConfigError::invalid("now", value, "expected RFC 3339 or YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    #[test]
    fn defaults() {
        let config = ResolvedConfig::default();
        assert_eq!(config.pypi_url, "https://pypi.org/");
        assert_eq!(config.timeout, Duration::from_secs(600));
        assert_eq!(config.retries, 3);
        assert_eq!(config.virtualenv, "virtualenv");
        assert!(config.now.is_none());
        assert!(config.python.is_none());
    }

    #[test]
    fn merge_keeps_unset_values() {
        let mut base = ConfigFile {
            timeout: Some(30),
            virtualenv: Some("venv".into()),
            ..ConfigFile::default()
        };
        base.merge(&ConfigFile {
            timeout: Some(5),
            ..ConfigFile::default()
        });
        assert_eq!(base.timeout, Some(5));
        assert_eq!(base.virtualenv.as_deref(), Some("venv"));
        assert!(!base.is_empty());
        assert!(ConfigFile::default().is_empty());
    }

    #[test]
    fn parses_kebab_case_json() {
        let file: ConfigFile =
            sonic_rs::from_str(r#"{"pypi-url": "https://example.com/", "retries": 0}"#).unwrap();
        let config = ResolvedConfig::from_file(&file).unwrap();
        assert_eq!(config.pypi_url, "https://example.com/");
        assert_eq!(config.retries, 0);
    }

    #[test_case("2023-01-01", 2023, 1, 1, 0 ; "plain date")]
    #[test_case("2023-06-15T12:00:00Z", 2023, 6, 15, 12 ; "utc")]
    #[test_case("2023-06-15T14:00:00+02:00", 2023, 6, 15, 12 ; "offset")]
    fn now_formats(input: &str, y: i32, m: u32, d: u32, h: u32) {
        assert_eq!(
            parse_now(input).unwrap(),
            Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
        );
    }

    #[test_case(ConfigFile { now: Some("yesterday".into()), ..ConfigFile::default() } ; "bad now")]
    #[test_case(ConfigFile { pypi_url: Some("not a url".into()), ..ConfigFile::default() } ; "bad url")]
    #[test_case(ConfigFile { python: Some(">>3".into()), ..ConfigFile::default() } ; "bad python")]
    #[test_case(ConfigFile { timeout: Some(0), ..ConfigFile::default() } ; "zero timeout")]
    fn rejects_malformed(file: ConfigFile) {
        assert!(matches!(
            ResolvedConfig::from_file(&file),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn python_specifier() {
        let file = ConfigFile {
            python: Some(">=3.9,<4".into()),
            ..ConfigFile::default()
        };
        let config = ResolvedConfig::from_file(&file).unwrap();
        assert_eq!(config.python.unwrap().to_string(), "<4,>=3.9");
    }
}
