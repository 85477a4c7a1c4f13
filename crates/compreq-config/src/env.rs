//! Settings from `COMPREQ_*` environment variables.

use crate::error::{ConfigError, Result};
use crate::types::ConfigFile;
use std::collections::BTreeMap;
use std::fmt;

/// Environment variables compreq reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnvVar {
    /// `COMPREQ_PYPI_URL`
    PypiUrl,
    /// `COMPREQ_PYTHON_FTP_URL`
    PythonFtpUrl,
    /// `COMPREQ_TIMEOUT`, in seconds.
    Timeout,
    /// `COMPREQ_RETRIES`
    Retries,
    /// `COMPREQ_VIRTUALENV`
    Virtualenv,
    /// `COMPREQ_NOW`
    Now,
    /// `COMPREQ_PYTHON`
    Python,
}

impl EnvVar {
    /// Every variable, in a stable order.
    pub const ALL: [Self; 7] = [
        Self::PypiUrl,
        Self::PythonFtpUrl,
        Self::Timeout,
        Self::Retries,
        Self::Virtualenv,
        Self::Now,
        Self::Python,
    ];

    /// Variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PypiUrl => "COMPREQ_PYPI_URL",
            Self::PythonFtpUrl => "COMPREQ_PYTHON_FTP_URL",
            Self::Timeout => "COMPREQ_TIMEOUT",
            Self::Retries => "COMPREQ_RETRIES",
            Self::Virtualenv => "COMPREQ_VIRTUALENV",
            Self::Now => "COMPREQ_NOW",
            Self::Python => "COMPREQ_PYTHON",
        }
    }
}

impl fmt::Display for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the `COMPREQ_*` variables that are set and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    values: BTreeMap<EnvVar, String>,
}

impl EnvConfig {
    /// Read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read variables through `lookup`.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let values = EnvVar::ALL
            .into_iter()
            .filter_map(|var| {
                lookup(var.as_str())
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(|v| (var, v))
            })
            .collect();
        Self { values }
    }

    /// Value of `var`, if set.
    #[must_use]
    pub fn get(&self, var: EnvVar) -> Option<&str> {
        self.values.get(&var).map(String::as_str)
    }

    /// Whether no variable is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Convert to a configuration layer.
    ///
    /// # Errors
    /// Returns error if a numeric variable is not a number.
    pub fn to_file(&self) -> Result<ConfigFile> {
        let owned = |var| self.get(var).map(str::to_string);
        Ok(ConfigFile {
            pypi_url: owned(EnvVar::PypiUrl),
            python_ftp_url: owned(EnvVar::PythonFtpUrl),
            timeout: self.number(EnvVar::Timeout)?,
            retries: self.number(EnvVar::Retries)?,
            virtualenv: owned(EnvVar::Virtualenv),
            now: owned(EnvVar::Now),
            python: owned(EnvVar::Python),
        })
    }

    fn number<T>(&self, var: EnvVar) -> Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        self.get(var)
            .map(|v| v.parse().map_err(|e| ConfigError::invalid(var.as_str(), v, e)))
            .transpose()
    }
}
