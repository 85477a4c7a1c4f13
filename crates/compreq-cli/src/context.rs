//! State shared by every command: configuration and the release source.

use crate::commands::Cli;
use anyhow::{Context as _, Result};
use compreq_config::{ConfigLoader, ResolvedConfig};
use compreq_core::{ReleaseSource, SpecifierSet};
use compreq_lazy::{CompReq, DefaultContext};
use compreq_platform::VenvInspector;
use compreq_repository::{
    CachedSource, DefaultSource, HttpClient, HttpConfig, PypiClient, PythonFtpClient,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Python range used when neither configuration nor manifest names one.
pub const DEFAULT_PYTHON: &str = ">=3.8";

/// CLI context shared across commands.
#[derive(Debug)]
pub struct CliContext {
    /// Working directory
    pub working_dir: PathBuf,
    /// Resolved configuration
    pub config: ResolvedConfig,
    source: Arc<CachedSource<DefaultSource>>,
}

impl CliContext {
    /// Load configuration and set up the release source.
    pub fn new(cli: &Cli) -> Result<Self> {
        let working_dir = match &cli.working_dir {
            Some(dir) => std::fs::canonicalize(dir)
                .with_context(|| format!("cannot open working directory {}", dir.display()))?,
            None => std::env::current_dir()?,
        };

        let config = ConfigLoader::new(&working_dir).resolve(&cli.settings.to_overrides())?;
        debug!(?config, "resolved configuration");

        let http = HttpClient::new(HttpConfig {
            timeout: config.timeout,
            retries: config.retries,
            ..HttpConfig::default()
        })?;
        let source = DefaultSource::new(
            PypiClient::new(http.clone(), &config.pypi_url)?,
            PythonFtpClient::new(http, &config.python_ftp_url)?,
        );

        Ok(Self {
            working_dir,
            config,
            source: Arc::new(CachedSource::new(source)),
        })
    }

    /// Resolve `path` against the working directory.
    pub fn path(&self, path: &Path) -> PathBuf {
        self.working_dir.join(path)
    }

    /// The Python range to work with: configured, else `fallback` when it is
    /// not empty, else [`DEFAULT_PYTHON`].
    pub fn python_specifier(&self, fallback: Option<&SpecifierSet>) -> Result<SpecifierSet> {
        if let Some(python) = &self.config.python {
            return Ok(python.clone());
        }
        match fallback {
            Some(specifier) if !specifier.is_empty() => Ok(specifier.clone()),
            _ => Ok(DEFAULT_PYTHON.parse()?),
        }
    }

    /// A resolver for the given Python range.
    pub fn compreq(&self, python: SpecifierSet) -> Result<CompReq> {
        let source: Arc<dyn ReleaseSource> = self.source.clone();
        let inspector = Arc::new(VenvInspector::new(self.config.virtualenv.clone()));
        let mut context = DefaultContext::new(python, source)?.with_inspector(inspector);
        if let Some(now) = self.config.now {
            context = context.with_now(now);
        }
        Ok(CompReq::new(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn context(dir: &Path, extra: &[&str]) -> CliContext {
        let mut argv = vec!["compreq", "-d", dir.to_str().unwrap()];
        argv.extend_from_slice(extra);
        argv.extend(["bounds", ">=1"]);
        CliContext::new(&Cli::try_parse_from(argv).unwrap()).unwrap()
    }

    #[test]
    fn python_specifier_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        let manifest: SpecifierSet = ">=3.10".parse().unwrap();

        let ctx = context(tmp.path(), &[]);
        assert_eq!(ctx.python_specifier(None).unwrap().to_string(), DEFAULT_PYTHON);
        assert_eq!(ctx.python_specifier(Some(&SpecifierSet::new())).unwrap().to_string(), DEFAULT_PYTHON);
        assert_eq!(ctx.python_specifier(Some(&manifest)).unwrap(), manifest);

        let ctx = context(tmp.path(), &["--python", ">=3.12"]);
        assert_eq!(ctx.python_specifier(Some(&manifest)).unwrap().to_string(), ">=3.12");
    }

    #[test]
    fn paths_are_relative_to_working_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), &[]);
        assert_eq!(
            ctx.path(Path::new("pyproject.toml")),
            std::fs::canonicalize(tmp.path()).unwrap().join("pyproject.toml")
        );
    }

    #[test]
    fn missing_working_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope");
        let cli = Cli::try_parse_from(["compreq", "-d", missing.to_str().unwrap(), "bounds", ">=1"])
            .unwrap();
        assert!(CliContext::new(&cli).is_err());
    }
}
