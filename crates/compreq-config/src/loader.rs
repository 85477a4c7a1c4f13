//! Merging configuration layers.

use crate::env::EnvConfig;
use crate::error::Result;
use crate::types::{ConfigFile, ResolvedConfig};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the global configuration file.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// Name of the project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "compreq.json";

/// Where a configuration layer came from, lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in defaults.
    Default,
    /// The user's global `config.json`.
    Global,
    /// The project's `compreq.json`.
    Project,
    /// `COMPREQ_*` environment variables.
    Environment,
    /// Command-line flags.
    Cli,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Global => "global",
            Self::Project => "project",
            Self::Environment => "environment",
            Self::Cli => "cli",
        })
    }
}

/// Settings given on the command line.
pub type CliOverrides = ConfigFile;

/// Loads and merges every configuration layer for a project.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    project_dir: PathBuf,
    global_dir: Option<PathBuf>,
    env: EnvConfig,
}

impl ConfigLoader {
    /// Loader for the project in `project_dir`, reading the process
    /// environment and the platform configuration directory.
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let global_dir = directories::ProjectDirs::from("", "", "compreq")
            .map(|dirs| dirs.config_dir().to_path_buf());
        Self {
            project_dir: project_dir.into(),
            global_dir,
            env: EnvConfig::from_env(),
        }
    }

    /// Replace the global configuration directory. `None` skips that layer.
    #[must_use]
    pub fn with_global_dir(mut self, global_dir: Option<PathBuf>) -> Self {
        self.global_dir = global_dir;
        self
    }

    /// Replace the environment snapshot.
    #[must_use]
    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.env = env;
        self
    }

    /// Path of the global configuration file, if there is a config directory.
    #[must_use]
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_dir.as_ref().map(|d| d.join(GLOBAL_CONFIG_FILE))
    }

    /// Path of the project configuration file.
    #[must_use]
    pub fn project_config_path(&self) -> PathBuf {
        self.project_dir.join(PROJECT_CONFIG_FILE)
    }

    /// Project directory.
    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Every non-empty layer above the defaults, lowest priority first.
    ///
    /// # Errors
    /// Returns error if a present file or variable is malformed.
    pub fn layers(&self, cli: &CliOverrides) -> Result<Vec<(ConfigSource, ConfigFile)>> {
        let mut layers = Vec::new();
        if let Some(path) = self.global_config_path()
            && let Some(file) = ConfigFile::load_optional(&path)?
        {
            layers.push((ConfigSource::Global, file));
        }
        if let Some(file) = ConfigFile::load_optional(&self.project_config_path())? {
            layers.push((ConfigSource::Project, file));
        }
        layers.push((ConfigSource::Environment, self.env.to_file()?));
        layers.push((ConfigSource::Cli, cli.clone()));
        layers.retain(|(_, file)| !file.is_empty());
        Ok(layers)
    }

    /// Merge every layer over the defaults.
    ///
    /// # Errors
    /// Returns error if any layer is malformed.
    pub fn resolve(&self, cli: &CliOverrides) -> Result<ResolvedConfig> {
        let mut merged = ConfigFile::default();
        for (source, layer) in self.layers(cli)? {
            debug!(%source, ?layer, "applying configuration layer");
            merged.merge(&layer);
        }
        ResolvedConfig::from_file(&merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvConfig;
    use crate::error::ConfigError;
    use std::time::Duration;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn loader(project: &Path, global: &Path, env: &[(&'static str, &'static str)]) -> ConfigLoader {
        let env = env.to_vec();
        ConfigLoader::new(project)
            .with_global_dir(Some(global.to_path_buf()))
            .with_env(EnvConfig::from_lookup(move |name| {
                env.iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| (*v).to_string())
            }))
    }

    #[test]
    fn defaults_without_any_layer() {
        let tmp = tempfile::tempdir().unwrap();
        let config = loader(&tmp.path().join("p"), &tmp.path().join("g"), &[])
            .resolve(&CliOverrides::default())
            .unwrap();
        assert_eq!(config, ResolvedConfig::default());
    }

    #[test]
    fn later_layers_win() {
        let tmp = tempfile::tempdir().unwrap();
        let project = tmp.path().join("project");
        let global = tmp.path().join("global");
        write(&global, "config.json", r#"{"timeout": 10, "retries": 1, "virtualenv": "venv-g"}"#);
        write(&project, "compreq.json", r#"{"timeout": 20, "python": ">=3.9"}"#);

        let loader = loader(&project, &global, &[("COMPREQ_RETRIES", "5")]);
        let cli = CliOverrides {
            now: Some("2023-01-01".into()),
            ..CliOverrides::default()
        };
        let layers = loader.layers(&cli).unwrap();
        let sources: Vec<_> = layers.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            sources,
            [
                ConfigSource::Global,
                ConfigSource::Project,
                ConfigSource::Environment,
                ConfigSource::Cli
            ]
        );

        let config = loader.resolve(&cli).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.retries, 5);
        assert_eq!(config.virtualenv, "venv-g");
        assert_eq!(config.python.unwrap().to_string(), ">=3.9");
        assert!(config.now.is_some());
    }

    #[test]
    fn broken_project_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "compreq.json", "{not json");
        let err = loader(tmp.path(), &tmp.path().join("g"), &[])
            .resolve(&CliOverrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
    }

    #[test]
    fn paths() {
        let loader = ConfigLoader::new("/tmp/project").with_global_dir(None);
        assert!(loader.project_config_path().ends_with("compreq.json"));
        assert!(loader.global_config_path().is_none());
        assert_eq!(loader.project_dir(), Path::new("/tmp/project"));
    }
}
