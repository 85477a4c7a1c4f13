//! Disposable virtual environments used to inspect distributions.

use crate::process::ProcessBuilder;
use crate::{PlatformError, Result};
use compreq_core::{
    floor, DistMetadata, Requirement, RequirementSet, SpecifierSet, Version, MINOR, PYTHON,
};
use serde::Deserialize;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The program used to create environments unless configured otherwise.
pub const DEFAULT_VIRTUALENV: &str = "virtualenv";

/// Prints `{name, version, requires_python, requires}` of the distribution
/// named by the first argument.
const DIST_METADATA_SCRIPT: &str = r#"
import json
import sys
from importlib.metadata import distribution

dist = distribution(sys.argv[1])
print(json.dumps({
    "name": dist.metadata["Name"],
    "version": dist.version,
    "requires_python": dist.metadata.get("Requires-Python") or "",
    "requires": dist.requires or [],
}))
"#;

/// A virtual environment at a known path.
#[derive(Debug, Clone)]
pub struct VirtualEnv {
    path: PathBuf,
}

impl VirtualEnv {
    /// Refer to an existing environment.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create an environment at `path` for the minor series of `python`.
    ///
    /// # Errors
    /// Returns error if `virtualenv` fails.
    pub fn create(virtualenv: &str, path: impl Into<PathBuf>, python: &Version) -> Result<Self> {
        let venv = Self::open(path);
        let command = create_command(virtualenv, &venv.path, python)?;
        info!(path = %venv.path.display(), python = %python, "creating virtualenv");
        command.run()?;
        Ok(venv)
    }

    /// Root of the environment.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A program installed in the environment.
    #[must_use]
    pub fn bin(&self, program: &str) -> PathBuf {
        if cfg!(windows) {
            self.path.join("Scripts").join(program)
        } else {
            self.path.join("bin").join(program)
        }
    }

    /// The `pip install` command for `requirements`.
    #[must_use]
    pub fn install_command(&self, requirements: &RequirementSet, deps: bool) -> ProcessBuilder {
        let mut command = ProcessBuilder::new(self.bin("pip"))
            .arg("install")
            .arg("--disable-pip-version-check");
        if !deps {
            command = command.arg("--no-deps");
        }
        command.args(requirements.iter().map(ToString::to_string))
    }

    /// Install `requirements`, with or without their dependencies.
    ///
    /// # Errors
    /// Returns error if `pip` fails.
    pub fn install(&self, requirements: &RequirementSet, deps: bool) -> Result<()> {
        if requirements.is_empty() {
            return Ok(());
        }
        info!(count = requirements.len(), deps, "installing into virtualenv");
        self.install_command(requirements, deps).run()?;
        Ok(())
    }

    /// Metadata of the installed distribution `package`.
    ///
    /// # Errors
    /// Returns error if the distribution is not installed or its metadata is
    /// malformed.
    pub fn dist_metadata(&self, package: &str) -> Result<DistMetadata> {
        let output = ProcessBuilder::new(self.bin("python"))
            .args(["-c", DIST_METADATA_SCRIPT, package])
            .run()?;
        parse_dist_metadata(package, &output)
    }
}

fn create_command(virtualenv: &str, path: &Path, python: &Version) -> Result<ProcessBuilder> {
    let series = floor(MINOR, python, false)
        .map_err(|e| PlatformError::metadata(PYTHON, e))?;
    Ok(ProcessBuilder::new(virtualenv)
        .arg("-p")
        .arg(format!("python{series}"))
        .arg(path.display().to_string()))
}

#[derive(Debug, Deserialize)]
struct DistMetadataJson {
    name: String,
    version: String,
    #[serde(default)]
    requires_python: String,
    #[serde(default)]
    requires: Vec<String>,
}

/// Decode the output of the metadata script.
///
/// `Requires-Python` becomes a `python` requirement.
///
/// # Errors
/// Returns [`PlatformError::Metadata`] on malformed output.
pub fn parse_dist_metadata(package: &str, output: &str) -> Result<DistMetadata> {
    let json: DistMetadataJson =
        sonic_rs::from_str(output.trim()).map_err(|e| PlatformError::metadata(package, e))?;
    let version = compreq_core::parse_version(&json.version)
        .map_err(|e| PlatformError::metadata(package, e))?;

    let mut requires = RequirementSet::new();
    if !json.requires_python.trim().is_empty() {
        let specifier: SpecifierSet = json
            .requires_python
            .parse()
            .map_err(|e| PlatformError::metadata(package, e))?;
        let python = Requirement::named(PYTHON)
            .and_then(|r| r.with_specifier(specifier))
            .map_err(|e| PlatformError::metadata(package, e))?;
        requires.insert(python);
    }
    for text in &json.requires {
        let requirement: Requirement = text
            .parse()
            .map_err(|e| PlatformError::metadata(package, e))?;
        requires
            .merge(requirement)
            .map_err(|e| PlatformError::metadata(package, e))?;
    }
    debug!(package, name = %json.name, version = %version, requires = requires.len(), "read metadata");

    Ok(DistMetadata {
        package: package.to_string(),
        version,
        requires,
    })
}

/// A virtual environment in a temporary directory, removed on drop.
#[derive(Debug)]
pub struct TempVirtualEnv {
    venv: VirtualEnv,
    dir: Option<tempfile::TempDir>,
}

impl TempVirtualEnv {
    /// Create a fresh environment for the minor series of `python`.
    ///
    /// # Errors
    /// Returns error if the directory or the environment cannot be created.
    pub fn create(virtualenv: &str, python: &Version) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("compreq_venv")
            .tempdir()
            .map_err(|e| PlatformError::TempDir(e.to_string()))?;
        let venv = VirtualEnv::create(virtualenv, dir.path().join("venv"), python)?;
        Ok(Self {
            venv,
            dir: Some(dir),
        })
    }
}

impl Deref for TempVirtualEnv {
    type Target = VirtualEnv;

    fn deref(&self) -> &VirtualEnv {
        &self.venv
    }
}

impl Drop for TempVirtualEnv {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "Failed to delete virtualenv");
            } else {
                debug!(path = %path.display(), "Deleted virtualenv");
            }
        }
    }
}
