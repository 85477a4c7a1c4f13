//! Reading and rewriting dependency manifests for compreq.
//!
//! - [`TextRequirementsFile`]: `requirements.txt`
//! - [`PoetryPyprojectFile`]: Poetry's `pyproject.toml`, edited in place with
//!   `toml_edit` so unrelated formatting survives
//! - [`classifiers`]: Python version trove classifiers
//! - [`RegexTextFile`]: any text file, edited with regex substitutions
//! - [`workflows`]: Python versions in GitHub Actions workflows
//!
//! [`ManifestFile`] picks the right format from a file name.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classifiers;
pub mod error;
pub mod poetry;
pub mod regex_file;
pub mod text;
pub mod workflows;

pub use classifiers::{python_classifiers, set_python_classifiers, PYTHON_CLASSIFIER_PREFIX};
pub use error::{ManifestError, Result};
pub use poetry::PoetryPyprojectFile;
pub use regex_file::RegexTextFile;
pub use text::TextRequirementsFile;
pub use workflows::{set_workflow_python_versions, workflow_files};

use compreq_core::RequirementSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// A manifest of either supported format.
#[derive(Debug, Clone)]
pub enum ManifestFile {
    /// A `requirements.txt` style file.
    Text(TextRequirementsFile),
    /// A Poetry `pyproject.toml`.
    Poetry(PoetryPyprojectFile),
}

impl ManifestFile {
    /// Open `path`: files named `pyproject.toml` are Poetry projects, anything
    /// else is read as a requirements file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.file_name().is_some_and(|name| name == "pyproject.toml") {
            PoetryPyprojectFile::open(path).map(Self::Poetry)
        } else {
            TextRequirementsFile::open(path).map(Self::Text)
        }
    }

    /// File path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Text(file) => file.path(),
            Self::Poetry(file) => file.path(),
        }
    }

    /// Requirements, of `group` where the format has groups.
    ///
    /// # Errors
    /// Returns error if a group is requested from a requirements file or the
    /// manifest cannot be interpreted.
    pub fn requirements(&self, group: Option<&str>) -> Result<RequirementSet> {
        match self {
            Self::Text(file) => {
                reject_group(group)?;
                Ok(file.requirements().clone())
            }
            Self::Poetry(file) => file.requirements(group),
        }
    }

    /// Replace the requirements, of `group` where the format has groups.
    ///
    /// # Errors
    /// Returns error if a group is requested from a requirements file or the
    /// manifest cannot be updated.
    pub fn set_requirements(
        &mut self,
        requirements: RequirementSet,
        group: Option<&str>,
    ) -> Result<()> {
        match self {
            Self::Text(file) => {
                reject_group(group)?;
                file.set_requirements(requirements);
                Ok(())
            }
            Self::Poetry(file) => file.set_requirements(&requirements, group),
        }
    }

    /// Write the manifest back.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        match self {
            Self::Text(file) => file.save(),
            Self::Poetry(file) => file.save(),
        }
    }
}

impl fmt::Display for ManifestFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(file) => fmt::Display::fmt(file, f),
            Self::Poetry(file) => fmt::Display::fmt(file, f),
        }
    }
}

fn reject_group(group: Option<&str>) -> Result<()> {
    match group {
        Some(group) => Err(ManifestError::GroupsUnsupported(group.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_format_by_name() {
        let tmp = tempfile::tempdir().unwrap();
        let pyproject = tmp.path().join("pyproject.toml");
        std::fs::write(&pyproject, "[tool.poetry]\n[tool.poetry.dependencies]\nfoo = \"^1.0\"\n")
            .unwrap();

        let poetry = ManifestFile::open(&pyproject).unwrap();
        assert!(matches!(poetry, ManifestFile::Poetry(_)));
        assert_eq!(poetry.requirements(None).unwrap().to_string(), "foo<2.0,>=1.0\n");

        let mut text = ManifestFile::open(tmp.path().join("requirements-dev.txt")).unwrap();
        assert!(matches!(text, ManifestFile::Text(_)));
        assert!(text.requirements(Some("dev")).is_err());
        text.set_requirements("foo>=1".parse().unwrap(), None).unwrap();
        text.save().unwrap();
        assert_eq!(text.to_string(), "foo>=1\n");
        assert_eq!(text.path(), tmp.path().join("requirements-dev.txt"));
    }
}
