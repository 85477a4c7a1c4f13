//! `requirements.txt` files.

use crate::error::{ManifestError, Result};
use compreq_core::{Requirement, RequirementSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A `requirements.txt` file: one requirement per line.
///
/// Blank lines and `#` comments are dropped on read. The file is written
/// back sorted by package name.
#[derive(Debug, Clone)]
pub struct TextRequirementsFile {
    path: PathBuf,
    requirements: RequirementSet,
}

impl TextRequirementsFile {
    /// Open `path`. A missing file reads as empty.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or a line is not a requirement.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = if path.exists() {
            std::fs::read_to_string(&path).map_err(|e| ManifestError::io(&path, e))?
        } else {
            String::new()
        };
        let requirements = parse(&path, &content)?;
        debug!(path = %path.display(), count = requirements.len(), "read requirements");
        Ok(Self { path, requirements })
    }

    /// File path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current requirements.
    #[must_use]
    pub const fn requirements(&self) -> &RequirementSet {
        &self.requirements
    }

    /// Replace every requirement.
    pub fn set_requirements(&mut self, requirements: RequirementSet) {
        self.requirements = requirements;
    }

    /// Write the file.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, self.to_string()).map_err(|e| ManifestError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "wrote requirements");
        Ok(())
    }
}

fn parse(path: &Path, content: &str) -> Result<RequirementSet> {
    let mut requirements = RequirementSet::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let requirement: Requirement =
            line.parse().map_err(|e: compreq_core::Error| ManifestError::InvalidLine {
                path: path.to_path_buf(),
                line: index + 1,
                message: e.to_string(),
            })?;
        requirements.insert(requirement);
    }
    Ok(requirements)
}

impl fmt::Display for TextRequirementsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.requirements)
    }
}
