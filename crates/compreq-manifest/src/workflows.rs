//! Python versions in GitHub Actions workflows.
//!
//! Two shapes are rewritten, matching how workflows usually pin Python:
//!
//! ```yaml
//!       python-version: "3.9"
//!     strategy:
//!       matrix:
//!         python: ["3.9", "3.10", "3.11"]
//! ```
//!
//! The default `python-version` becomes the oldest supported minor series
//! and the `python` matrix lists every supported minor series.

use crate::error::{ManifestError, Result};
use crate::regex_file::RegexTextFile;
use compreq_core::version::floor_at;
use compreq_core::{ReleaseSet, Version};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

static PYTHON_VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)(^ +python-version: ")\d+\.\d+("$)"#).expect("invalid python-version regex")
});

static PYTHON_MATRIX_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)(^ +matrix:\s^ +python: \[).*(\]$)").expect("invalid python matrix regex")
});

/// Distinct minor series of `python_releases`, ascending.
#[must_use]
pub fn python_minor_versions(python_releases: &ReleaseSet) -> Vec<Version> {
    python_releases
        .iter()
        .map(|release| floor_at(1, &release.version, false))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Workflow files (`*.yml`, `*.yaml`) directly inside `dir`, sorted by path.
///
/// A missing directory has no workflows.
///
/// # Errors
/// Returns error if the directory or a file cannot be read.
pub fn workflow_files(dir: &Path) -> Result<Vec<RegexTextFile>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| ManifestError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == "yml" || ext == "yaml")
        })
        .collect();
    paths.sort();
    paths.into_iter().map(RegexTextFile::open).collect()
}

/// Point the default `python-version` and the `python` matrix of a workflow
/// at `python_releases`. Returns the number of rewritten entries.
pub fn set_workflow_python_versions(workflow: &mut RegexTextFile, python_releases: &ReleaseSet) -> usize {
    let minors = python_minor_versions(python_releases);
    let Some(oldest) = minors.first() else {
        return 0;
    };
    let listed = minors
        .iter()
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let defaults = workflow.sub(&PYTHON_VERSION_REGEX, |caps: &Captures<'_>| {
        format!("{}{oldest}{}", &caps[1], &caps[2])
    });
    let matrices = workflow.sub(&PYTHON_MATRIX_REGEX, |caps: &Captures<'_>| {
        format!("{}{listed}{}", &caps[1], &caps[2])
    });
    debug!(path = %workflow.path().display(), defaults, matrices, "python versions in workflow");
    defaults + matrices
}
