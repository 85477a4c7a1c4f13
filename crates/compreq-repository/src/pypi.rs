//! PyPI JSON API client.

use crate::error::{RepositoryError, Result};
use crate::http::{base_url, join, HttpClient};
use chrono::{DateTime, Utc};
use compreq_core::{parse_version, Release, ReleaseSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use url::Url;

/// The public index.
pub const PYPI_URL: &str = "https://pypi.org/";

/// Client for `{index}/pypi/{package}/json`.
#[derive(Debug, Clone)]
pub struct PypiClient {
    http: HttpClient,
    index: Url,
}

impl PypiClient {
    /// Create a client for the index at `index`.
    ///
    /// # Errors
    /// Returns error if `index` is not a URL.
    pub fn new(http: HttpClient, index: &str) -> Result<Self> {
        Ok(Self {
            http,
            index: base_url(index)?,
        })
    }

    /// The index URL.
    #[must_use]
    pub const fn index(&self) -> &Url {
        &self.index
    }

    /// The JSON endpoint of `package`.
    ///
    /// # Errors
    /// Returns error if the package name does not form a URL.
    pub fn project_url(&self, package: &str) -> Result<Url> {
        join(&self.index, &format!("pypi/{package}/json"))
    }

    /// Fetch all releases of `package`.
    ///
    /// # Errors
    /// Returns error if the request fails or the response is malformed.
    pub fn releases(&self, package: &str) -> Result<ReleaseSet> {
        let url = self.project_url(package)?;
        info!(package, url = %url, "fetching releases from PyPI");
        let body = self.http.get_bytes(&url)?;
        parse_project(package, url.as_str(), &body)
    }
}

#[derive(Debug, Deserialize)]
struct ProjectJson {
    #[serde(default)]
    releases: BTreeMap<String, Vec<FileJson>>,
}

#[derive(Debug, Deserialize)]
struct FileJson {
    upload_time_iso_8601: DateTime<Utc>,
    #[serde(default)]
    yanked: bool,
}

/// Decode a PyPI project document into releases of `package`.
///
/// A release's time is the latest upload of its non-yanked files. Releases
/// without such files, or whose version is not PEP 440, are skipped.
///
/// # Errors
/// Returns [`RepositoryError::ParseError`] if `body` is not a project document.
pub fn parse_project(package: &str, source: &str, body: &[u8]) -> Result<ReleaseSet> {
    let project: ProjectJson =
        sonic_rs::from_slice(body).map_err(|e| RepositoryError::parse(source, e))?;

    let mut releases = Vec::with_capacity(project.releases.len());
    for (version_str, files) in project.releases {
        let Some(released_time) = files
            .iter()
            .filter(|file| !file.yanked)
            .map(|file| file.upload_time_iso_8601)
            .max()
        else {
            debug!(package, version = %version_str, "skipping release without files");
            continue;
        };
        match parse_version(&version_str) {
            Ok(version) => releases.push(Release::new(package, version, released_time)),
            Err(e) => warn!(package, version = %version_str, error = %e, "skipping invalid version"),
        }
    }

    let set = ReleaseSet::new(package, releases).map_err(|e| RepositoryError::parse(source, e))?;
    debug!(package, count = set.len(), "parsed PyPI releases");
    Ok(set.with_inferred_successors())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"{
        "info": {"name": "foo"},
        "releases": {
            "1.0.0": [
                {"upload_time_iso_8601": "2021-01-01T10:00:00.000000Z", "yanked": false},
                {"upload_time_iso_8601": "2021-01-02T10:00:00.000000Z", "yanked": false}
            ],
            "1.1.0": [
                {"upload_time_iso_8601": "2021-06-01T10:00:00.000000Z", "yanked": true}
            ],
            "1.2.0rc1": [
                {"upload_time_iso_8601": "2021-09-01T10:00:00.000000Z", "yanked": false},
                {"upload_time_iso_8601": "2021-12-01T10:00:00.000000Z", "yanked": true}
            ],
            "1.2.0": [
                {"upload_time_iso_8601": "2022-01-01T10:00:00.123456Z"}
            ],
            "not-a-version": [
                {"upload_time_iso_8601": "2022-02-01T10:00:00.000000Z", "yanked": false}
            ],
            "2.0.0": []
        }
    }"#;

    #[test]
    fn parses_releases() {
        let set = parse_project("foo", "test", PROJECT.as_bytes()).unwrap();
        let versions: Vec<String> = set.iter().map(|r| r.version.to_string()).collect();
        assert_eq!(versions, ["1.0.0", "1.2.0rc1", "1.2.0"]);

        let first = set.min().unwrap();
        assert_eq!(first.released_time.to_rfc3339(), "2021-01-02T10:00:00+00:00");
        assert_eq!(first.successor.as_ref().unwrap().to_string(), "1.2.0");

        let rc = set.get(&parse_version("1.2.0rc1").unwrap()).unwrap();
        assert_eq!(rc.released_time.to_rfc3339(), "2021-09-01T10:00:00+00:00");
    }

    #[test]
    fn rejects_malformed_document() {
        let err = parse_project("foo", "test", b"{\"releases\": 3}").unwrap_err();
        assert!(matches!(err, RepositoryError::ParseError { .. }));
    }

    #[test]
    fn project_url() {
        let client = PypiClient::new(HttpClient::with_defaults().unwrap(), "https://pypi.org").unwrap();
        assert_eq!(client.project_url("foo").unwrap().as_str(), "https://pypi.org/pypi/foo/json");
        assert_eq!(client.index().as_str(), PYPI_URL);
    }
}
