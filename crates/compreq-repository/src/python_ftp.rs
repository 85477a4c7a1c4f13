//! Crawler for the python.org FTP listings.
//!
//! Python releases are not on PyPI. Their release times are read from the
//! HTML directory listings under `{ftp}/python/`: every release directory
//! holds a `Python-<version>.tgz` source archive whose modification time is
//! taken as the release time.

use crate::error::{RepositoryError, Result};
use crate::http::{base_url, join, HttpClient};
use chrono::{DateTime, NaiveDateTime, Utc};
use compreq_core::{parse_version, Release, ReleaseSet, SpecifierSet, Version, PYTHON};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, trace};
use url::Url;

/// The public FTP root.
pub const PYTHON_FTP_URL: &str = "https://www.python.org/ftp/";

const LISTING_TIME_FORMAT: &str = "%d-%b-%Y %H:%M";

static LISTING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="([^"]+)">[^<]*</a>\s*(\d{2}-\w{3}-\d{4} \d{2}:\d{2})\s+(-|\d+)"#)
        .expect("invalid listing regex")
});

static TGZ_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Python-(.+)\.tgz$").expect("invalid archive name regex"));

/// One line of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Entry name; directories end with `/`.
    pub name: String,
    /// Modification time.
    pub modified: DateTime<Utc>,
    /// Size in bytes, for files.
    pub size: Option<u64>,
}

impl ListingEntry {
    /// Whether the entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// Parse an HTML directory listing. The parent link is skipped.
///
/// # Errors
/// Returns [`RepositoryError::ParseError`] on malformed timestamps or sizes.
pub fn parse_listing(source: &str, html: &str) -> Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    for captures in LISTING_REGEX.captures_iter(html) {
        let name = &captures[1];
        if name == "../" {
            continue;
        }
        let modified = NaiveDateTime::parse_from_str(&captures[2], LISTING_TIME_FORMAT)
            .map_err(|e| RepositoryError::parse(source, format!("{}: {e}", &captures[2])))?
            .and_utc();
        let size = match &captures[3] {
            "-" => None,
            digits => Some(
                digits
                    .parse()
                    .map_err(|e| RepositoryError::parse(source, format!("{digits}: {e}")))?,
            ),
        };
        entries.push(ListingEntry {
            name: name.to_string(),
            modified,
            size,
        });
    }
    Ok(entries)
}

/// The version a release directory is named after, if it is one.
fn release_dir_version(entry: &ListingEntry) -> Option<Version> {
    let name = entry.name.strip_suffix('/')?;
    if !name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    parse_version(name).ok()
}

/// Source archives in a release directory listing.
fn archive_releases(entries: &[ListingEntry]) -> Vec<Release> {
    entries
        .iter()
        .filter(|entry| !entry.is_dir())
        .filter_map(|entry| {
            let captures = TGZ_REGEX.captures(&entry.name)?;
            let version = parse_version(&captures[1]).ok()?;
            Some(Release::new(PYTHON, version, entry.modified))
        })
        .collect()
}

/// Check that `prefilter` does not mention pre- or dev-releases.
///
/// # Errors
/// Returns [`RepositoryError::InvalidPrefilter`] otherwise.
pub fn check_prefilter(prefilter: &SpecifierSet) -> Result<()> {
    if prefilter.mentions_prerelease() {
        return Err(RepositoryError::InvalidPrefilter {
            specifiers: prefilter.to_string(),
        });
    }
    Ok(())
}

/// Client for the python.org FTP listings.
#[derive(Debug, Clone)]
pub struct PythonFtpClient {
    http: HttpClient,
    root: Url,
}

impl PythonFtpClient {
    /// Create a client for the FTP root at `root`.
    ///
    /// # Errors
    /// Returns error if `root` is not a URL.
    pub fn new(http: HttpClient, root: &str) -> Result<Self> {
        Ok(Self {
            http,
            root: base_url(root)?,
        })
    }

    /// The FTP root URL.
    #[must_use]
    pub const fn root(&self) -> &Url {
        &self.root
    }

    fn list(&self, url: &Url) -> Result<Vec<ListingEntry>> {
        trace!(url = %url, "listing directory");
        parse_listing(url.as_str(), &self.http.get_text(url)?)
    }

    /// Fetch the Python releases whose release directory matches `prefilter`.
    ///
    /// Every matching directory costs one request, so a tight prefilter is
    /// much faster than an empty one.
    ///
    /// # Errors
    /// Returns error if the prefilter is invalid or a listing cannot be
    /// fetched.
    pub fn releases(&self, prefilter: &SpecifierSet) -> Result<ReleaseSet> {
        check_prefilter(prefilter)?;
        let python_dir = join(&self.root, "python/")?;
        info!(url = %python_dir, prefilter = %prefilter, "fetching Python releases");

        let mut releases = Vec::new();
        for entry in self.list(&python_dir)? {
            let Some(version) = release_dir_version(&entry) else {
                continue;
            };
            if !prefilter.contains(&version) {
                continue;
            }
            let dir = join(&python_dir, &entry.name)?;
            let found = archive_releases(&self.list(&dir)?);
            debug!(version = %version, archives = found.len(), "listed release directory");
            releases.extend(found);
        }

        let set = ReleaseSet::new(PYTHON, releases)
            .map_err(|e| RepositoryError::parse(python_dir.as_str(), e))?;
        Ok(set.with_inferred_successors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_LISTING: &str = r#"<html>
<head><title>Index of /ftp/python/</title></head>
<body>
<h1>Index of /ftp/python/</h1><hr><pre><a href="../">../</a>
<a href="2.0/">2.0/</a>                                               04-Mar-2014 22:19                   -
<a href="3.11.0/">3.11.0/</a>                                            24-Oct-2022 14:03                   -
<a href="doc/">doc/</a>                                               09-Jan-2023 20:41                   -
<a href="index-windows.json">index-windows.json</a>                                 05-Feb-2025 11:30               94613
</pre><hr></body>
</html>"#;

    const RELEASE_LISTING: &str = r#"<pre><a href="../">../</a>
<a href="Python-3.11.0.tar.xz">Python-3.11.0.tar.xz</a>                               24-Oct-2022 14:03            19816176
<a href="Python-3.11.0.tgz">Python-3.11.0.tgz</a>                                  24-Oct-2022 14:04            26333656
<a href="Python-3.11.0rc2.tgz">Python-3.11.0rc2.tgz</a>                               12-Sep-2022 08:11            26327214
<a href="windows/">windows/</a>                                           24-Oct-2022 13:03                   -
</pre>"#;

    #[test]
    fn parses_listing() {
        let entries = parse_listing("test", ROOT_LISTING).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1].name, "3.11.0/");
        assert!(entries[1].is_dir());
        assert_eq!(entries[1].modified.to_rfc3339(), "2022-10-24T14:03:00+00:00");
        assert_eq!(entries[3].size, Some(94613));
    }

    #[test]
    fn release_directories() {
        let entries = parse_listing("test", ROOT_LISTING).unwrap();
        let versions: Vec<String> = entries
            .iter()
            .filter_map(release_dir_version)
            .map(|v| v.to_string())
            .collect();
        assert_eq!(versions, ["2.0", "3.11.0"]);
    }

    #[test]
    fn archives_in_release_directory() {
        let entries = parse_listing("test", RELEASE_LISTING).unwrap();
        let releases = archive_releases(&entries);
        let versions: Vec<String> = releases.iter().map(|r| r.version.to_string()).collect();
        assert_eq!(versions, ["3.11.0", "3.11.0rc2"]);
        assert_eq!(releases[0].released_time.to_rfc3339(), "2022-10-24T14:04:00+00:00");
    }

    #[test]
    fn prefilter_must_not_mention_prereleases() {
        assert!(check_prefilter(&">=3.9,<4".parse().unwrap()).is_ok());
        assert!(matches!(
            check_prefilter(&">=3.12.0rc1".parse().unwrap()),
            Err(RepositoryError::InvalidPrefilter { .. })
        ));
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        let html = r#"<a href="x/">x/</a>   31-Foo-2022 14:03   -"#;
        assert!(parse_listing("test", html).is_err());
    }
}
