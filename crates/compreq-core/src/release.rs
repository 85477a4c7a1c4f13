//! Releases of a package and homogeneous sets of them.

use crate::error::{Error, Result};
use crate::version::Version;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A single published release of a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Release {
    /// Package name.
    pub package: String,
    /// Released version.
    pub version: Version,
    /// When the release was published.
    pub released_time: DateTime<Utc>,
    /// Version of the next release of equal or greater stability, if any.
    ///
    /// Use [`ReleaseSet::successor_of`] to get the release itself.
    pub successor: Option<Version>,
}

impl Release {
    /// Create a release without a successor.
    #[must_use]
    pub fn new(package: impl Into<String>, version: Version, released_time: DateTime<Utc>) -> Self {
        Self {
            package: package.into(),
            version,
            released_time,
            successor: None,
        }
    }

    /// Replace the successor.
    #[must_use]
    pub fn with_successor(mut self, successor: Option<Version>) -> Self {
        self.successor = successor;
        self
    }

    /// Whether this is a pre-release (alpha, beta or release candidate).
    #[must_use]
    pub fn is_pre(&self) -> bool {
        self.version.is_pre()
    }

    /// Whether this is a development release.
    #[must_use]
    pub fn is_dev(&self) -> bool {
        self.version.is_dev()
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.package, self.version)
    }
}

/// Releases of one package, ordered by version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseSet {
    package: String,
    releases: BTreeSet<Release>,
}

impl ReleaseSet {
    /// Create a release set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PackageMismatch`] if any release belongs to another
    /// package.
    pub fn new(
        package: impl Into<String>,
        releases: impl IntoIterator<Item = Release>,
    ) -> Result<Self> {
        let package = package.into();
        let releases: BTreeSet<Release> = releases.into_iter().collect();
        if let Some(stray) = releases.iter().find(|r| r.package != package) {
            return Err(Error::PackageMismatch {
                expected: package,
                found: stray.package.clone(),
            });
        }
        Ok(Self { package, releases })
    }

    /// An empty release set.
    #[must_use]
    pub fn empty(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            releases: BTreeSet::new(),
        }
    }

    /// Package the releases belong to.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Number of releases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Whether the set has no releases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Iterate releases in ascending version order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Release> + ExactSizeIterator {
        self.releases.iter()
    }

    /// Whether `release` is a member.
    #[must_use]
    pub fn contains(&self, release: &Release) -> bool {
        self.releases.contains(release)
    }

    /// The release with the given version.
    #[must_use]
    pub fn get(&self, version: &Version) -> Option<&Release> {
        self.releases.iter().find(|r| r.version == *version)
    }

    /// The release with the lowest version.
    #[must_use]
    pub fn min(&self) -> Option<&Release> {
        self.releases.first()
    }

    /// The release with the highest version.
    #[must_use]
    pub fn max(&self) -> Option<&Release> {
        self.releases.last()
    }

    /// Look up the successor of `release` in this set.
    #[must_use]
    pub fn successor_of(&self, release: &Release) -> Option<&Release> {
        release.successor.as_ref().and_then(|v| self.get(v))
    }

    /// A new set with the releases matching `predicate`.
    #[must_use]
    pub fn filter(&self, mut predicate: impl FnMut(&Release) -> bool) -> Self {
        Self {
            package: self.package.clone(),
            releases: self.releases.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Rebuild the set with every successor inferred from the set itself.
    #[must_use]
    pub fn with_inferred_successors(self) -> Self {
        let successors = infer_successors(self.releases.iter().map(|r| &r.version));
        let releases = self
            .releases
            .into_iter()
            .map(|r| {
                let successor = successors.get(&r.version).cloned().flatten();
                r.with_successor(successor)
            })
            .collect();
        Self {
            package: self.package,
            releases,
        }
    }
}

impl<'a> IntoIterator for &'a ReleaseSet {
    type Item = &'a Release;
    type IntoIter = std::collections::btree_set::Iter<'a, Release>;

    fn into_iter(self) -> Self::IntoIter {
        self.releases.iter()
    }
}

impl IntoIterator for ReleaseSet {
    type Item = Release;
    type IntoIter = std::collections::btree_set::IntoIter<Release>;

    fn into_iter(self) -> Self::IntoIter {
        self.releases.into_iter()
    }
}

/// Map every version to the next version of equal or greater stability.
///
/// A final (or post) release is followed by the next final release, a
/// pre-release by the next pre-release or final release, and a development
/// release by the next release of any kind.
#[must_use]
pub fn infer_successors<'a>(
    versions: impl IntoIterator<Item = &'a Version>,
) -> BTreeMap<Version, Option<Version>> {
    let sorted: BTreeSet<&Version> = versions.into_iter().collect();

    let mut next_final: Option<Version> = None;
    let mut next_pre: Option<Version> = None;
    let mut next_dev: Option<Version> = None;
    let mut successors = BTreeMap::new();

    for version in sorted.into_iter().rev() {
        let successor = if version.is_dev() {
            next_dev.replace(version.clone())
        } else if version.is_pre() {
            next_dev = Some(version.clone());
            next_pre.replace(version.clone())
        } else {
            next_dev = Some(version.clone());
            next_pre = Some(version.clone());
            next_final.replace(version.clone())
        };
        successors.insert(version.clone(), successor);
    }
    successors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::parse_version;
    use chrono::TimeZone;

    fn release(package: &str, version: &str, day: u32) -> Release {
        Release::new(
            package,
            parse_version(version).unwrap(),
            Utc.with_ymd_and_hms(2023, 1, day, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn rejects_foreign_release() {
        let err = ReleaseSet::new("foo", [release("foo", "1.0", 1), release("bar", "1.1", 2)])
            .unwrap_err();
        assert!(matches!(err, Error::PackageMismatch { ref found, .. } if found == "bar"));
    }

    #[test]
    fn min_max_follow_version_order() {
        let set = ReleaseSet::new(
            "foo",
            [release("foo", "1.10", 1), release("foo", "1.9", 2), release("foo", "1.2", 3)],
        )
        .unwrap();
        assert_eq!(set.min().unwrap().version.to_string(), "1.2");
        assert_eq!(set.max().unwrap().version.to_string(), "1.10");
        assert!(ReleaseSet::empty("foo").max().is_none());
    }

    #[test]
    fn filter_keeps_package() {
        let set = ReleaseSet::new("foo", [release("foo", "1.0", 1), release("foo", "2.0", 2)])
            .unwrap();
        let filtered = set.filter(|r| r.version.release()[0] > 5);
        assert!(filtered.is_empty());
        assert_eq!(filtered.package(), "foo");
    }

    #[test]
    fn successors_by_stability() {
        let versions: Vec<Version> = [
            "2.0.0",
            "2.1.0a1",
            "2.1.0a2.dev0",
            "2.1.0a2.dev1",
            "2.1.0a2",
            "2.1.0",
        ]
        .iter()
        .map(|v| parse_version(v).unwrap())
        .collect();
        let successors = infer_successors(&versions);
        let successor = |v: &str| {
            successors[&parse_version(v).unwrap()]
                .as_ref()
                .map(ToString::to_string)
        };

        assert_eq!(successor("2.0.0").as_deref(), Some("2.1.0"));
        assert_eq!(successor("2.1.0a1").as_deref(), Some("2.1.0a2"));
        assert_eq!(successor("2.1.0a2.dev0").as_deref(), Some("2.1.0a2.dev1"));
        assert_eq!(successor("2.1.0a2.dev1").as_deref(), Some("2.1.0a2"));
        assert_eq!(successor("2.1.0a2").as_deref(), Some("2.1.0"));
        assert_eq!(successor("2.1.0"), None);
    }

    #[test]
    fn successor_lookup_after_inference() {
        let set = ReleaseSet::new(
            "foo",
            [release("foo", "1.0", 1), release("foo", "1.1rc1", 2), release("foo", "1.1", 3)],
        )
        .unwrap()
        .with_inferred_successors();
        let first = set.min().unwrap();
        assert_eq!(set.successor_of(first).unwrap().version.to_string(), "1.1");
        let rc = set.get(&parse_version("1.1rc1").unwrap()).unwrap();
        assert_eq!(set.successor_of(rc).unwrap().version.to_string(), "1.1");
        assert!(set.successor_of(set.max().unwrap()).is_none());
    }
}
