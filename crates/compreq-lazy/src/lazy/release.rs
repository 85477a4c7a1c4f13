//! Lazy releases and release sets.

use super::specifier::LazySpecifierSet;
use crate::context::{Context, PackageContext};
use chrono::{DateTime, Utc};
use compreq_core::version::floor_at;
use compreq_core::{Age, Error, Level, Release, ReleaseSet, Result};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// A release that is computed when resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LazyRelease {
    /// A fixed release.
    Eager(Release),
    /// The lowest version of a release set.
    Min(Box<LazyReleaseSet>),
    /// The highest version of a release set.
    Max(Box<LazyReleaseSet>),
}

impl LazyRelease {
    /// Resolve to a concrete release.
    ///
    /// # Errors
    ///
    /// Fails if the release set to select from is empty or cannot be
    /// resolved.
    pub fn resolve(&self, context: &PackageContext<'_>) -> Result<Release> {
        match self {
            Self::Eager(release) => Ok(release.clone()),
            Self::Min(source) => {
                let set = source.resolve(context)?;
                set.min().cloned().ok_or_else(|| empty(&set, "min"))
            }
            Self::Max(source) => {
                let set = source.resolve(context)?;
                set.max().cloned().ok_or_else(|| empty(&set, "max"))
            }
        }
    }
}

fn empty(set: &ReleaseSet, operation: &'static str) -> Error {
    Error::EmptyReleaseSet {
        package: set.package().to_string(),
        operation,
    }
}

impl fmt::Display for LazyRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager(release) => write!(f, "{}", release.version),
            Self::Min(source) => write!(f, "min({source})"),
            Self::Max(source) => write!(f, "max({source})"),
        }
    }
}

/// Parameters of an age filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgeFilter {
    /// Required age.
    pub age: Age,
    /// Reference time; the context's time when unset.
    pub now: Option<DateTime<Utc>>,
    /// Whether an empty result is acceptable.
    pub allow_empty: bool,
}

impl AgeFilter {
    /// A filter on `age`, relative to the context's time.
    #[must_use]
    pub const fn new(age: Age) -> Self {
        Self {
            age,
            now: None,
            allow_empty: false,
        }
    }

    /// Use a fixed reference time.
    #[must_use]
    pub const fn now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Allow the filter to remove every release.
    #[must_use]
    pub const fn allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }

    fn cutoff(&self, context: &PackageContext<'_>) -> Result<DateTime<Utc>> {
        self.age.before(self.now.unwrap_or_else(|| context.now()))
    }
}

impl From<Age> for AgeFilter {
    fn from(age: Age) -> Self {
        Self::new(age)
    }
}

/// A set of releases that is computed when resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LazyReleaseSet {
    /// Fixed releases.
    Eager(BTreeSet<LazyRelease>),
    /// Every release of a package, or of the context package when unset.
    All(Option<String>),
    /// Releases of the source that are neither pre- nor dev-releases.
    Prod(Box<LazyReleaseSet>),
    /// Releases of the source that are not dev-releases.
    Pre(Box<LazyReleaseSet>),
    /// Releases of the source matching specifiers.
    Specifier {
        /// Releases to filter.
        source: Box<LazyReleaseSet>,
        /// Specifiers to match.
        specifier_set: LazySpecifierSet,
    },
    /// Releases of the source at least some age old.
    MinAge {
        /// Releases to filter.
        source: Box<LazyReleaseSet>,
        /// Age parameters.
        filter: AgeFilter,
    },
    /// Releases of the source at most some age old.
    MaxAge {
        /// Releases to filter.
        source: Box<LazyReleaseSet>,
        /// Age parameters.
        filter: AgeFilter,
    },
    /// Releases of the source within the `n` most recent buckets at a level.
    Count {
        /// Releases to filter.
        source: Box<LazyReleaseSet>,
        /// Bucket level.
        level: Level,
        /// Number of buckets.
        n: usize,
    },
}

impl LazyReleaseSet {
    /// Resolve to a concrete release set.
    ///
    /// # Errors
    ///
    /// Fails if release data cannot be fetched or a nested expression fails.
    pub fn resolve(&self, context: &PackageContext<'_>) -> Result<ReleaseSet> {
        match self {
            Self::Eager(releases) => {
                let releases = releases
                    .iter()
                    .map(|r| r.resolve(context))
                    .collect::<Result<Vec<_>>>()?;
                let package = releases
                    .first()
                    .map_or_else(|| context.package().to_string(), |r| r.package.clone());
                ReleaseSet::new(package, releases)
            }
            Self::All(package) => {
                let package = package.as_deref().unwrap_or_else(|| context.package());
                context.releases(package)
            }
            Self::Prod(source) => Ok(source
                .resolve(context)?
                .filter(|r| !r.is_pre() && !r.is_dev())),
            Self::Pre(source) => Ok(source.resolve(context)?.filter(|r| !r.is_dev())),
            Self::Specifier {
                source,
                specifier_set,
            } => {
                let set = source.resolve(context)?;
                let specifier_set = specifier_set.resolve(&context.for_package(set.package()))?;
                Ok(set.filter(|r| specifier_set.contains(&r.version)))
            }
            Self::MinAge { source, filter } => {
                let set = source.resolve(context)?;
                let cutoff = filter.cutoff(context)?;
                let result = set.filter(|r| r.released_time <= cutoff);
                debug!(
                    package = set.package(),
                    %cutoff,
                    before = set.len(),
                    after = result.len(),
                    "min_age"
                );
                Ok(fallback(result, &set, filter.allow_empty, Pick::Lowest))
            }
            Self::MaxAge { source, filter } => {
                let set = source.resolve(context)?;
                let cutoff = filter.cutoff(context)?;
                let result = set.filter(|r| r.released_time >= cutoff);
                debug!(
                    package = set.package(),
                    %cutoff,
                    before = set.len(),
                    after = result.len(),
                    "max_age"
                );
                Ok(fallback(result, &set, filter.allow_empty, Pick::Highest))
            }
            Self::Count { source, level, n } => count(source.resolve(context)?, *level, *n),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Pick {
    Lowest,
    Highest,
}

/// Replace an empty `result` by the release of `set` with the lowest or
/// highest version.
fn fallback(result: ReleaseSet, set: &ReleaseSet, allow_empty: bool, pick: Pick) -> ReleaseSet {
    if !result.is_empty() || allow_empty {
        return result;
    }
    let chosen = match pick {
        Pick::Lowest => set.min(),
        Pick::Highest => set.max(),
    };
    match chosen {
        Some(chosen) => set.filter(|r| r == chosen),
        None => result,
    }
}

/// Keep releases at or above the smallest of the `n` highest floors at
/// `level`.
///
/// A relative level is resolved once, against the highest version.
fn count(set: ReleaseSet, level: Level, n: usize) -> Result<ReleaseSet> {
    let Some(max) = set.max() else {
        return Ok(set);
    };
    let index = level.index(&max.version)?;
    let floors: BTreeSet<_> = set
        .iter()
        .map(|r| floor_at(index, &r.version, false))
        .collect();
    let Some(lowest) = floors.iter().rev().take(n).last().cloned() else {
        return Ok(set.filter(|_| false));
    };
    debug!(package = set.package(), %level, n, %lowest, "count");
    Ok(set.filter(|r| r.version >= lowest))
}

impl fmt::Display for LazyReleaseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager(releases) => {
                let items: Vec<String> = releases.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Self::All(Some(package)) => write!(f, "all({package})"),
            Self::All(None) => write!(f, "all()"),
            Self::Prod(source) => write!(f, "prod({source})"),
            Self::Pre(source) => write!(f, "pre({source})"),
            Self::Specifier {
                source,
                specifier_set,
            } => write!(f, "{source}[{specifier_set}]"),
            Self::MinAge { source, filter } => write!(f, "min_age({source}, {})", filter.age),
            Self::MaxAge { source, filter } => write!(f, "max_age({source}, {})", filter.age),
            Self::Count { source, level, n } => write!(f, "count({level}, {n}, {source})"),
        }
    }
}
