//! Lazy versions.

use super::release::LazyRelease;
use crate::context::PackageContext;
use compreq_core::{ceil, floor, Error, Level, Result, Version};
use std::fmt;

/// A version that is computed when resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LazyVersion {
    /// A fixed version.
    Eager(Version),
    /// The version of a release.
    Release(Box<LazyRelease>),
    /// The lowest of several versions.
    Minimum(Vec<LazyVersion>),
    /// The highest of several versions.
    Maximum(Vec<LazyVersion>),
    /// A version rounded up at a level.
    Ceil {
        /// Rounding level.
        level: Level,
        /// Version to round.
        version: Box<LazyVersion>,
        /// Whether to zero-fill instead of truncate.
        keep_trailing_zeros: bool,
    },
    /// A version rounded down at a level.
    Floor {
        /// Rounding level.
        level: Level,
        /// Version to round.
        version: Box<LazyVersion>,
        /// Whether to zero-fill instead of truncate.
        keep_trailing_zeros: bool,
    },
}

impl LazyVersion {
    /// Resolve to a concrete version.
    ///
    /// # Errors
    ///
    /// Fails if a nested expression fails, a list of versions is empty or
    /// a relative level cannot be applied.
    pub fn resolve(&self, context: &PackageContext<'_>) -> Result<Version> {
        match self {
            Self::Eager(version) => Ok(version.clone()),
            Self::Release(release) => Ok(release.resolve(context)?.version),
            Self::Minimum(versions) => resolve_all(versions, context)?
                .into_iter()
                .min()
                .ok_or(Error::EmptyVersionList("minimum")),
            Self::Maximum(versions) => resolve_all(versions, context)?
                .into_iter()
                .max()
                .ok_or(Error::EmptyVersionList("maximum")),
            Self::Ceil {
                level,
                version,
                keep_trailing_zeros,
            } => ceil(*level, &version.resolve(context)?, *keep_trailing_zeros),
            Self::Floor {
                level,
                version,
                keep_trailing_zeros,
            } => floor(*level, &version.resolve(context)?, *keep_trailing_zeros),
        }
    }
}

fn resolve_all(versions: &[LazyVersion], context: &PackageContext<'_>) -> Result<Vec<Version>> {
    versions.iter().map(|v| v.resolve(context)).collect()
}

impl fmt::Display for LazyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |versions: &[Self]| {
            versions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Self::Eager(version) => write!(f, "{version}"),
            Self::Release(release) => write!(f, "{release}"),
            Self::Minimum(versions) => write!(f, "minimum({})", list(versions)),
            Self::Maximum(versions) => write!(f, "maximum({})", list(versions)),
            Self::Ceil { level, version, .. } => write!(f, "ceil({level}, {version})"),
            Self::Floor { level, version, .. } => write!(f, "floor({level}, {version})"),
        }
    }
}
