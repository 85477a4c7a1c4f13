//! Factory functions for building lazy expressions.
//!
//! These are the vocabulary requirement policies are written in, e.g.
//!
//! ```rust,ignore
//! use compreq_lazy::operators::*;
//! use compreq_core::{Age, MINOR, REL_MAJOR, REL_MINOR};
//!
//! let lower = floor_ver(
//!     REL_MINOR,
//!     minimum_ver([
//!         max_ver(min_age(releases(), Age::years(1))?)?,
//!         min_ver(count(MINOR, 3, releases())?)?,
//!     ])?,
//!     false,
//! )?;
//! let upper = ceil_ver(REL_MAJOR, max_ver(releases())?, false)?;
//! let range = VERSION.ge(lower)?.and(VERSION.lt(upper)?)?;
//! ```

use crate::lazy::{
    get_lazy_release, get_lazy_release_set, get_lazy_requirement, get_lazy_requirement_set,
    get_lazy_specifier, get_lazy_specifier_set, get_lazy_version, AgeFilter, AnyRelease,
    AnyReleaseSet, AnyRequirement, AnyRequirementSet, AnySpecifier, AnySpecifierSet, AnyVersion,
    LazyRelease, LazyReleaseSet, LazyRequirement, LazyRequirementSet, LazySpecifier,
    LazySpecifierSet, LazyVersion,
};
use compreq_core::{Level, Marker, Requirement, Result, SpecifierOperator};
use std::collections::BTreeSet;

/// Production releases of the context package.
#[must_use]
pub fn releases() -> LazyReleaseSet {
    LazyReleaseSet::Prod(Box::new(LazyReleaseSet::All(None)))
}

/// Production releases of `package`.
#[must_use]
pub fn releases_of(package: impl Into<String>) -> LazyReleaseSet {
    LazyReleaseSet::Prod(Box::new(LazyReleaseSet::All(Some(package.into()))))
}

/// Releases of the context package, including pre-releases.
#[must_use]
pub fn prereleases() -> LazyReleaseSet {
    LazyReleaseSet::Pre(Box::new(LazyReleaseSet::All(None)))
}

/// Releases of `package`, including pre-releases.
#[must_use]
pub fn prereleases_of(package: impl Into<String>) -> LazyReleaseSet {
    LazyReleaseSet::Pre(Box::new(LazyReleaseSet::All(Some(package.into()))))
}

/// Every release of the context package.
#[must_use]
pub fn devreleases() -> LazyReleaseSet {
    LazyReleaseSet::All(None)
}

/// Every release of `package`.
#[must_use]
pub fn devreleases_of(package: impl Into<String>) -> LazyReleaseSet {
    LazyReleaseSet::All(Some(package.into()))
}

/// A concrete or lazy release.
#[must_use]
pub fn release(release: impl Into<AnyRelease>) -> LazyRelease {
    get_lazy_release(release)
}

/// The lowest release of a set.
///
/// # Errors
///
/// Fails if the input cannot be converted to a release set.
pub fn min_ver(release_set: impl Into<AnyReleaseSet>) -> Result<LazyRelease> {
    Ok(LazyRelease::Min(Box::new(get_lazy_release_set(release_set)?)))
}

/// The highest release of a set.
///
/// # Errors
///
/// Fails if the input cannot be converted to a release set.
pub fn max_ver(release_set: impl Into<AnyReleaseSet>) -> Result<LazyRelease> {
    Ok(LazyRelease::Max(Box::new(get_lazy_release_set(release_set)?)))
}

/// The lowest of several versions.
///
/// # Errors
///
/// Fails if any input is not a valid version.
pub fn minimum_ver<V: Into<AnyVersion>>(versions: impl IntoIterator<Item = V>) -> Result<LazyVersion> {
    Ok(LazyVersion::Minimum(versions.into_iter().map(get_lazy_version).collect::<Result<_>>()?))
}

/// The highest of several versions.
///
/// # Errors
///
/// Fails if any input is not a valid version.
pub fn maximum_ver<V: Into<AnyVersion>>(versions: impl IntoIterator<Item = V>) -> Result<LazyVersion> {
    Ok(LazyVersion::Maximum(versions.into_iter().map(get_lazy_version).collect::<Result<_>>()?))
}

/// Round a version up at `level`.
///
/// # Errors
///
/// Fails if the input is not a valid version.
pub fn ceil_ver(
    level: impl Into<Level>,
    version: impl Into<AnyVersion>,
    keep_trailing_zeros: bool,
) -> Result<LazyVersion> {
    Ok(LazyVersion::Ceil {
        level: level.into(),
        version: Box::new(get_lazy_version(version)?),
        keep_trailing_zeros,
    })
}

/// Round a version down at `level`.
///
/// # Errors
///
/// Fails if the input is not a valid version.
pub fn floor_ver(
    level: impl Into<Level>,
    version: impl Into<AnyVersion>,
    keep_trailing_zeros: bool,
) -> Result<LazyVersion> {
    Ok(LazyVersion::Floor {
        level: level.into(),
        version: Box::new(get_lazy_version(version)?),
        keep_trailing_zeros,
    })
}

/// Releases at least some age old.
///
/// Unless the filter allows an empty result, the single oldest release is
/// kept when nothing is old enough.
///
/// # Errors
///
/// Fails if the input cannot be converted to a release set.
pub fn min_age(
    release_set: impl Into<AnyReleaseSet>,
    filter: impl Into<AgeFilter>,
) -> Result<LazyReleaseSet> {
    Ok(LazyReleaseSet::MinAge {
        source: Box::new(get_lazy_release_set(release_set)?),
        filter: filter.into(),
    })
}

/// Releases at most some age old.
///
/// Unless the filter allows an empty result, the single newest release is
/// kept when nothing is recent enough.
///
/// # Errors
///
/// Fails if the input cannot be converted to a release set.
pub fn max_age(
    release_set: impl Into<AnyReleaseSet>,
    filter: impl Into<AgeFilter>,
) -> Result<LazyReleaseSet> {
    Ok(LazyReleaseSet::MaxAge {
        source: Box::new(get_lazy_release_set(release_set)?),
        filter: filter.into(),
    })
}

/// Releases within the `n` most recent buckets at `level`.
///
/// # Errors
///
/// Fails if the input cannot be converted to a release set.
pub fn count(
    level: impl Into<Level>,
    n: usize,
    release_set: impl Into<AnyReleaseSet>,
) -> Result<LazyReleaseSet> {
    Ok(LazyReleaseSet::Count {
        source: Box::new(get_lazy_release_set(release_set)?),
        level: level.into(),
        n,
    })
}

/// Raise lower bounds to versions that are installable together.
///
/// # Errors
///
/// Fails if the input cannot be converted to a requirement set.
pub fn consistent_lower_bounds(
    requirement_set: impl Into<AnyRequirementSet>,
) -> Result<LazyRequirementSet> {
    Ok(LazyRequirementSet::ConsistentLowerBounds(Box::new(
        get_lazy_requirement_set(requirement_set)?,
    )))
}

/// The dependencies declared by the distribution `requirement` selects.
///
/// # Errors
///
/// Fails if the input cannot be converted to a requirement.
pub fn dist(requirement: impl Into<AnyRequirement>) -> Result<LazyRequirementSet> {
    Ok(LazyRequirementSet::Dist(Box::new(get_lazy_requirement(requirement)?)))
}

/// A fragment naming a package.
///
/// # Errors
///
/// Fails if `name` is not a valid package name.
pub fn package(name: &str) -> Result<LazyRequirement> {
    let name = Requirement::named(name)?.name().to_string();
    LazyRequirement::new(Some(name), None, BTreeSet::new(), LazySpecifierSet::new(), None)
}

/// Short for [`package`].
///
/// # Errors
///
/// Fails if `name` is not a valid package name.
pub fn pkg(name: &str) -> Result<LazyRequirement> {
    package(name)
}

/// A fragment with a direct URL.
///
/// # Errors
///
/// Never fails; the signature matches the other fragment factories.
pub fn url(url: impl Into<String>) -> Result<LazyRequirement> {
    LazyRequirement::new(None, Some(url.into()), BTreeSet::new(), LazySpecifierSet::new(), None)
}

/// A fragment requesting an extra.
///
/// # Errors
///
/// Never fails; the signature matches the other fragment factories.
pub fn extra(extra: impl Into<String>) -> Result<LazyRequirement> {
    LazyRequirement::new(None, None, [extra.into()].into(), LazySpecifierSet::new(), None)
}

/// A fragment with an environment marker.
///
/// # Errors
///
/// Fails if `marker` is malformed.
pub fn marker(marker: &str) -> Result<LazyRequirement> {
    let marker: Marker = marker.parse()?;
    LazyRequirement::new(None, None, BTreeSet::new(), LazySpecifierSet::new(), Some(marker))
}

/// A single specifier.
///
/// # Errors
///
/// Fails on malformed or wildcard specifiers.
pub fn specifier(specifier: impl Into<AnySpecifier>) -> Result<LazySpecifier> {
    get_lazy_specifier(specifier)
}

/// A specifier set.
///
/// # Errors
///
/// Fails on malformed or wildcard specifiers.
pub fn specifier_set(specifier_set: impl Into<AnySpecifierSet>) -> Result<LazySpecifierSet> {
    get_lazy_specifier_set(specifier_set)
}

/// An operator given as text or value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyOperator {
    /// Operator text such as `>=`.
    Str(String),
    /// An operator value.
    Op(SpecifierOperator),
}

impl From<&str> for AnyOperator {
    fn from(op: &str) -> Self {
        Self::Str(op.to_string())
    }
}

impl From<SpecifierOperator> for AnyOperator {
    fn from(op: SpecifierOperator) -> Self {
        Self::Op(op)
    }
}

/// A specifier comparing against a possibly lazy version.
///
/// # Errors
///
/// Fails on an unknown operator or an invalid version.
pub fn version(op: impl Into<AnyOperator>, version: impl Into<AnyVersion>) -> Result<LazySpecifier> {
    let op = match op.into() {
        AnyOperator::Str(text) => text.parse()?,
        AnyOperator::Op(op) => op,
    };
    Ok(LazySpecifier::new(op, get_lazy_version(version)?))
}

/// Method-style specifier constructors: `VERSION.ge(...)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionToken;

/// The [`VersionToken`].
pub const VERSION: VersionToken = VersionToken;

macro_rules! token_methods {
    ($($(#[$doc:meta])* $name:ident => $op:ident),* $(,)?) => {
        impl VersionToken {
            $(
                $(#[$doc])*
                ///
                /// # Errors
                ///
                /// Fails if the input is not a valid version.
                pub fn $name(self, v: impl Into<AnyVersion>) -> Result<LazySpecifier> {
                    version(SpecifierOperator::$op, v)
                }
            )*
        }
    };
}

token_methods! {
    /// `~=v`
    compatible => Compatible,
    /// `!=v`
    ne => NotEqual,
    /// `==v`
    eq => Equal,
    /// `<v`
    lt => LessThan,
    /// `>v`
    gt => GreaterThan,
    /// `<=v`
    le => LessThanEqual,
    /// `>=v`
    ge => GreaterThanEqual,
    /// `===v`
    arbitrary_equal => ArbitraryEqual,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::testing::{at, context};
    use compreq_core::{Age, Error, MAJOR, MINOR, REL_MAJOR, REL_MINOR};
    use proptest::prelude::*;
    use test_case::test_case;

    fn versions(set: &LazyReleaseSet, package: &str) -> Vec<String> {
        let context = context();
        let scoped = context.for_package(package);
        set.resolve(&scoped)
            .unwrap()
            .iter()
            .map(|r| r.version.to_string())
            .collect()
    }

    fn resolve_version(version: &LazyVersion, package: &str) -> String {
        let context = context();
        version.resolve(&context.for_package(package)).unwrap().to_string()
    }

    #[test]
    fn release_views() {
        assert_eq!(
            versions(&releases(), "foo"),
            ["1.0.0", "1.1.0", "1.2.0", "1.3.0", "1.4.0", "2.0.0"]
        );
        assert_eq!(versions(&prereleases_of("foo"), "bar").len(), 7);
        assert_eq!(versions(&devreleases(), "foo").len(), 8);
    }

    #[test]
    fn min_and_max() {
        let context = context();
        let scoped = context.for_package("foo");
        assert_eq!(min_ver(releases()).unwrap().resolve(&scoped).unwrap().version.to_string(), "1.0.0");
        assert_eq!(max_ver(releases()).unwrap().resolve(&scoped).unwrap().version.to_string(), "2.0.0");
        assert_eq!(
            max_ver(devreleases()).unwrap().resolve(&scoped).unwrap().version.to_string(),
            "2.1.0.dev1"
        );
    }

    #[test]
    fn max_of_empty_set_fails() {
        let context = context();
        let scoped = context.for_package("foo");
        let empty = count(MAJOR, 0, releases()).unwrap();
        let err = max_ver(empty).unwrap().resolve(&scoped).unwrap_err();
        assert!(matches!(err, Error::EmptyReleaseSet { operation: "max", .. }));
    }

    #[test]
    fn minimum_and_maximum() {
        let low = minimum_ver(["1.2", "1.10", "1.9"]).unwrap();
        assert_eq!(resolve_version(&low, "foo"), "1.2");
        let high = maximum_ver(vec![AnyVersion::from("1.2"), max_ver(releases()).unwrap().into()])
            .unwrap();
        assert_eq!(resolve_version(&high, "foo"), "2.0.0");

        let context = context();
        let err = minimum_ver(Vec::<&str>::new())
            .unwrap()
            .resolve(&context.for_package("foo"))
            .unwrap_err();
        assert!(matches!(err, Error::EmptyVersionList("minimum")));
    }

    #[test_case(MAJOR, false, "3")]
    #[test_case(MINOR, true, "2.1.0")]
    #[test_case(REL_MAJOR, false, "3")]
    fn ceil_of_max(level: compreq_core::Level, keep: bool, expected: &str) {
        let v = ceil_ver(level, max_ver(releases()).unwrap(), keep).unwrap();
        assert_eq!(resolve_version(&v, "foo"), expected);
    }

    #[test]
    fn relative_levels_skip_leading_zeros() {
        let upper = ceil_ver(REL_MAJOR, max_ver(releases()).unwrap(), false).unwrap();
        assert_eq!(resolve_version(&upper, "bar"), "0.4");
        let lower = floor_ver(REL_MINOR, min_ver(releases()).unwrap(), true).unwrap();
        assert_eq!(resolve_version(&lower, "bar"), "0.1.0");
    }

    #[test]
    fn min_age_filters_and_falls_back() {
        // now is 2023-01-01
        let old = min_age(releases(), Age::years(1)).unwrap();
        assert_eq!(versions(&old, "foo"), ["1.0.0", "1.1.0", "1.2.0", "1.3.0", "1.4.0"]);

        let ancient = min_age(releases(), Age::years(10)).unwrap();
        assert_eq!(versions(&ancient, "foo"), ["1.0.0"]);

        let allowed = min_age(releases(), AgeFilter::new(Age::years(10)).allow_empty(true)).unwrap();
        assert!(versions(&allowed, "foo").is_empty());
    }

    #[test]
    fn min_age_with_explicit_now() {
        let young = AgeFilter::new(Age::days(90)).now(at(2020, 1, 2));
        let filtered = min_age(releases(), young).unwrap();
        assert_eq!(versions(&filtered, "foo"), ["1.0.0"]);
        let strict = min_age(releases(), young.allow_empty(true)).unwrap();
        assert!(versions(&strict, "foo").is_empty());
    }

    #[test]
    fn max_age_filters_and_falls_back() {
        let recent = max_age(releases(), Age::months(9)).unwrap();
        assert_eq!(versions(&recent, "foo"), ["2.0.0"]);

        let none = max_age(releases(), Age::days(1)).unwrap();
        assert_eq!(versions(&none, "foo"), ["2.0.0"]);

        let allowed = max_age(releases(), AgeFilter::new(Age::days(1)).allow_empty(true)).unwrap();
        assert!(versions(&allowed, "foo").is_empty());
    }

    #[test]
    fn age_fallback_follows_version_order() {
        // 1.1.0 was published before 1.0.0
        let source = compreq_core::MemorySource::new()
            .with_release("foo", "1.0.0", at(2021, 1, 1))
            .unwrap()
            .with_release("foo", "1.1.0", at(2020, 1, 1))
            .unwrap();
        let context = crate::context::DefaultContext::new(">=3.9,<4".parse().unwrap(), std::sync::Arc::new(source))
            .unwrap()
            .with_now(at(2023, 1, 1));
        let scoped = context.for_package("foo");
        let pick = |set: LazyReleaseSet| -> Vec<String> {
            set.resolve(&scoped)
                .unwrap()
                .iter()
                .map(|r| r.version.to_string())
                .collect()
        };
        assert_eq!(pick(min_age(releases(), Age::years(10)).unwrap()), ["1.0.0"]);
        assert_eq!(pick(max_age(releases(), Age::days(1)).unwrap()), ["1.1.0"]);
    }

    #[test]
    fn specifier_filter_skips_unmentioned_prereleases() {
        let view = |spec: &str| LazyReleaseSet::Specifier {
            source: Box::new(prereleases()),
            specifier_set: specifier_set(spec).unwrap(),
        };
        assert_eq!(versions(&view(">=1.4"), "foo"), ["1.4.0", "2.0.0"]);
        assert_eq!(versions(&view(">=2.0.0a1"), "foo"), ["2.0.0a1", "2.0.0"]);
    }

    #[test]
    fn count_keeps_recent_buckets() {
        let last_three = count(MINOR, 3, releases()).unwrap();
        assert_eq!(versions(&last_three, "foo"), ["1.3.0", "1.4.0", "2.0.0"]);

        let below_two = count(MINOR, 3, version("<", "2").unwrap()).unwrap();
        assert_eq!(versions(&below_two, "foo"), ["1.2.0", "1.3.0", "1.4.0"]);

        let majors = count(MAJOR, 5, releases()).unwrap();
        assert_eq!(versions(&majors, "foo").len(), 6);
    }

    #[test]
    fn count_drops_prereleases_below_lowest_bucket() {
        // 2.1.0.dev1 sorts below its own bucket floor 2.1
        let latest = count(MINOR, 1, devreleases()).unwrap();
        assert!(versions(&latest, "foo").is_empty());
        let two = count(MINOR, 2, devreleases()).unwrap();
        assert_eq!(versions(&two, "foo"), ["2.0.0", "2.1.0.dev1"]);
        let pre = count(MINOR, 2, prereleases()).unwrap();
        assert_eq!(versions(&pre, "foo"), ["1.4.0", "2.0.0a1", "2.0.0"]);
    }

    #[test]
    fn count_resolves_relative_level_against_max() {
        let buckets = count(REL_MINOR, 2, releases()).unwrap();
        assert_eq!(versions(&buckets, "bar"), ["0.2.0", "0.3.0"]);
    }

    #[test]
    fn specifier_filter_uses_source_package() {
        let set = get_lazy_release_set("foo>=1.3,<2".parse::<Requirement>().unwrap()).unwrap();
        assert_eq!(versions(&set, "bar"), ["1.3.0", "1.4.0"]);
    }

    #[test]
    fn python_releases_are_scoped_by_context() {
        let set = releases_of(compreq_core::PYTHON);
        assert_eq!(versions(&set, "foo"), ["3.9.0", "3.10.0", "3.11.0"]);
    }

    #[test]
    fn fragments() {
        assert!(package("not a name").is_err());
        assert_eq!(pkg("foo").unwrap().to_string(), "foo");
        let combined = pkg("foo")
            .unwrap()
            .and(extra("x").unwrap())
            .unwrap()
            .and(marker("os_name == 'nt'").unwrap())
            .unwrap();
        assert_eq!(combined.to_string(), "foo[x]; os_name == 'nt'");
        let pinned = pkg("foo").unwrap().and(url("http://x").unwrap()).unwrap();
        assert_eq!(pinned.url(), Some("http://x"));
        assert!(marker("(").is_err());
    }

    #[test]
    fn version_token() {
        assert_eq!(VERSION.ge("1.2").unwrap().to_string(), ">=1.2");
        assert_eq!(VERSION.compatible("1.2").unwrap().to_string(), "~=1.2");
        assert_eq!(VERSION.arbitrary_equal("1.2").unwrap().to_string(), "===1.2");
        assert_eq!(version("!=", "1.5").unwrap(), VERSION.ne("1.5").unwrap());
        assert!(version("=>", "1.5").is_err());
    }

    #[test]
    fn default_policy_end_to_end() {
        let context = context();
        let lower = floor_ver(
            REL_MINOR,
            minimum_ver([
                max_ver(min_age(releases(), Age::years(1)).unwrap()).unwrap(),
                min_ver(count(MINOR, 3, releases()).unwrap()).unwrap(),
            ])
            .unwrap(),
            false,
        )
        .unwrap();
        let upper = ceil_ver(REL_MAJOR, max_ver(releases()).unwrap(), false).unwrap();
        let requirement = pkg("foo")
            .unwrap()
            .and(VERSION.ge(lower).unwrap())
            .unwrap()
            .and(VERSION.lt(upper).unwrap())
            .unwrap();
        let resolved = requirement.resolve(&context).unwrap();
        assert_eq!(resolved.to_string(), "foo<3,>=1.3");
        assert!(context.now() > at(2022, 12, 31));
    }

    proptest! {
        #[test]
        fn age_filters_never_empty(days in 0u32..5000, months in 0u32..60) {
            let age = Age { months, days, ..Age::default() };
            prop_assert!(!versions(&min_age(releases(), age).unwrap(), "foo").is_empty());
            prop_assert!(!versions(&max_age(releases(), age).unwrap(), "foo").is_empty());
        }
    }
}
