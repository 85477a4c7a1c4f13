//! Normalization of accepted inputs into lazy nodes.
//!
//! Every family of inputs is a closed enum with `From` impls for the shapes
//! it accepts; the `get_lazy_*` functions turn them into canonical lazy
//! nodes. Malformed text is reported as a parse error.

use super::release::{LazyRelease, LazyReleaseSet};
use super::requirement::{LazyRequirement, LazyRequirementSet};
use super::specifier::{LazySpecifier, LazySpecifierSet};
use super::version::LazyVersion;
use compreq_core::{
    parse_specifier, parse_version, Error, Release, ReleaseSet, Requirement, RequirementSet,
    Result, SpecifierOperator, SpecifierSet, Version, VersionSpecifier,
};

macro_rules! any_from {
    ($any:ident { $($variant:ident($ty:ty)),* $(,)? }) => {
        $(
            impl From<$ty> for $any {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

/// Anything that denotes a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyVersion {
    /// Version text.
    Str(String),
    /// A concrete version.
    Version(Version),
    /// The version of a concrete release.
    Release(Release),
    /// The version of a lazy release.
    LazyRelease(LazyRelease),
    /// A lazy version.
    Lazy(LazyVersion),
}

any_from!(AnyVersion {
    Str(&str),
    Str(String),
    Version(Version),
    Release(Release),
    LazyRelease(LazyRelease),
    Lazy(LazyVersion),
});

/// Convert to a [`LazyVersion`].
///
/// # Errors
///
/// Fails on malformed version text.
pub fn get_lazy_version(version: impl Into<AnyVersion>) -> Result<LazyVersion> {
    Ok(match version.into() {
        AnyVersion::Str(text) => LazyVersion::Eager(parse_version(&text)?),
        AnyVersion::Version(version) => LazyVersion::Eager(version),
        AnyVersion::Release(release) => LazyVersion::Eager(release.version),
        AnyVersion::LazyRelease(release) => LazyVersion::Release(Box::new(release)),
        AnyVersion::Lazy(version) => version,
    })
}

/// Anything that denotes a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyRelease {
    /// A concrete release.
    Release(Release),
    /// A lazy release.
    Lazy(LazyRelease),
}

any_from!(AnyRelease {
    Release(Release),
    Lazy(LazyRelease),
});

/// Convert to a [`LazyRelease`].
#[must_use]
pub fn get_lazy_release(release: impl Into<AnyRelease>) -> LazyRelease {
    match release.into() {
        AnyRelease::Release(release) => LazyRelease::Eager(release),
        AnyRelease::Lazy(release) => release,
    }
}

/// Anything that denotes a set of releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyReleaseSet {
    /// Production releases of the context package.
    Default,
    /// Production releases of the named package.
    Package(String),
    /// Production releases of the context package matching a specifier.
    Specifier(VersionSpecifier),
    /// Production releases of the context package matching a lazy specifier.
    LazySpecifier(LazySpecifier),
    /// Production releases of the context package matching specifiers.
    SpecifierSet(SpecifierSet),
    /// Production releases of the context package matching lazy specifiers.
    LazySpecifierSet(LazySpecifierSet),
    /// Production releases of a requirement's package matching it.
    Requirement(Requirement),
    /// Production releases of a lazy requirement's package matching it.
    LazyRequirement(LazyRequirement),
    /// A single concrete release.
    Release(Release),
    /// A single lazy release.
    LazyRelease(LazyRelease),
    /// A concrete release set.
    ReleaseSet(ReleaseSet),
    /// A lazy release set.
    Lazy(LazyReleaseSet),
}

any_from!(AnyReleaseSet {
    Package(&str),
    Package(String),
    Specifier(VersionSpecifier),
    LazySpecifier(LazySpecifier),
    SpecifierSet(SpecifierSet),
    LazySpecifierSet(LazySpecifierSet),
    Requirement(Requirement),
    LazyRequirement(LazyRequirement),
    Release(Release),
    LazyRelease(LazyRelease),
    ReleaseSet(ReleaseSet),
    Lazy(LazyReleaseSet),
});

impl From<Option<&str>> for AnyReleaseSet {
    fn from(package: Option<&str>) -> Self {
        package.map_or(Self::Default, Self::from)
    }
}

fn production(package: Option<String>) -> LazyReleaseSet {
    LazyReleaseSet::Prod(Box::new(LazyReleaseSet::All(package)))
}

fn matching(package: Option<String>, specifier_set: LazySpecifierSet) -> LazyReleaseSet {
    LazyReleaseSet::Specifier {
        source: Box::new(production(package)),
        specifier_set,
    }
}

/// Convert to a [`LazyReleaseSet`].
///
/// # Errors
///
/// Fails on specifiers that cannot be computed with, such as wildcards.
pub fn get_lazy_release_set(release_set: impl Into<AnyReleaseSet>) -> Result<LazyReleaseSet> {
    Ok(match release_set.into() {
        AnyReleaseSet::Default => production(None),
        AnyReleaseSet::Package(package) => production(Some(package)),
        AnyReleaseSet::Specifier(specifier) => matching(None, eager_specifier(&specifier)?.into()),
        AnyReleaseSet::LazySpecifier(specifier) => matching(None, specifier.into()),
        AnyReleaseSet::SpecifierSet(specifier_set) => {
            matching(None, get_lazy_specifier_set(specifier_set)?)
        }
        AnyReleaseSet::LazySpecifierSet(specifier_set) => matching(None, specifier_set),
        AnyReleaseSet::Requirement(requirement) => matching(
            Some(requirement.name().to_string()),
            get_lazy_specifier_set(requirement.specifier().clone())?,
        ),
        AnyReleaseSet::LazyRequirement(requirement) => matching(
            requirement.package().map(ToString::to_string),
            requirement.specifier().clone(),
        ),
        AnyReleaseSet::Release(release) => {
            LazyReleaseSet::Eager([LazyRelease::Eager(release)].into())
        }
        AnyReleaseSet::LazyRelease(release) => LazyReleaseSet::Eager([release].into()),
        AnyReleaseSet::ReleaseSet(set) => {
            LazyReleaseSet::Eager(set.into_iter().map(LazyRelease::Eager).collect())
        }
        AnyReleaseSet::Lazy(set) => set,
    })
}

/// Anything that denotes a single specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnySpecifier {
    /// Specifier text such as `>=1.2`.
    Str(String),
    /// A concrete specifier.
    Specifier(VersionSpecifier),
    /// A lazy specifier.
    Lazy(LazySpecifier),
}

any_from!(AnySpecifier {
    Str(&str),
    Str(String),
    Specifier(VersionSpecifier),
    Lazy(LazySpecifier),
});

/// A lazy specifier for a concrete one.
///
/// # Errors
///
/// Returns [`Error::UnsupportedSpecifier`] for wildcard specifiers.
pub fn eager_specifier(specifier: &VersionSpecifier) -> Result<LazySpecifier> {
    let op = SpecifierOperator::try_from(*specifier.operator())
        .map_err(|_| Error::UnsupportedSpecifier(specifier.to_string()))?;
    Ok(LazySpecifier::new(op, LazyVersion::Eager(specifier.version().clone())))
}

/// Convert to a [`LazySpecifier`].
///
/// # Errors
///
/// Fails on malformed or wildcard specifiers.
pub fn get_lazy_specifier(specifier: impl Into<AnySpecifier>) -> Result<LazySpecifier> {
    match specifier.into() {
        AnySpecifier::Str(text) => eager_specifier(&parse_specifier(&text)?),
        AnySpecifier::Specifier(specifier) => eager_specifier(&specifier),
        AnySpecifier::Lazy(specifier) => Ok(specifier),
    }
}

/// Anything that denotes a set of specifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnySpecifierSet {
    /// Comma separated specifier text.
    Str(String),
    /// A single concrete specifier.
    Specifier(VersionSpecifier),
    /// A single lazy specifier.
    LazySpecifier(LazySpecifier),
    /// A concrete specifier set.
    SpecifierSet(SpecifierSet),
    /// A lazy specifier set.
    Lazy(LazySpecifierSet),
    /// Several specifiers.
    Many(Vec<AnySpecifier>),
}

any_from!(AnySpecifierSet {
    Str(&str),
    Str(String),
    Specifier(VersionSpecifier),
    LazySpecifier(LazySpecifier),
    SpecifierSet(SpecifierSet),
    Lazy(LazySpecifierSet),
});

impl<T: Into<AnySpecifier>> From<Vec<T>> for AnySpecifierSet {
    fn from(specifiers: Vec<T>) -> Self {
        Self::Many(specifiers.into_iter().map(Into::into).collect())
    }
}

/// Convert to a [`LazySpecifierSet`].
///
/// # Errors
///
/// Fails on malformed or wildcard specifiers.
pub fn get_lazy_specifier_set(specifier_set: impl Into<AnySpecifierSet>) -> Result<LazySpecifierSet> {
    match specifier_set.into() {
        AnySpecifierSet::Str(text) => get_lazy_specifier_set(text.parse::<SpecifierSet>()?),
        AnySpecifierSet::Specifier(specifier) => Ok(eager_specifier(&specifier)?.into()),
        AnySpecifierSet::LazySpecifier(specifier) => Ok(specifier.into()),
        AnySpecifierSet::SpecifierSet(specifier_set) => {
            specifier_set.iter().map(eager_specifier).collect()
        }
        AnySpecifierSet::Lazy(specifier_set) => Ok(specifier_set),
        AnySpecifierSet::Many(specifiers) => {
            specifiers.into_iter().map(get_lazy_specifier).collect()
        }
    }
}

/// Anything that denotes a requirement or a fragment of one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyRequirement {
    /// Requirement text, or specifier text for a nameless fragment.
    Str(String),
    /// A single concrete specifier.
    Specifier(VersionSpecifier),
    /// A single lazy specifier.
    LazySpecifier(LazySpecifier),
    /// A concrete specifier set.
    SpecifierSet(SpecifierSet),
    /// A lazy specifier set.
    LazySpecifierSet(LazySpecifierSet),
    /// A concrete requirement.
    Requirement(Requirement),
    /// A lazy requirement fragment.
    Lazy(LazyRequirement),
}

any_from!(AnyRequirement {
    Str(&str),
    Str(String),
    Specifier(VersionSpecifier),
    LazySpecifier(LazySpecifier),
    SpecifierSet(SpecifierSet),
    LazySpecifierSet(LazySpecifierSet),
    Requirement(Requirement),
    Lazy(LazyRequirement),
});

impl AnyRequirement {
    /// Whether this input carries more than specifiers.
    #[must_use]
    pub const fn is_requirement_like(&self) -> bool {
        matches!(self, Self::Requirement(_) | Self::Lazy(_))
    }

    /// The specifiers of this input.
    pub(crate) fn into_lazy_specifier_set(self) -> Result<LazySpecifierSet> {
        match self {
            Self::Str(text) => get_lazy_specifier_set(text),
            Self::Specifier(specifier) => get_lazy_specifier_set(specifier),
            Self::LazySpecifier(specifier) => Ok(specifier.into()),
            Self::SpecifierSet(specifier_set) => get_lazy_specifier_set(specifier_set),
            Self::LazySpecifierSet(specifier_set) => Ok(specifier_set),
            Self::Requirement(requirement) => {
                get_lazy_specifier_set(requirement.specifier().clone())
            }
            Self::Lazy(requirement) => Ok(requirement.specifier().clone()),
        }
    }
}

/// A lazy requirement for a concrete one.
///
/// # Errors
///
/// Fails on wildcard specifiers.
pub fn eager_requirement(requirement: &Requirement) -> Result<LazyRequirement> {
    LazyRequirement::new(
        Some(requirement.name().to_string()),
        requirement.url().map(ToString::to_string),
        requirement.extras().clone(),
        get_lazy_specifier_set(requirement.specifier().clone())?,
        requirement.marker().cloned(),
    )
}

/// Convert to a [`LazyRequirement`].
///
/// Text is parsed as a requirement, or as specifiers when it does not name
/// a package.
///
/// # Errors
///
/// Fails on text that is neither.
pub fn get_lazy_requirement(requirement: impl Into<AnyRequirement>) -> Result<LazyRequirement> {
    match requirement.into() {
        AnyRequirement::Str(text) => match text.parse::<Requirement>() {
            Ok(requirement) => eager_requirement(&requirement),
            Err(err) => match get_lazy_specifier_set(text.as_str()) {
                Ok(specifier_set) => Ok(LazyRequirement::from_specifier(specifier_set)),
                Err(_) => Err(err),
            },
        },
        AnyRequirement::Requirement(requirement) => eager_requirement(&requirement),
        AnyRequirement::Lazy(requirement) => Ok(requirement),
        other => Ok(LazyRequirement::from_specifier(other.into_lazy_specifier_set()?)),
    }
}

/// Anything that denotes a set of requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyRequirementSet {
    /// Requirement text, one per line.
    Str(String),
    /// A single concrete requirement.
    Requirement(Requirement),
    /// A single lazy requirement.
    LazyRequirement(LazyRequirement),
    /// A concrete requirement set.
    RequirementSet(RequirementSet),
    /// A lazy requirement set.
    Lazy(LazyRequirementSet),
    /// Several requirements.
    Many(Vec<AnyRequirement>),
}

any_from!(AnyRequirementSet {
    Str(&str),
    Str(String),
    Requirement(Requirement),
    LazyRequirement(LazyRequirement),
    RequirementSet(RequirementSet),
    Lazy(LazyRequirementSet),
});

impl<T: Into<AnyRequirement>> From<Vec<T>> for AnyRequirementSet {
    fn from(requirements: Vec<T>) -> Self {
        Self::Many(requirements.into_iter().map(Into::into).collect())
    }
}

/// Convert to a [`LazyRequirementSet`].
///
/// # Errors
///
/// Fails on malformed requirements.
pub fn get_lazy_requirement_set(
    requirement_set: impl Into<AnyRequirementSet>,
) -> Result<LazyRequirementSet> {
    let requirements = match requirement_set.into() {
        AnyRequirementSet::Str(text) => {
            return get_lazy_requirement_set(text.parse::<RequirementSet>()?);
        }
        AnyRequirementSet::Requirement(requirement) => vec![eager_requirement(&requirement)?],
        AnyRequirementSet::LazyRequirement(requirement) => vec![requirement],
        AnyRequirementSet::RequirementSet(set) => {
            set.iter().map(eager_requirement).collect::<Result<_>>()?
        }
        AnyRequirementSet::Lazy(set) => return Ok(set),
        AnyRequirementSet::Many(requirements) => requirements
            .into_iter()
            .map(get_lazy_requirement)
            .collect::<Result<_>>()?,
    };
    Ok(LazyRequirementSet::Eager(requirements.into_iter().collect()))
}
