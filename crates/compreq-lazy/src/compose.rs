//! Combining requirement fragments.

use crate::lazy::{
    get_lazy_requirement, AnyRequirement, LazyRequirement, LazySpecifier, LazySpecifierSet,
};
use compreq_core::{Error, Result};
use std::fmt;

/// The result of [`compose`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Composed {
    /// Both sides were plain specifiers.
    SpecifierSet(LazySpecifierSet),
    /// At least one side was a requirement.
    Requirement(LazyRequirement),
}

impl Composed {
    /// View the result as a requirement fragment.
    #[must_use]
    pub fn into_requirement(self) -> LazyRequirement {
        match self {
            Self::SpecifierSet(specifier_set) => LazyRequirement::from_specifier(specifier_set),
            Self::Requirement(requirement) => requirement,
        }
    }
}

impl From<Composed> for AnyRequirement {
    fn from(composed: Composed) -> Self {
        match composed {
            Composed::SpecifierSet(specifier_set) => Self::LazySpecifierSet(specifier_set),
            Composed::Requirement(requirement) => Self::Lazy(requirement),
        }
    }
}

impl fmt::Display for Composed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpecifierSet(specifier_set) => write!(f, "{specifier_set}"),
            Self::Requirement(requirement) => write!(f, "{requirement}"),
        }
    }
}

/// Combine two fragments.
///
/// When either side is a requirement both are merged into one requirement:
/// packages and URLs must agree or be unset, extras and specifiers are
/// unioned and two different markers are joined with `and`. Otherwise the
/// result is the union of both specifier sets.
///
/// # Errors
///
/// Returns [`Error::ConflictingPackage`] or [`Error::ConflictingUrl`] on
/// disagreement, [`Error::UrlWithSpecifier`] if the result would have both,
/// and parse errors for malformed text.
pub fn compose(lhs: impl Into<AnyRequirement>, rhs: impl Into<AnyRequirement>) -> Result<Composed> {
    let lhs = lhs.into();
    let rhs = rhs.into();
    if lhs.is_requirement_like() || rhs.is_requirement_like() {
        let merged = merge(get_lazy_requirement(lhs)?, get_lazy_requirement(rhs)?)?;
        return Ok(Composed::Requirement(merged));
    }
    let lhs = lhs.into_lazy_specifier_set()?;
    let rhs = rhs.into_lazy_specifier_set()?;
    Ok(Composed::SpecifierSet(lhs.union(&rhs)))
}

fn merge(lhs: LazyRequirement, rhs: LazyRequirement) -> Result<LazyRequirement> {
    let package = agree(lhs.package(), rhs.package()).map_err(|(l, r)| {
        Error::ConflictingPackage {
            lhs: l.to_string(),
            rhs: r.to_string(),
        }
    })?;
    let url = agree(lhs.url(), rhs.url()).map_err(|(l, r)| Error::ConflictingUrl {
        lhs: l.to_string(),
        rhs: r.to_string(),
    })?;
    let marker = match (lhs.marker(), rhs.marker()) {
        (Some(l), Some(r)) if l != r => Some(l.and(r)),
        (l, r) => l.or(r).cloned(),
    };
    LazyRequirement::new(
        package.map(ToString::to_string),
        url.map(ToString::to_string),
        lhs.extras().union(rhs.extras()).cloned().collect(),
        lhs.specifier().union(rhs.specifier()),
        marker,
    )
}

/// The value both sides agree on, if any, or the conflicting pair.
fn agree<'a>(
    lhs: Option<&'a str>,
    rhs: Option<&'a str>,
) -> std::result::Result<Option<&'a str>, (&'a str, &'a str)> {
    match (lhs, rhs) {
        (Some(l), Some(r)) if l != r => Err((l, r)),
        (l, r) => Ok(l.or(r)),
    }
}

impl LazyRequirement {
    /// Builder form of [`compose`] with this fragment on the left.
    ///
    /// # Errors
    ///
    /// See [`compose`].
    pub fn and(self, rhs: impl Into<AnyRequirement>) -> Result<Self> {
        Ok(compose(self, rhs)?.into_requirement())
    }
}

impl LazySpecifierSet {
    /// Builder form of [`compose`] with this set on the left.
    ///
    /// # Errors
    ///
    /// See [`compose`].
    pub fn and(self, rhs: impl Into<AnyRequirement>) -> Result<Composed> {
        compose(self, rhs)
    }
}

impl LazySpecifier {
    /// Builder form of [`compose`] with this specifier on the left.
    ///
    /// # Errors
    ///
    /// See [`compose`].
    pub fn and(self, rhs: impl Into<AnyRequirement>) -> Result<Composed> {
        compose(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazy::get_lazy_specifier_set;

    fn requirement(composed: Composed) -> LazyRequirement {
        match composed {
            Composed::Requirement(requirement) => requirement,
            other => panic!("expected a requirement, got {other}"),
        }
    }

    #[test]
    fn specifiers_union() {
        let composed = compose("==2.0.0", ">1.5.0").unwrap();
        assert_eq!(
            composed,
            Composed::SpecifierSet(get_lazy_specifier_set("==2.0.0,>1.5.0").unwrap())
        );
    }

    #[test]
    fn package_conflict() {
        let err = compose(LazyRequirement::empty().and("foo").unwrap(), "bar").unwrap_err();
        assert!(matches!(err, Error::ConflictingPackage { .. }));
    }

    #[test]
    fn url_conflict() {
        let lhs = get_lazy_requirement("foo@ http://a").unwrap();
        let rhs = get_lazy_requirement("foo@ http://b").unwrap();
        assert!(matches!(compose(lhs, rhs), Err(Error::ConflictingUrl { .. })));
    }

    #[test]
    fn url_and_specifier_conflict() {
        let lhs = get_lazy_requirement("foo@ http://a").unwrap();
        assert!(matches!(compose(lhs, ">=1"), Err(Error::UrlWithSpecifier { .. })));
    }

    #[test]
    fn fragments_merge() {
        let lhs = get_lazy_requirement("foo[a]>=1; os_name == 'nt'").unwrap();
        let rhs = get_lazy_requirement("foo[b]<2; python_version < '3.12'").unwrap();
        let merged = requirement(compose(lhs, rhs).unwrap());
        assert_eq!(
            merged.to_string(),
            "foo[a,b]<2,>=1; (os_name == 'nt') and (python_version < '3.12')"
        );
    }

    #[test]
    fn same_marker_is_kept_once() {
        let lhs = get_lazy_requirement("foo; os_name == 'nt'").unwrap();
        let rhs = get_lazy_requirement("foo>=1; os_name == 'nt'").unwrap();
        let merged = requirement(compose(lhs, rhs).unwrap());
        assert_eq!(merged.marker().unwrap().as_str(), "os_name == 'nt'");
    }

    #[test]
    fn empty_is_identity() {
        let foo = get_lazy_requirement("foo[x]>=1").unwrap();
        let merged = requirement(compose(LazyRequirement::empty(), foo.clone()).unwrap());
        assert_eq!(merged, foo);
        let merged = requirement(compose(foo.clone(), LazyRequirement::empty()).unwrap());
        assert_eq!(merged, foo);
    }

    #[test]
    fn builder_chain() {
        let built = get_lazy_requirement("foo")
            .unwrap()
            .and(">=1")
            .unwrap()
            .and("<2")
            .unwrap();
        assert_eq!(built.to_string(), "foo<2,>=1");
    }
}
