//! Lazy requirements and requirement sets.

use super::specifier::LazySpecifierSet;
use crate::consistent::{resolve_consistent_lower_bounds, resolve_dist};
use crate::context::{Context, PackageContext};
use compreq_core::{Error, Marker, Requirement, RequirementSet, Result};
use std::collections::BTreeSet;
use std::fmt;

/// A possibly partial requirement whose specifiers are computed when
/// resolved.
///
/// Fragments with only some fields set are combined with
/// [`compose`](crate::compose()); the empty fragment is the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LazyRequirement {
    package: Option<String>,
    url: Option<String>,
    extras: BTreeSet<String>,
    specifier: LazySpecifierSet,
    marker: Option<Marker>,
}

impl LazyRequirement {
    /// Create a requirement fragment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlWithSpecifier`] if both a URL and specifiers are
    /// given.
    pub fn new(
        package: Option<String>,
        url: Option<String>,
        extras: BTreeSet<String>,
        specifier: LazySpecifierSet,
        marker: Option<Marker>,
    ) -> Result<Self> {
        if let Some(url) = &url {
            if !specifier.is_empty() {
                return Err(Error::UrlWithSpecifier {
                    url: url.clone(),
                    specifier: specifier.to_string(),
                });
            }
        }
        Ok(Self {
            package,
            url,
            extras,
            specifier,
            marker,
        })
    }

    /// The fragment with no fields set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A fragment with only specifiers.
    #[must_use]
    pub fn from_specifier(specifier: LazySpecifierSet) -> Self {
        Self {
            specifier,
            ..Self::default()
        }
    }

    /// Package name.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Direct URL.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Requested extras.
    #[must_use]
    pub fn extras(&self) -> &BTreeSet<String> {
        &self.extras
    }

    /// Lazy specifiers.
    #[must_use]
    pub fn specifier(&self) -> &LazySpecifierSet {
        &self.specifier
    }

    /// Environment marker.
    #[must_use]
    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// Resolve to a concrete requirement.
    ///
    /// Specifiers are resolved in the context of the requirement's package.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingPackage`] when no package is set, or any error
    /// of the specifiers.
    pub fn resolve(&self, context: &dyn Context) -> Result<Requirement> {
        let package = self
            .package
            .as_deref()
            .ok_or_else(|| Error::MissingPackage(self.to_string()))?;
        let context = PackageContext::new(context, package);
        let specifier = self.specifier.resolve(&context)?;
        Requirement::new(
            package,
            self.extras.clone(),
            specifier,
            self.url.clone(),
            self.marker.clone(),
        )
    }
}

impl fmt::Display for LazyRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.package.as_deref().unwrap_or("<package>"))?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(String::as_str).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        write!(f, "{}", self.specifier)?;
        if let Some(url) = &self.url {
            write!(f, "@ {url}")?;
            if self.marker.is_some() {
                f.write_str(" ")?;
            }
        }
        if let Some(marker) = &self.marker {
            write!(f, "; {marker}")?;
        }
        Ok(())
    }
}

/// A set of requirements that is computed when resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LazyRequirementSet {
    /// Fixed requirement fragments, each naming a package.
    Eager(BTreeSet<LazyRequirement>),
    /// The source with lower bounds raised to versions that can actually be
    /// installed together.
    ConsistentLowerBounds(Box<LazyRequirementSet>),
    /// The dependencies declared by the distribution a requirement selects.
    Dist(Box<LazyRequirement>),
}

impl LazyRequirementSet {
    /// Resolve to a concrete requirement set.
    ///
    /// # Errors
    ///
    /// Fails if any requirement fails to resolve, or if introspection is
    /// needed but unavailable.
    pub fn resolve(&self, context: &dyn Context) -> Result<RequirementSet> {
        match self {
            Self::Eager(requirements) => requirements.iter().map(|r| r.resolve(context)).collect(),
            Self::ConsistentLowerBounds(source) => {
                resolve_consistent_lower_bounds(source.resolve(context)?, context)
            }
            Self::Dist(requirement) => resolve_dist(&requirement.resolve(context)?, context),
        }
    }
}

impl fmt::Display for LazyRequirementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eager(requirements) => {
                let items: Vec<String> = requirements.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", items.join("; "))
            }
            Self::ConsistentLowerBounds(source) => write!(f, "consistent_lower_bounds({source})"),
            Self::Dist(requirement) => write!(f, "dist({requirement})"),
        }
    }
}
