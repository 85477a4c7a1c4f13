//! Lazy specifiers and specifier sets.

use super::version::LazyVersion;
use crate::context::PackageContext;
use compreq_core::{make_specifier, Result, SpecifierOperator, SpecifierSet, VersionSpecifier};
use std::collections::BTreeSet;
use std::fmt;

/// A specifier whose version is computed when resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LazySpecifier {
    /// Comparison operator.
    pub op: SpecifierOperator,
    /// Version to compare against.
    pub version: LazyVersion,
}

impl LazySpecifier {
    /// Create a lazy specifier.
    #[must_use]
    pub const fn new(op: SpecifierOperator, version: LazyVersion) -> Self {
        Self { op, version }
    }

    /// Resolve to a concrete specifier.
    ///
    /// # Errors
    ///
    /// Fails if the version cannot be resolved or the operator does not
    /// accept it.
    pub fn resolve(&self, context: &PackageContext<'_>) -> Result<VersionSpecifier> {
        make_specifier(self.op, self.version.resolve(context)?)
    }
}

impl fmt::Display for LazySpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// A conjunction of lazy specifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LazySpecifierSet {
    specifiers: BTreeSet<LazySpecifier>,
}

impl LazySpecifierSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of specifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specifiers.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// Iterate the specifiers.
    pub fn iter(&self) -> impl Iterator<Item = &LazySpecifier> {
        self.specifiers.iter()
    }

    /// The union of the atoms of `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.specifiers.union(&other.specifiers).cloned().collect()
    }

    /// Resolve to a concrete specifier set.
    ///
    /// # Errors
    ///
    /// Fails if any specifier fails to resolve.
    pub fn resolve(&self, context: &PackageContext<'_>) -> Result<SpecifierSet> {
        self.specifiers.iter().map(|s| s.resolve(context)).collect()
    }
}

impl FromIterator<LazySpecifier> for LazySpecifierSet {
    fn from_iter<T: IntoIterator<Item = LazySpecifier>>(iter: T) -> Self {
        Self {
            specifiers: iter.into_iter().collect(),
        }
    }
}

impl From<LazySpecifier> for LazySpecifierSet {
    fn from(specifier: LazySpecifier) -> Self {
        std::iter::once(specifier).collect()
    }
}

impl fmt::Display for LazySpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut items: Vec<String> = self.specifiers.iter().map(ToString::to_string).collect();
        items.sort();
        f.write_str(&items.join(","))
    }
}
