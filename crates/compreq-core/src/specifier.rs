//! Version specifiers and specifier sets.

use crate::error::{Error, Result};
use crate::version::Version;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub use pep440_rs::{Operator, VersionSpecifier};

/// Comparison operators usable in computed specifiers.
///
/// Wildcard forms (`==1.*`, `!=1.*`) can be parsed into a [`SpecifierSet`]
/// but cannot be produced by computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpecifierOperator {
    /// `~=`
    Compatible,
    /// `!=`
    NotEqual,
    /// `==`
    Equal,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessThanEqual,
    /// `>=`
    GreaterThanEqual,
    /// `===`
    ArbitraryEqual,
}

impl SpecifierOperator {
    /// The textual form of the operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compatible => "~=",
            Self::NotEqual => "!=",
            Self::Equal => "==",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessThanEqual => "<=",
            Self::GreaterThanEqual => ">=",
            Self::ArbitraryEqual => "===",
        }
    }
}

impl fmt::Display for SpecifierOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecifierOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "~=" => Ok(Self::Compatible),
            "!=" => Ok(Self::NotEqual),
            "==" => Ok(Self::Equal),
            "<" => Ok(Self::LessThan),
            ">" => Ok(Self::GreaterThan),
            "<=" => Ok(Self::LessThanEqual),
            ">=" => Ok(Self::GreaterThanEqual),
            "===" => Ok(Self::ArbitraryEqual),
            other => Err(Error::invalid_specifier(other, "unknown operator")),
        }
    }
}

impl From<SpecifierOperator> for Operator {
    fn from(op: SpecifierOperator) -> Self {
        match op {
            SpecifierOperator::Compatible => Self::TildeEqual,
            SpecifierOperator::NotEqual => Self::NotEqual,
            SpecifierOperator::Equal => Self::Equal,
            SpecifierOperator::LessThan => Self::LessThan,
            SpecifierOperator::GreaterThan => Self::GreaterThan,
            SpecifierOperator::LessThanEqual => Self::LessThanEqual,
            SpecifierOperator::GreaterThanEqual => Self::GreaterThanEqual,
            SpecifierOperator::ArbitraryEqual => Self::ExactEqual,
        }
    }
}

impl TryFrom<Operator> for SpecifierOperator {
    type Error = Error;

    fn try_from(op: Operator) -> Result<Self> {
        match op {
            Operator::TildeEqual => Ok(Self::Compatible),
            Operator::NotEqual => Ok(Self::NotEqual),
            Operator::Equal => Ok(Self::Equal),
            Operator::LessThan => Ok(Self::LessThan),
            Operator::GreaterThan => Ok(Self::GreaterThan),
            Operator::LessThanEqual => Ok(Self::LessThanEqual),
            Operator::GreaterThanEqual => Ok(Self::GreaterThanEqual),
            Operator::ExactEqual => Ok(Self::ArbitraryEqual),
            other => Err(Error::UnsupportedSpecifier(format!("{other}"))),
        }
    }
}

/// Build a specifier from an operator and a version.
///
/// # Errors
///
/// Fails for combinations PEP 440 forbids, such as `~=` on a single-segment
/// version.
pub fn make_specifier(op: SpecifierOperator, version: Version) -> Result<VersionSpecifier> {
    let text = format!("{op}{version}");
    VersionSpecifier::from_version(op.into(), version)
        .map_err(|e| Error::invalid_specifier(text, e))
}

/// Parse a single specifier such as `>=1.2`.
///
/// # Errors
///
/// Returns [`Error::InvalidSpecifier`] on malformed input.
pub fn parse_specifier(input: &str) -> Result<VersionSpecifier> {
    VersionSpecifier::from_str(input.trim()).map_err(|e| Error::invalid_specifier(input, e))
}

/// A conjunction of version specifiers.
///
/// Specifiers are kept unique and ordered by their textual form, which is
/// also how the set is rendered.
#[derive(Debug, Clone, Default)]
pub struct SpecifierSet {
    specifiers: BTreeMap<String, VersionSpecifier>,
}

impl SpecifierSet {
    /// An empty set, matching every version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of specifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specifiers.len()
    }

    /// Whether the set has no specifiers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// Iterate specifiers in textual order.
    pub fn iter(&self) -> impl Iterator<Item = &VersionSpecifier> {
        self.specifiers.values()
    }

    /// Add a specifier.
    pub fn insert(&mut self, specifier: VersionSpecifier) {
        self.specifiers.insert(specifier.to_string(), specifier);
    }

    /// The conjunction of `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.extend(other.iter().cloned());
        result
    }

    /// Whether any specifier mentions a pre-release or dev-release.
    #[must_use]
    pub fn mentions_prerelease(&self) -> bool {
        self.iter().any(|s| s.version().any_prerelease())
    }

    /// Whether `version` satisfies every specifier.
    ///
    /// Pre-releases only match when a specifier mentions one.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        if version.any_prerelease() && !self.mentions_prerelease() {
            return false;
        }
        self.contains_any(version)
    }

    /// Whether `version` satisfies every specifier, pre-release or not.
    #[must_use]
    pub fn contains_any(&self, version: &Version) -> bool {
        self.iter().all(|s| s.contains(version))
    }
}

impl PartialEq for SpecifierSet {
    fn eq(&self, other: &Self) -> bool {
        self.specifiers.keys().eq(other.specifiers.keys())
    }
}

impl Eq for SpecifierSet {}

impl Hash for SpecifierSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for key in self.specifiers.keys() {
            key.hash(state);
        }
    }
}

impl Extend<VersionSpecifier> for SpecifierSet {
    fn extend<T: IntoIterator<Item = VersionSpecifier>>(&mut self, iter: T) {
        for specifier in iter {
            self.insert(specifier);
        }
    }
}

impl FromIterator<VersionSpecifier> for SpecifierSet {
    fn from_iter<T: IntoIterator<Item = VersionSpecifier>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl From<VersionSpecifier> for SpecifierSet {
    fn from(specifier: VersionSpecifier) -> Self {
        std::iter::once(specifier).collect()
    }
}

impl FromStr for SpecifierSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(parse_specifier)
            .collect()
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.specifiers.keys().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::parse_version;

    fn v(s: &str) -> Version {
        parse_version(s).unwrap()
    }

    #[test]
    fn parses_and_renders_sorted() {
        let set: SpecifierSet = " >1.5.0 , ==2.0.0".parse().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "==2.0.0,>1.5.0");
        assert!("".parse::<SpecifierSet>().unwrap().is_empty());
    }

    #[test]
    fn duplicate_specifiers_collapse() {
        let a: SpecifierSet = ">=1.0,<2".parse().unwrap();
        let b: SpecifierSet = "<2,!=1.5".parse().unwrap();
        let union = a.union(&b);
        assert_eq!(union.to_string(), "!=1.5,<2,>=1.0");
        assert_eq!(a, ">=1.0, <2".parse().unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            "=>1.0".parse::<SpecifierSet>(),
            Err(Error::InvalidSpecifier { .. })
        ));
    }

    #[test]
    fn prereleases_need_opt_in() {
        let set: SpecifierSet = ">=1.0".parse().unwrap();
        assert!(set.contains(&v("1.5")));
        assert!(!set.contains(&v("2.0a1")));
        assert!(set.contains_any(&v("2.0a1")));

        let pre: SpecifierSet = ">=1.0b1".parse().unwrap();
        assert!(pre.contains(&v("2.0a1")));
    }

    #[test]
    fn operator_round_trip() {
        for text in ["~=", "!=", "==", "<", ">", "<=", ">=", "==="] {
            let op: SpecifierOperator = text.parse().unwrap();
            assert_eq!(op.as_str(), text);
            assert_eq!(SpecifierOperator::try_from(Operator::from(op)).unwrap(), op);
        }
        assert!(SpecifierOperator::try_from(Operator::EqualStar).is_err());
    }

    #[test]
    fn make_specifier_validates() {
        assert_eq!(
            make_specifier(SpecifierOperator::GreaterThanEqual, v("1.2")).unwrap().to_string(),
            ">=1.2"
        );
        assert!(make_specifier(SpecifierOperator::Compatible, v("1")).is_err());
    }
}
