//! Interval view of a specifier set.
//!
//! [`get_bounds`] folds an arbitrary conjunction of specifiers into a lower
//! bound, an upper bound and a set of excluded versions. The result can be
//! rendered back into canonical specifier sets.

use crate::error::{Error, Result};
use crate::specifier::{make_specifier, Operator, SpecifierOperator, SpecifierSet};
use crate::version::{ceil_at, Version};
use std::collections::BTreeSet;
use std::fmt;

/// Lower and upper bounds plus exclusions derived from a specifier set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bounds {
    /// The specifier set the bounds were computed from.
    pub specifier_set: SpecifierSet,
    /// Upper bound, if any.
    pub upper: Option<Version>,
    /// Whether the upper bound itself is allowed.
    pub upper_inclusive: bool,
    /// Lower bound, if any.
    pub lower: Option<Version>,
    /// Whether the lower bound itself is allowed.
    pub lower_inclusive: bool,
    /// Versions strictly inside the bounds that are excluded.
    pub exclusions: BTreeSet<Version>,
}

/// Compute the bounds of `specifier_set`.
///
/// # Errors
///
/// Returns [`Error::EmptySpecifierSet`] when no version can satisfy the set
/// and [`Error::UnsupportedSpecifier`] for `!=` wildcards.
pub fn get_bounds(specifier_set: &SpecifierSet) -> Result<Bounds> {
    let mut upper: Option<(Version, bool)> = None;
    let mut lower: Option<(Version, bool)> = None;
    let mut exclusions = BTreeSet::new();

    for specifier in specifier_set.iter() {
        let version = specifier.version();
        match specifier.operator() {
            Operator::GreaterThan => raise(&mut lower, version.clone(), false),
            Operator::GreaterThanEqual => raise(&mut lower, version.clone(), true),
            Operator::LessThan => lower_to(&mut upper, version.clone(), false),
            Operator::LessThanEqual => lower_to(&mut upper, version.clone(), true),
            Operator::Equal | Operator::ExactEqual => {
                lower_to(&mut upper, version.clone(), true);
                raise(&mut lower, version.clone(), true);
            }
            Operator::EqualStar => {
                let last = version.release().len().saturating_sub(1);
                lower_to(&mut upper, ceil_at(last, version, false), false);
                raise(&mut lower, version.clone(), true);
            }
            Operator::TildeEqual => {
                let last = version.release().len().saturating_sub(1);
                lower_to(&mut upper, ceil_at(last, version, false), false);
                raise(&mut lower, version.clone(), true);
            }
            Operator::NotEqual => {
                exclusions.insert(version.clone());
            }
            _ => return Err(Error::UnsupportedSpecifier(specifier.to_string())),
        }
    }

    if let Some((bound, inclusive)) = upper.as_mut() {
        if *inclusive && exclusions.contains(&*bound) {
            *inclusive = false;
        }
        exclusions.retain(|e| *e < *bound);
    }
    if let Some((bound, inclusive)) = lower.as_mut() {
        if *inclusive && exclusions.contains(&*bound) {
            *inclusive = false;
        }
        exclusions.retain(|e| *e > *bound);
    }

    if let (Some((low, low_inclusive)), Some((high, high_inclusive))) = (&lower, &upper) {
        let empty = low > high || (low == high && !(*low_inclusive && *high_inclusive));
        if empty {
            return Err(Error::EmptySpecifierSet(specifier_set.to_string()));
        }
    }

    let (upper, upper_inclusive) = split(upper);
    let (lower, lower_inclusive) = split(lower);
    Ok(Bounds {
        specifier_set: specifier_set.clone(),
        upper,
        upper_inclusive,
        lower,
        lower_inclusive,
        exclusions,
    })
}

/// Move a lower bound up to `version` when that is tighter.
fn raise(bound: &mut Option<(Version, bool)>, version: Version, inclusive: bool) {
    let tighter = match bound {
        None => true,
        Some((current, _)) => version > *current || (version == *current && !inclusive),
    };
    if tighter {
        *bound = Some((version, inclusive));
    }
}

/// Move an upper bound down to `version` when that is tighter.
fn lower_to(bound: &mut Option<(Version, bool)>, version: Version, inclusive: bool) {
    let tighter = match bound {
        None => true,
        Some((current, _)) => version < *current || (version == *current && !inclusive),
    };
    if tighter {
        *bound = Some((version, inclusive));
    }
}

fn split(bound: Option<(Version, bool)>) -> (Option<Version>, bool) {
    match bound {
        Some((version, inclusive)) => (Some(version), inclusive),
        None => (None, false),
    }
}

impl Bounds {
    /// Replace the lower bound, dropping exclusions that fall below it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptySpecifierSet`] when the new lower bound lies
    /// past the upper bound.
    pub fn with_lower(mut self, lower: Version, inclusive: bool) -> Result<Self> {
        if let Some(upper) = &self.upper {
            let both_inclusive = inclusive && self.upper_inclusive;
            if lower > *upper || (lower == *upper && !both_inclusive) {
                let op = if inclusive {
                    SpecifierOperator::GreaterThanEqual
                } else {
                    SpecifierOperator::GreaterThan
                };
                let mut set = self.specifier_set.clone();
                set.insert(make_specifier(op, lower)?);
                return Err(Error::EmptySpecifierSet(set.to_string()));
            }
        }
        self.exclusions.retain(|e| *e > lower);
        self.lower = Some(lower);
        self.lower_inclusive = inclusive;
        Ok(self)
    }

    /// The smallest interval containing both `self` and `other`.
    ///
    /// Only versions excluded by both sides stay excluded.
    #[must_use]
    pub fn hull(&self, other: &Self) -> Self {
        let (lower, lower_inclusive) = match (&self.lower, &other.lower) {
            (Some(a), Some(b)) if a < b => (Some(a.clone()), self.lower_inclusive),
            (Some(a), Some(b)) if b < a => (Some(b.clone()), other.lower_inclusive),
            (Some(a), Some(_)) => (Some(a.clone()), self.lower_inclusive || other.lower_inclusive),
            _ => (None, false),
        };
        let (upper, upper_inclusive) = match (&self.upper, &other.upper) {
            (Some(a), Some(b)) if a > b => (Some(a.clone()), self.upper_inclusive),
            (Some(a), Some(b)) if b > a => (Some(b.clone()), other.upper_inclusive),
            (Some(a), Some(_)) => (Some(a.clone()), self.upper_inclusive || other.upper_inclusive),
            _ => (None, false),
        };
        Self {
            specifier_set: SpecifierSet::new(),
            upper,
            upper_inclusive,
            lower,
            lower_inclusive,
            exclusions: self.exclusions.intersection(&other.exclusions).cloned().collect(),
        }
    }

    /// The smallest specifier set with the same meaning.
    ///
    /// # Errors
    ///
    /// Fails if a bound cannot be expressed as a specifier.
    pub fn minimal_specifier_set(&self, exclusions: bool) -> Result<SpecifierSet> {
        if let (Some(lower), Some(upper)) = (&self.lower, &self.upper) {
            if lower == upper {
                return Ok(make_specifier(SpecifierOperator::Equal, upper.clone())?.into());
            }
        }
        let mut result = self.upper_specifier_set(false)?;
        result.extend(self.lower_specifier_set(false)?.iter().cloned());
        if exclusions {
            result.extend(self.exclusions_specifier_set()?.iter().cloned());
        }
        Ok(result)
    }

    /// Specifiers for the upper bound alone.
    ///
    /// # Errors
    ///
    /// Fails if the bound cannot be expressed as a specifier.
    pub fn upper_specifier_set(&self, exclusions: bool) -> Result<SpecifierSet> {
        let mut result = SpecifierSet::new();
        if let Some(upper) = &self.upper {
            let op = if self.upper_inclusive {
                SpecifierOperator::LessThanEqual
            } else {
                SpecifierOperator::LessThan
            };
            result.insert(make_specifier(op, upper.clone())?);
        }
        if exclusions {
            result.extend(self.exclusions_specifier_set()?.iter().cloned());
        }
        Ok(result)
    }

    /// Specifiers for the lower bound alone.
    ///
    /// # Errors
    ///
    /// Fails if the bound cannot be expressed as a specifier.
    pub fn lower_specifier_set(&self, exclusions: bool) -> Result<SpecifierSet> {
        let mut result = SpecifierSet::new();
        if let Some(lower) = &self.lower {
            let op = if self.lower_inclusive {
                SpecifierOperator::GreaterThanEqual
            } else {
                SpecifierOperator::GreaterThan
            };
            result.insert(make_specifier(op, lower.clone())?);
        }
        if exclusions {
            result.extend(self.exclusions_specifier_set()?.iter().cloned());
        }
        Ok(result)
    }

    /// One `!=` specifier per exclusion.
    ///
    /// # Errors
    ///
    /// Fails if an exclusion cannot be expressed as a specifier.
    pub fn exclusions_specifier_set(&self) -> Result<SpecifierSet> {
        self.exclusions
            .iter()
            .map(|e| make_specifier(SpecifierOperator::NotEqual, e.clone()))
            .collect()
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lower {
            Some(lower) if self.lower_inclusive => write!(f, "[{lower}")?,
            Some(lower) => write!(f, "({lower}")?,
            None => write!(f, "(-inf")?,
        }
        match &self.upper {
            Some(upper) if self.upper_inclusive => write!(f, ", {upper}]")?,
            Some(upper) => write!(f, ", {upper})")?,
            None => write!(f, ", +inf)")?,
        }
        if !self.exclusions.is_empty() {
            let excluded: Vec<String> = self.exclusions.iter().map(ToString::to_string).collect();
            write!(f, " except {}", excluded.join(", "))?;
        }
        Ok(())
    }
}
