//! Concrete requirements: `name[extras]specifiers@ url; marker`.
//!
//! Parsing and validation follow PEP 508 through `pep508_rs`. The package
//! name keeps the spelling it was written with, while lookups in a
//! [`RequirementSet`] go through the normalized [`PackageName`].

use crate::bounds::get_bounds;
use crate::error::{Error, Result};
use crate::specifier::{parse_specifier, SpecifierSet};
use pep508_rs::{ExtraName, MarkerTree, PackageName, VersionOrUrl};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// An environment marker such as `python_version >= '3.9'`.
///
/// Markers are never evaluated. They are validated against the PEP 508
/// grammar and keep their original text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Marker(String);

impl Marker {
    /// The marker text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The conjunction `(self) and (other)`.
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        Self(format!("({}) and ({})", self.0, other.0))
    }

    /// The disjunction `(self) or (other)`.
    #[must_use]
    pub fn or(&self, other: &Self) -> Self {
        Self(format!("({}) or ({})", self.0, other.0))
    }
}

impl FromStr for Marker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        if text.is_empty() {
            return Err(Error::InvalidMarker {
                input: s.to_string(),
                message: "empty marker".to_string(),
            });
        }
        text.parse::<MarkerTree>().map_err(|e| Error::InvalidMarker {
            input: s.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self(text.to_string()))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A requirement on a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Requirement {
    name: String,
    key: PackageName,
    extras: BTreeSet<String>,
    specifier: SpecifierSet,
    url: Option<String>,
    marker: Option<Marker>,
}

impl Requirement {
    /// Create a requirement.
    ///
    /// # Errors
    ///
    /// Fails if the name is not a valid package name or if both a URL and
    /// specifiers are given.
    pub fn new(
        name: impl Into<String>,
        extras: BTreeSet<String>,
        specifier: SpecifierSet,
        url: Option<String>,
        marker: Option<Marker>,
    ) -> Result<Self> {
        let name = name.into();
        let key = name
            .parse::<PackageName>()
            .map_err(|e| Error::invalid_requirement(&name, e))?;
        if let Some(extra) = extras.iter().find(|e| e.parse::<ExtraName>().is_err()) {
            return Err(Error::invalid_requirement(name, format!("invalid extra '{extra}'")));
        }
        if let Some(url) = &url {
            if !specifier.is_empty() {
                return Err(Error::UrlWithSpecifier {
                    url: url.clone(),
                    specifier: specifier.to_string(),
                });
            }
        }
        Ok(Self {
            name,
            key,
            extras,
            specifier,
            url,
            marker,
        })
    }

    /// A requirement on any version of `name`.
    ///
    /// # Errors
    ///
    /// Fails if `name` is not a valid package name.
    pub fn named(name: impl Into<String>) -> Result<Self> {
        Self::new(name, BTreeSet::new(), SpecifierSet::new(), None, None)
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized package name.
    #[must_use]
    pub fn package_name(&self) -> &PackageName {
        &self.key
    }

    /// Requested extras.
    #[must_use]
    pub fn extras(&self) -> &BTreeSet<String> {
        &self.extras
    }

    /// Version specifiers.
    #[must_use]
    pub fn specifier(&self) -> &SpecifierSet {
        &self.specifier
    }

    /// Direct URL, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Environment marker, if any.
    #[must_use]
    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// The same requirement with different specifiers.
    ///
    /// # Errors
    ///
    /// Fails if the requirement has a URL and `specifier` is not empty.
    pub fn with_specifier(self, specifier: SpecifierSet) -> Result<Self> {
        Self::new(self.name, self.extras, specifier, self.url, self.marker)
    }

    /// Combine two requirements on the same package into one.
    ///
    /// Under the same marker both apply, so specifiers are intersected and
    /// extras joined. An unconditional requirement is kept over a
    /// conditional one. Different markers are joined with `or` and the
    /// specifiers widened to the hull of both intervals.
    ///
    /// # Errors
    ///
    /// Fails if the packages differ, a URL meets specifiers, or a
    /// specifier set cannot be folded into bounds.
    pub fn merge(&self, other: &Self) -> Result<Self> {
        if self.key != other.key {
            return Err(Error::invalid_requirement(
                other.to_string(),
                format!("cannot merge into a requirement on '{}'", self.name),
            ));
        }
        let extras = self.extras.union(&other.extras).cloned().collect();
        match (&self.marker, &other.marker) {
            (None, Some(_)) => Ok(self.clone()),
            (Some(_), None) => Ok(other.clone()),
            (Some(a), Some(b)) if a != b => {
                let hull = get_bounds(&self.specifier)?.hull(&get_bounds(&other.specifier)?);
                let url = self.url.clone().filter(|url| other.url.as_ref() == Some(url));
                let specifier = if url.is_some() {
                    SpecifierSet::new()
                } else {
                    hull.minimal_specifier_set(true)?
                };
                Self::new(self.name.clone(), extras, specifier, url, Some(a.or(b)))
            }
            (marker, _) => {
                let specifier = self.specifier.union(&other.specifier);
                let url = self.url.clone().or_else(|| other.url.clone());
                Self::new(self.name.clone(), extras, specifier, url, marker.clone())
            }
        }
    }
}

impl FromStr for Requirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = s
            .parse::<pep508_rs::Requirement>()
            .map_err(|e| Error::invalid_requirement(s, e))?;
        let extras = parsed.extras.iter().map(ToString::to_string).collect();
        let (specifier, url) = match &parsed.version_or_url {
            None => (SpecifierSet::new(), None),
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => {
                let specifier = specifiers
                    .iter()
                    .map(|spec| parse_specifier(&spec.to_string()))
                    .collect::<Result<SpecifierSet>>()?;
                (specifier, None)
            }
            Some(VersionOrUrl::Url(url)) => (SpecifierSet::new(), Some(url.to_string())),
        };
        let marker = marker_text(s, url.is_some())
            .map(str::parse::<Marker>)
            .transpose()?;
        Self::new(written_name(s), extras, specifier, url, marker)
            .map_err(|e| Error::invalid_requirement(s, e))
    }
}

/// The package name as written at the start of a requirement.
fn written_name(s: &str) -> &str {
    let s = s.trim_start();
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
        .unwrap_or(s.len());
    &s[..end]
}

/// The marker text after `;`. A direct URL may itself contain `;`, so for
/// URL requirements the marker starts after the whitespace ending the URL.
fn marker_text(s: &str, has_url: bool) -> Option<&str> {
    let tail = if has_url {
        let (_, after_at) = s.split_once('@')?;
        after_at.trim_start().split_once(char::is_whitespace)?.1
    } else {
        s
    };
    tail.split_once(';')
        .map(|(_, marker)| marker.trim())
        .filter(|marker| !marker.is_empty())
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
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

/// Requirements keyed by normalized package name, so `Foo_Bar` and
/// `foo-bar` denote the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RequirementSet {
    requirements: BTreeMap<PackageName, Requirement>,
}

impl RequirementSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requirements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Whether a requirement on `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The requirement on `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Requirement> {
        let key = name.parse::<PackageName>().ok()?;
        self.requirements.get(&key)
    }

    /// Insert a requirement, replacing any previous one on the same package.
    pub fn insert(&mut self, requirement: Requirement) -> Option<Requirement> {
        self.requirements.insert(requirement.key.clone(), requirement)
    }

    /// Insert a requirement, merging it with any previous one on the same
    /// package through [`Requirement::merge`].
    ///
    /// # Errors
    ///
    /// Fails if the two requirements cannot be merged.
    pub fn merge(&mut self, requirement: Requirement) -> Result<()> {
        let merged = match self.requirements.get(&requirement.key) {
            Some(existing) => existing.merge(&requirement)?,
            None => requirement,
        };
        self.insert(merged);
        Ok(())
    }

    /// Parse one requirement per line like [`FromStr`], merging repeated
    /// packages instead of replacing them.
    ///
    /// # Errors
    ///
    /// Fails on a malformed line or on requirements that cannot be merged.
    pub fn parse_merged(s: &str) -> Result<Self> {
        let mut set = Self::new();
        for line in requirement_lines(s) {
            set.merge(line.parse()?)?;
        }
        Ok(set)
    }

    /// Remove the requirement on `name`.
    pub fn remove(&mut self, name: &str) -> Option<Requirement> {
        let key = name.parse::<PackageName>().ok()?;
        self.requirements.remove(&key)
    }

    /// Package names as written, ordered by normalized name.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.requirements.values().map(Requirement::name)
    }

    /// Requirements ordered by normalized package name.
    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.values()
    }
}

impl FromIterator<Requirement> for RequirementSet {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        let mut set = Self::new();
        for requirement in iter {
            set.insert(requirement);
        }
        set
    }
}

impl IntoIterator for RequirementSet {
    type Item = Requirement;
    type IntoIter = std::collections::btree_map::IntoValues<PackageName, Requirement>;

    fn into_iter(self) -> Self::IntoIter {
        self.requirements.into_values()
    }
}

impl FromStr for RequirementSet {
    type Err = Error;

    /// Parse one requirement per line, skipping blank lines and `#` comments.
    fn from_str(s: &str) -> Result<Self> {
        requirement_lines(s).map(str::parse::<Requirement>).collect()
    }
}

fn requirement_lines(s: &str) -> impl Iterator<Item = &str> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

impl fmt::Display for RequirementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for requirement in self.iter() {
            writeln!(f, "{requirement}")?;
        }
        Ok(())
    }
}
