//! Capabilities the core consumes: release listings and distribution
//! introspection, plus in-memory implementations of both.

use crate::error::{Error, Result};
use crate::release::{Release, ReleaseSet};
use crate::requirement::RequirementSet;
use crate::specifier::SpecifierSet;
use crate::version::{parse_version, Version};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Name under which Python itself is requested.
pub const PYTHON: &str = "python";

/// Source of release listings.
pub trait ReleaseSource: Send + Sync {
    /// All releases of `package`, successors inferred.
    fn releases(&self, package: &str) -> Result<ReleaseSet>;

    /// Releases of Python matching `prefilter`.
    ///
    /// The prefilter must not mention pre-releases or dev-releases.
    fn python_releases(&self, prefilter: &SpecifierSet) -> Result<ReleaseSet>;
}

impl<T: ReleaseSource + ?Sized> ReleaseSource for Arc<T> {
    fn releases(&self, package: &str) -> Result<ReleaseSet> {
        (**self).releases(package)
    }

    fn python_releases(&self, prefilter: &SpecifierSet) -> Result<ReleaseSet> {
        (**self).python_releases(prefilter)
    }
}

/// What an installed distribution reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistMetadata {
    /// Distribution name.
    pub package: String,
    /// Installed version.
    pub version: Version,
    /// Declared dependencies, including `python` from `Requires-Python`.
    pub requires: RequirementSet,
}

/// Installs requirements somewhere disposable and reads back metadata.
pub trait DistInspector: Send + Sync {
    /// Install `requirements` for the given Python version and return the
    /// metadata of every requested package, keyed by package name.
    ///
    /// With `deps == false` transitive dependencies are not installed.
    fn inspect(
        &self,
        python: &Version,
        requirements: &RequirementSet,
        deps: bool,
    ) -> Result<BTreeMap<String, DistMetadata>>;
}

impl<T: DistInspector + ?Sized> DistInspector for Arc<T> {
    fn inspect(
        &self,
        python: &Version,
        requirements: &RequirementSet,
        deps: bool,
    ) -> Result<BTreeMap<String, DistMetadata>> {
        (**self).inspect(python, requirements, deps)
    }
}

/// In-memory release source.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    packages: HashMap<String, Vec<Release>>,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a release.
    pub fn add(&mut self, release: Release) {
        self.packages
            .entry(release.package.clone())
            .or_default()
            .push(release);
    }

    /// Add a release given as text.
    ///
    /// # Errors
    ///
    /// Fails if `version` is not a valid version.
    pub fn with_release(
        mut self,
        package: &str,
        version: &str,
        released_time: DateTime<Utc>,
    ) -> Result<Self> {
        self.add(Release::new(package, parse_version(version)?, released_time));
        Ok(self)
    }
}

impl ReleaseSource for MemorySource {
    fn releases(&self, package: &str) -> Result<ReleaseSet> {
        trace!(package, "serving releases from memory");
        let releases = self
            .packages
            .get(package)
            .ok_or_else(|| Error::Fetch(format!("package '{package}' not found")))?;
        Ok(ReleaseSet::new(package, releases.iter().cloned())?.with_inferred_successors())
    }

    fn python_releases(&self, prefilter: &SpecifierSet) -> Result<ReleaseSet> {
        Ok(self
            .releases(PYTHON)?
            .filter(|r| prefilter.contains(&r.version)))
    }
}

/// In-memory distribution inspector.
///
/// Serves the highest registered distribution matching each requirement and
/// records every call.
#[derive(Debug, Default)]
pub struct MemoryInspector {
    dists: BTreeMap<String, BTreeMap<Version, RequirementSet>>,
    calls: Mutex<Vec<(RequirementSet, bool)>>,
}

impl MemoryInspector {
    /// Create an empty inspector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a distribution.
    ///
    /// # Errors
    ///
    /// Fails if `version` or any requirement is malformed.
    pub fn with_dist(mut self, package: &str, version: &str, requires: &str) -> Result<Self> {
        self.dists
            .entry(package.to_string())
            .or_default()
            .insert(parse_version(version)?, RequirementSet::parse_merged(requires)?);
        Ok(self)
    }

    /// Requirement sets passed to [`DistInspector::inspect`] so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(RequirementSet, bool)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl DistInspector for MemoryInspector {
    fn inspect(
        &self,
        _python: &Version,
        requirements: &RequirementSet,
        deps: bool,
    ) -> Result<BTreeMap<String, DistMetadata>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((requirements.clone(), deps));
        }
        requirements
            .iter()
            .map(|requirement| {
                let (version, requires) = self
                    .dists
                    .get(requirement.name())
                    .and_then(|versions| {
                        versions
                            .iter()
                            .rev()
                            .find(|(v, _)| requirement.specifier().contains_any(v))
                    })
                    .ok_or_else(|| {
                        Error::Introspection(format!("no distribution satisfies {requirement}"))
                    })?;
                let metadata = DistMetadata {
                    package: requirement.name().to_string(),
                    version: version.clone(),
                    requires: requires.clone(),
                };
                Ok((requirement.name().to_string(), metadata))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 5, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn memory_source_infers_successors() {
        let source = MemorySource::new()
            .with_release("foo", "1.0", at(1))
            .unwrap()
            .with_release("foo", "1.1", at(2))
            .unwrap();
        let set = source.releases("foo").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.min().unwrap().successor.as_ref().map(ToString::to_string).as_deref(),
            Some("1.1")
        );
        assert!(matches!(source.releases("bar"), Err(Error::Fetch(_))));
    }

    #[test]
    fn python_releases_are_prefiltered() {
        let source = MemorySource::new()
            .with_release(PYTHON, "3.8.0", at(1))
            .unwrap()
            .with_release(PYTHON, "3.12.0", at(2))
            .unwrap();
        let set = source.python_releases(&">=3.9".parse().unwrap()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.package(), PYTHON);
    }

    #[test]
    fn memory_inspector_picks_highest_match() {
        let inspector = MemoryInspector::new()
            .with_dist("foo", "1.0", "bar>=1")
            .unwrap()
            .with_dist("foo", "2.0", "bar>=2")
            .unwrap();
        let python = parse_version("3.11").unwrap();
        let wanted: RequirementSet = "foo<2".parse().unwrap();
        let found = inspector.inspect(&python, &wanted, false).unwrap();
        assert_eq!(found["foo"].version.to_string(), "1.0");
        assert_eq!(found["foo"].requires.to_string(), "bar>=1\n");
        assert_eq!(inspector.calls().len(), 1);

        let missing: RequirementSet = "baz".parse().unwrap();
        assert!(inspector.inspect(&python, &missing, false).is_err());
    }
}
