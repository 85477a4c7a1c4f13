//! Release sources backed by the fetchers.

use crate::pypi::PypiClient;
use crate::python_ftp::PythonFtpClient;
use compreq_core::{ReleaseSet, ReleaseSource, Result, SpecifierSet, PYTHON};
use dashmap::DashMap;
use tracing::debug;

/// Routes Python to python.org and every other package to PyPI.
#[derive(Debug, Clone)]
pub struct DefaultSource {
    pypi: PypiClient,
    python: PythonFtpClient,
}

impl DefaultSource {
    /// Combine the two fetchers.
    #[must_use]
    pub const fn new(pypi: PypiClient, python: PythonFtpClient) -> Self {
        Self { pypi, python }
    }
}

impl ReleaseSource for DefaultSource {
    fn releases(&self, package: &str) -> Result<ReleaseSet> {
        if package == PYTHON {
            return self.python_releases(&SpecifierSet::new());
        }
        Ok(self.pypi.releases(package)?)
    }

    fn python_releases(&self, prefilter: &SpecifierSet) -> Result<ReleaseSet> {
        Ok(self.python.releases(prefilter)?)
    }
}

/// Memoizes another source for the lifetime of the value.
///
/// Package releases are keyed by name, Python releases by prefilter.
/// Failures are not cached.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    releases: DashMap<String, ReleaseSet>,
    python_releases: DashMap<String, ReleaseSet>,
}

impl<S: ReleaseSource> CachedSource<S> {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            releases: DashMap::new(),
            python_releases: DashMap::new(),
        }
    }

    /// The wrapped source.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len() + self.python_releases.len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.releases.clear();
        self.python_releases.clear();
    }
}

fn memoized(
    cache: &DashMap<String, ReleaseSet>,
    key: &str,
    fetch: impl FnOnce() -> Result<ReleaseSet>,
) -> Result<ReleaseSet> {
    if let Some(hit) = cache.get(key) {
        debug!(key, "release cache hit");
        return Ok(hit.clone());
    }
    let fetched = fetch()?;
    cache.insert(key.to_string(), fetched.clone());
    Ok(fetched)
}

impl<S: ReleaseSource> ReleaseSource for CachedSource<S> {
    fn releases(&self, package: &str) -> Result<ReleaseSet> {
        memoized(&self.releases, package, || self.inner.releases(package))
    }

    fn python_releases(&self, prefilter: &SpecifierSet) -> Result<ReleaseSet> {
        memoized(&self.python_releases, &prefilter.to_string(), || {
            self.inner.python_releases(prefilter)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use compreq_core::MemorySource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Counting {
        inner: MemorySource,
        calls: AtomicUsize,
    }

    impl ReleaseSource for Counting {
        fn releases(&self, package: &str) -> Result<ReleaseSet> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.inner.releases(package)
        }

        fn python_releases(&self, prefilter: &SpecifierSet) -> Result<ReleaseSet> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.inner.python_releases(prefilter)
        }
    }

    fn counting() -> Counting {
        let t = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let inner = MemorySource::new()
            .with_release("foo", "1.0", t)
            .unwrap()
            .with_release(PYTHON, "3.10.0", t)
            .unwrap()
            .with_release(PYTHON, "3.11.0", t)
            .unwrap();
        Counting {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn memoizes_packages() {
        let cached = CachedSource::new(counting());
        assert!(cached.is_empty());
        assert_eq!(cached.releases("foo").unwrap().len(), 1);
        assert_eq!(cached.releases("foo").unwrap().len(), 1);
        assert_eq!(cached.inner().calls.load(Ordering::Relaxed), 1);

        assert!(cached.releases("bar").is_err());
        assert!(cached.releases("bar").is_err());
        assert_eq!(cached.inner().calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn memoizes_python_by_prefilter() {
        let cached = CachedSource::new(counting());
        let wide: SpecifierSet = ">=3.9".parse().unwrap();
        let narrow: SpecifierSet = ">=3.11".parse().unwrap();
        assert_eq!(cached.python_releases(&wide).unwrap().len(), 2);
        assert_eq!(cached.python_releases(&narrow).unwrap().len(), 1);
        assert_eq!(cached.python_releases(&wide).unwrap().len(), 2);
        assert_eq!(cached.inner().calls.load(Ordering::Relaxed), 2);
        assert_eq!(cached.len(), 2);

        cached.clear();
        assert!(cached.is_empty());
    }
}
