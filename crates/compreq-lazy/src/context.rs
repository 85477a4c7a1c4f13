//! Resolution contexts.
//!
//! Lazy expressions are resolved against a [`Context`], which knows the
//! current time, the targeted Python versions and where to get release data
//! from. A [`PackageContext`] additionally fixes the package whose releases
//! unqualified expressions refer to.

use compreq_core::{
    get_bounds, utc_now, DistInspector, Error, ReleaseSet, ReleaseSource, Result, SpecifierSet,
    Version, PYTHON,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Everything a lazy expression may consult while resolving.
pub trait Context {
    /// The time age filters are relative to.
    fn now(&self) -> DateTime<Utc>;

    /// The Python version used to install distributions.
    fn default_python(&self) -> &Version;

    /// The range of supported Python versions.
    fn python_specifier(&self) -> &SpecifierSet;

    /// All releases of `package`.
    ///
    /// Releases of [`PYTHON`] are restricted to [`Context::python_specifier`].
    fn releases(&self, package: &str) -> Result<ReleaseSet>;

    /// Capability to install and inspect distributions, if configured.
    fn inspector(&self) -> Option<&dyn DistInspector>;
}

/// A [`Context`] scoped to one package.
#[derive(Clone)]
pub struct PackageContext<'a> {
    parent: &'a dyn Context,
    package: String,
}

impl<'a> PackageContext<'a> {
    /// Scope `parent` to `package`.
    #[must_use]
    pub fn new(parent: &'a dyn Context, package: impl Into<String>) -> Self {
        Self {
            parent,
            package: package.into(),
        }
    }

    /// The package being resolved.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The unscoped context.
    #[must_use]
    pub fn parent(&self) -> &'a dyn Context {
        self.parent
    }

    /// The same parent scoped to another package.
    #[must_use]
    pub fn for_package(&self, package: impl Into<String>) -> Self {
        Self::new(self.parent, package)
    }
}

impl Context for PackageContext<'_> {
    fn now(&self) -> DateTime<Utc> {
        self.parent.now()
    }

    fn default_python(&self) -> &Version {
        self.parent.default_python()
    }

    fn python_specifier(&self) -> &SpecifierSet {
        self.parent.python_specifier()
    }

    fn releases(&self, package: &str) -> Result<ReleaseSet> {
        self.parent.releases(package)
    }

    fn inspector(&self) -> Option<&dyn DistInspector> {
        self.parent.inspector()
    }
}

impl fmt::Debug for PackageContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageContext")
            .field("package", &self.package)
            .finish_non_exhaustive()
    }
}

/// The standard context, backed by a [`ReleaseSource`].
#[derive(Clone)]
pub struct DefaultContext {
    python_specifier: SpecifierSet,
    default_python: Version,
    now: DateTime<Utc>,
    source: Arc<dyn ReleaseSource>,
    inspector: Option<Arc<dyn DistInspector>>,
}

impl DefaultContext {
    /// Create a context for the given Python range.
    ///
    /// The default Python version is the lower bound of `python_specifier`
    /// and "now" is the current time.
    ///
    /// # Errors
    ///
    /// Fails if `python_specifier` has no lower bound.
    pub fn new(python_specifier: SpecifierSet, source: Arc<dyn ReleaseSource>) -> Result<Self> {
        let default_python = lower_bound(&python_specifier)?;
        Ok(Self {
            python_specifier,
            default_python,
            now: utc_now(),
            source,
            inspector: None,
        })
    }

    /// Fix the current time.
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Override the default Python version.
    #[must_use]
    pub fn with_default_python(mut self, default_python: Version) -> Self {
        self.default_python = default_python;
        self
    }

    /// Enable distribution introspection.
    #[must_use]
    pub fn with_inspector(mut self, inspector: Arc<dyn DistInspector>) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// A sibling context for another Python range.
    ///
    /// The release source, inspector and time are shared.
    ///
    /// # Errors
    ///
    /// Fails if no `default_python` is given and `python_specifier` has no
    /// lower bound.
    pub fn for_python(
        &self,
        python_specifier: SpecifierSet,
        default_python: Option<Version>,
    ) -> Result<Self> {
        let default_python = match default_python {
            Some(version) => version,
            None => lower_bound(&python_specifier)?,
        };
        Ok(Self {
            python_specifier,
            default_python,
            now: self.now,
            source: Arc::clone(&self.source),
            inspector: self.inspector.clone(),
        })
    }

    /// Scope this context to `package`.
    #[must_use]
    pub fn for_package(&self, package: impl Into<String>) -> PackageContext<'_> {
        PackageContext::new(self, package)
    }
}

fn lower_bound(python_specifier: &SpecifierSet) -> Result<Version> {
    get_bounds(python_specifier)?
        .lower
        .ok_or_else(|| Error::MissingLowerBound(python_specifier.to_string()))
}

impl Context for DefaultContext {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn default_python(&self) -> &Version {
        &self.default_python
    }

    fn python_specifier(&self) -> &SpecifierSet {
        &self.python_specifier
    }

    fn releases(&self, package: &str) -> Result<ReleaseSet> {
        let releases = if package == PYTHON {
            self.source.python_releases(&self.python_specifier)?
        } else {
            self.source.releases(package)?
        };
        debug!(package, count = releases.len(), "got releases");
        Ok(releases)
    }

    fn inspector(&self) -> Option<&dyn DistInspector> {
        self.inspector.as_deref()
    }
}

impl fmt::Debug for DefaultContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultContext")
            .field("python_specifier", &self.python_specifier.to_string())
            .field("default_python", &self.default_python.to_string())
            .field("now", &self.now)
            .field("inspector", &self.inspector.is_some())
            .finish_non_exhaustive()
    }
}
