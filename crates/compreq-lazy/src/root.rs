//! The resolution facade handed to manifest editors.

use crate::context::{Context, DefaultContext, PackageContext};
use crate::lazy::{
    get_lazy_release, get_lazy_release_set, get_lazy_requirement, get_lazy_requirement_set,
    get_lazy_specifier, get_lazy_specifier_set, get_lazy_version, AnyRelease, AnyReleaseSet,
    AnyRequirement, AnyRequirementSet, AnySpecifier, AnySpecifierSet, AnyVersion,
};
use compreq_core::{
    Release, ReleaseSet, Requirement, RequirementSet, Result, SpecifierSet, Version,
    VersionSpecifier,
};

/// Resolves any accepted input against one context.
///
/// Release, version and specifier inputs have no package of their own and
/// are resolved in the scope of the package passed alongside them.
#[derive(Debug, Clone)]
pub struct CompReq<C = DefaultContext> {
    context: C,
}

impl<C: Context> CompReq<C> {
    /// Wrap `context`.
    #[must_use]
    pub const fn new(context: C) -> Self {
        Self { context }
    }

    /// The wrapped context.
    #[must_use]
    pub const fn context(&self) -> &C {
        &self.context
    }

    fn scope(&self, package: &str) -> PackageContext<'_> {
        PackageContext::new(&self.context, package)
    }

    /// Resolve a release in the scope of `package`.
    ///
    /// # Errors
    ///
    /// Fails if the expression fails to resolve.
    pub fn resolve_release(&self, package: &str, release: impl Into<AnyRelease>) -> Result<Release> {
        get_lazy_release(release).resolve(&self.scope(package))
    }

    /// Resolve a release set in the scope of `package`.
    ///
    /// # Errors
    ///
    /// Fails if the input is malformed or the expression fails to resolve.
    pub fn resolve_release_set(
        &self,
        package: &str,
        release_set: impl Into<AnyReleaseSet>,
    ) -> Result<ReleaseSet> {
        get_lazy_release_set(release_set)?.resolve(&self.scope(package))
    }

    /// Resolve a version in the scope of `package`.
    ///
    /// # Errors
    ///
    /// Fails if the input is malformed or the expression fails to resolve.
    pub fn resolve_version(&self, package: &str, version: impl Into<AnyVersion>) -> Result<Version> {
        get_lazy_version(version)?.resolve(&self.scope(package))
    }

    /// Resolve a specifier in the scope of `package`.
    ///
    /// # Errors
    ///
    /// Fails if the input is malformed or the expression fails to resolve.
    pub fn resolve_specifier(
        &self,
        package: &str,
        specifier: impl Into<AnySpecifier>,
    ) -> Result<VersionSpecifier> {
        get_lazy_specifier(specifier)?.resolve(&self.scope(package))
    }

    /// Resolve a specifier set in the scope of `package`.
    ///
    /// # Errors
    ///
    /// Fails if the input is malformed or the expression fails to resolve.
    pub fn resolve_specifier_set(
        &self,
        package: &str,
        specifier_set: impl Into<AnySpecifierSet>,
    ) -> Result<SpecifierSet> {
        get_lazy_specifier_set(specifier_set)?.resolve(&self.scope(package))
    }

    /// Resolve a requirement.
    ///
    /// # Errors
    ///
    /// Fails if the input names no package or fails to resolve.
    pub fn resolve_requirement(&self, requirement: impl Into<AnyRequirement>) -> Result<Requirement> {
        get_lazy_requirement(requirement)?.resolve(&self.context)
    }

    /// Resolve a requirement set.
    ///
    /// # Errors
    ///
    /// Fails if any requirement fails to resolve.
    pub fn resolve_requirement_set(
        &self,
        requirement_set: impl Into<AnyRequirementSet>,
    ) -> Result<RequirementSet> {
        get_lazy_requirement_set(requirement_set)?.resolve(&self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::{max_ver, min_ver, releases, releases_of, specifier_set, VERSION};
    use crate::testing::context;
    use compreq_core::{Error, PYTHON};

    #[test]
    fn resolves_in_package_scope() {
        let cr = CompReq::new(context());
        assert_eq!(cr.resolve_release("foo", max_ver(releases()).unwrap()).unwrap().version.to_string(), "2.0.0");
        assert_eq!(cr.resolve_version("bar", min_ver(releases()).unwrap()).unwrap().to_string(), "0.1.0");
        assert_eq!(cr.resolve_release_set("foo", specifier_set(">=1.4").unwrap()).unwrap().len(), 2);
        assert_eq!(
            cr.resolve_specifier("bar", VERSION.lt(max_ver(releases()).unwrap()).unwrap())
                .unwrap()
                .to_string(),
            "<0.3.0"
        );
        assert_eq!(cr.resolve_specifier_set("foo", ">=1,<2").unwrap().len(), 2);
    }

    #[test]
    fn resolves_requirements() {
        let cr = CompReq::new(context());
        let python = cr
            .resolve_requirement(format!("{PYTHON}>=3.9"))
            .unwrap()
            .to_string();
        assert_eq!(python, "python>=3.9");
        let max_python = cr.resolve_version("foo", max_ver(releases_of(PYTHON)).unwrap()).unwrap();
        assert_eq!(max_python.to_string(), "3.11.0");

        let set = cr.resolve_requirement_set("foo>=1\nbar").unwrap();
        assert_eq!(set.to_string(), "bar\nfoo>=1\n");
        assert!(matches!(cr.resolve_requirement(">=1"), Err(Error::MissingPackage(_))));
    }
}
