//! Lazy expression nodes.
//!
//! Nodes are immutable values. They hold no resolved data; every call to
//! `resolve` recomputes the result from the context.

pub mod convert;
pub mod release;
pub mod requirement;
pub mod specifier;
pub mod version;

pub use convert::{
    eager_requirement, eager_specifier, get_lazy_release, get_lazy_release_set,
    get_lazy_requirement, get_lazy_requirement_set, get_lazy_specifier, get_lazy_specifier_set,
    get_lazy_version, AnyRelease, AnyReleaseSet, AnyRequirement, AnyRequirementSet,
    AnySpecifier, AnySpecifierSet, AnyVersion,
};
pub use release::{AgeFilter, LazyRelease, LazyReleaseSet};
pub use requirement::{LazyRequirement, LazyRequirementSet};
pub use specifier::{LazySpecifier, LazySpecifierSet};
pub use version::LazyVersion;
