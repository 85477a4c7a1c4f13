//! Lazily evaluated expressions for computing dependency requirements.
//!
//! Requirement policies are written as expression trees that are not
//! evaluated until they are resolved against a [`Context`]. Resolving pulls
//! release data from the context and produces concrete versions, specifier
//! sets and requirements.
//!
//! # Example
//!
//! ```rust,ignore
//! use compreq_core::{Age, MINOR, REL_MAJOR, REL_MINOR};
//! use compreq_lazy::operators::*;
//! use compreq_lazy::{CompReq, DefaultContext};
//!
//! let context = DefaultContext::new(">=3.9,<4".parse()?, source)?;
//! let cr = CompReq::new(context);
//!
//! let requirement = pkg("requests")?
//!     .and(VERSION.ge(floor_ver(REL_MINOR, max_ver(min_age(releases(), Age::years(1))?)?, false)?)?)?
//!     .and(VERSION.lt(ceil_ver(REL_MAJOR, max_ver(releases())?, false)?)?)?;
//! println!("{}", cr.resolve_requirement(requirement)?);
//! ```
//!
//! # Architecture
//!
//! - [`lazy`]: the expression nodes and input conversions
//! - [`operators`]: factory functions the policies are written with
//! - [`compose`](compose()): merging of requirement fragments
//! - [`context`]: what expressions are resolved against
//! - [`root`]: the [`CompReq`] facade

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod compose;
mod consistent;
pub mod context;
pub mod lazy;
pub mod operators;
pub mod root;

#[cfg(test)]
pub(crate) mod testing;

pub use compose::{compose, Composed};
pub use context::{Context, DefaultContext, PackageContext};
pub use lazy::{
    AgeFilter, AnyRelease, AnyReleaseSet, AnyRequirement, AnyRequirementSet, AnySpecifier,
    AnySpecifierSet, AnyVersion, LazyRelease, LazyReleaseSet, LazyRequirement,
    LazyRequirementSet, LazySpecifier, LazySpecifierSet, LazyVersion,
};
pub use root::CompReq;
