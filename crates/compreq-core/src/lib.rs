//! Core types for computing Python dependency requirements.
//!
//! This crate holds the concrete data model that computed requirements are
//! built from:
//!
//! - [`version`]: PEP 440 versions, [`Level`]s and level-based rounding
//! - [`release`]: releases of a package and successor inference
//! - [`specifier`]: version specifiers and specifier sets
//! - [`bounds`]: the interval view of a specifier set
//! - [`requirement`]: requirements, markers and requirement sets
//! - [`source`]: the release and introspection capabilities
//! - [`time`]: calendar-aware ages

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bounds;
pub mod error;
pub mod release;
pub mod requirement;
pub mod source;
pub mod specifier;
pub mod time;
pub mod version;

pub use bounds::{get_bounds, Bounds};
pub use error::{Error, Result};
pub use release::{infer_successors, Release, ReleaseSet};
pub use requirement::{Marker, Requirement, RequirementSet};
pub use source::{
    DistInspector, DistMetadata, MemoryInspector, MemorySource, ReleaseSource, PYTHON,
};
pub use specifier::{
    make_specifier, parse_specifier, Operator, SpecifierOperator, SpecifierSet, VersionSpecifier,
};
pub use time::{utc_now, Age};
pub use version::{
    ceil, floor, parse_version, Level, Version, MAJOR, MICRO, MINOR, REL_MAJOR, REL_MICRO,
    REL_MINOR,
};
