//! Process spawning and disposable virtualenvs for compreq.
//!
//! Some requirement computations need to know what a distribution actually
//! declares, which is only reliably available after installing it. This
//! crate provides:
//!
//! - [`process`]: a small blocking process builder
//! - [`venv`]: [`VirtualEnv`] and the self-removing [`TempVirtualEnv`]
//! - [`inspector`]: [`VenvInspector`], the
//!   [`DistInspector`](compreq_core::DistInspector) built on them

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod inspector;
pub mod process;
pub mod venv;

pub use error::{PlatformError, Result};
pub use inspector::VenvInspector;
pub use process::ProcessBuilder;
pub use venv::{parse_dist_metadata, TempVirtualEnv, VirtualEnv, DEFAULT_VIRTUALENV};
