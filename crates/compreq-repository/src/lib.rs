//! Release metadata fetchers for compreq.
//!
//! This crate provides the [`ReleaseSource`](compreq_core::ReleaseSource)
//! implementations used outside of tests:
//!
//! - **PyPI**: [`PypiClient`] reads the JSON API of a package index.
//! - **python.org**: [`PythonFtpClient`] crawls the FTP directory listings,
//!   since Python itself is not published on PyPI.
//! - **Routing and caching**: [`DefaultSource`] sends each package to the
//!   right fetcher and [`CachedSource`] memoizes results for one run.
//!
//! Requests are blocking, with a timeout and exponential backoff on
//! transient failures.
//!
//! ## Example
//!
//! ```no_run
//! use compreq_core::ReleaseSource;
//! use compreq_repository::{
//!     CachedSource, DefaultSource, HttpClient, PypiClient, PythonFtpClient, PYPI_URL,
//!     PYTHON_FTP_URL,
//! };
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = HttpClient::with_defaults()?;
//! let source = CachedSource::new(DefaultSource::new(
//!     PypiClient::new(http.clone(), PYPI_URL)?,
//!     PythonFtpClient::new(http, PYTHON_FTP_URL)?,
//! ));
//! let releases = source.releases("requests")?;
//! println!("{} releases of requests", releases.len());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod http;
pub mod pypi;
pub mod python_ftp;
pub mod source;

pub use error::{RepositoryError, Result};
pub use http::{HttpClient, HttpConfig};
pub use pypi::{PypiClient, PYPI_URL};
pub use python_ftp::{PythonFtpClient, PYTHON_FTP_URL};
pub use source::{CachedSource, DefaultSource};
