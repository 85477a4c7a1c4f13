//! Layered configuration for compreq.
//!
//! Settings are merged in priority order, lowest first:
//!
//! 1. Built-in defaults
//! 2. Global config (`config.json` in the platform config directory, e.g.
//!    `~/.config/compreq/config.json`)
//! 3. Project config (`compreq.json` next to the manifest)
//! 4. Environment variables (`COMPREQ_*`)
//! 5. CLI arguments
//!
//! Configuration files are JSON with kebab-case keys:
//!
//! ```json
//! {
//!     "pypi-url": "https://pypi.org/",
//!     "timeout": 60,
//!     "retries": 3,
//!     "python": ">=3.9,<4"
//! }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use compreq_config::{CliOverrides, ConfigLoader};
//!
//! let config = ConfigLoader::new(".")
//!     .resolve(&CliOverrides::default())
//!     .expect("failed to resolve config");
//! println!("index: {}", config.pypi_url);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod env;
pub mod error;
pub mod loader;
pub mod types;

pub use env::{EnvConfig, EnvVar};
pub use error::{ConfigError, Result};
pub use loader::{CliOverrides, ConfigLoader, ConfigSource, GLOBAL_CONFIG_FILE, PROJECT_CONFIG_FILE};
pub use types::{
    parse_now, ConfigFile, ResolvedConfig, DEFAULT_PYPI_URL, DEFAULT_PYTHON_FTP_URL,
    DEFAULT_RETRIES, DEFAULT_TIMEOUT_SECS, DEFAULT_VIRTUALENV,
};
