//! [`DistInspector`] backed by disposable virtualenvs.

use crate::venv::{TempVirtualEnv, DEFAULT_VIRTUALENV};
use compreq_core::{DistInspector, DistMetadata, RequirementSet, Result, Version};
use std::collections::BTreeMap;
use tracing::debug;

/// Installs requirements into a fresh virtualenv per call and reads back
/// their metadata. The environment is removed before returning.
#[derive(Debug, Clone)]
pub struct VenvInspector {
    virtualenv: String,
}

impl VenvInspector {
    /// Use `virtualenv` to create environments.
    #[must_use]
    pub fn new(virtualenv: impl Into<String>) -> Self {
        Self {
            virtualenv: virtualenv.into(),
        }
    }

    /// The program environments are created with.
    #[must_use]
    pub fn virtualenv(&self) -> &str {
        &self.virtualenv
    }
}

impl Default for VenvInspector {
    fn default() -> Self {
        Self::new(DEFAULT_VIRTUALENV)
    }
}

impl DistInspector for VenvInspector {
    fn inspect(
        &self,
        python: &Version,
        requirements: &RequirementSet,
        deps: bool,
    ) -> Result<BTreeMap<String, DistMetadata>> {
        let venv = TempVirtualEnv::create(&self.virtualenv, python)?;
        venv.install(requirements, deps)?;
        let mut result = BTreeMap::new();
        for name in requirements.names() {
            let metadata = venv.dist_metadata(name)?;
            debug!(package = name, version = %metadata.version, "inspected");
            result.insert(name.to_string(), metadata);
        }
        Ok(result)
    }
}
