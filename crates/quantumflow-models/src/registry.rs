//! Backend registry
//!
//! The set of available regression backends is fixed at build time through
//! cargo features and resolved once per process by [`BackendRegistry::global`].
//! Enumeration order is the registration order and drives deterministic
//! tie-breaking during selection.

use crate::backend::RegressionBackend;
use crate::error::{ModelError, Result};
use crate::params::BoosterParams;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// A candidate backend together with its hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Backend name
    pub name: String,
    /// Hyperparameters used for every fit of this candidate
    pub params: BoosterParams,
}

/// Ordered collection of regression backends
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<dyn RegressionBackend>>,
}

impl BackendRegistry {
    /// Registry of every backend compiled into this build, in fixed order:
    /// `hist_gbm` first, then `exact_gbm`
    pub fn detect() -> Self {
        #[allow(unused_mut)]
        let mut backends: Vec<Arc<dyn RegressionBackend>> = Vec::new();
        #[cfg(feature = "hist-gbm")]
        backends.push(Arc::new(crate::backend::HistGradientBoosting::default()));
        #[cfg(feature = "exact-gbm")]
        backends.push(Arc::new(crate::backend::ExactGradientBoosting::default()));
        Self { backends }
    }

    /// Process-wide registry, detected on first use
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<BackendRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::detect)
    }

    /// Registry over an explicit backend list (order preserved)
    pub fn from_backends(backends: Vec<Arc<dyn RegressionBackend>>) -> Self {
        Self { backends }
    }

    /// Registered backends in enumeration order
    pub fn backends(&self) -> &[Arc<dyn RegressionBackend>] {
        &self.backends
    }

    /// Candidate specs in enumeration order
    pub fn specs(&self) -> Vec<ModelSpec> {
        self.backends
            .iter()
            .map(|b| ModelSpec {
                name: b.name().to_string(),
                params: b.default_params(),
            })
            .collect()
    }

    /// Backend registered under `name`
    pub fn get(&self, name: &str) -> Option<&Arc<dyn RegressionBackend>> {
        self.backends.iter().find(|b| b.name() == name)
    }

    /// Like [`Self::get`] but fails with [`ModelError::BackendUnavailable`]
    pub fn require(&self, name: &str) -> Result<&Arc<dyn RegressionBackend>> {
        self.get(name).ok_or(ModelError::BackendUnavailable)
    }

    /// Number of registered backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Whether no backend is registered
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
