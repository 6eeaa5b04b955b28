//! Pipeline configuration
//!
//! Every section has defaults, so a config file only needs the fields it
//! changes:
//!
//! ```json
//! { "selector": { "n_splits": 5 }, "policy": { "service_level": 0.95 } }
//! ```

use crate::error::Result;
use quantumflow_features::FeatureConfig;
use quantumflow_inventory::IndentPolicy;
use quantumflow_models::SelectorConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Configuration for feature construction, model selection and ordering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feature builder settings
    pub features: FeatureConfig,
    /// Model selection settings
    pub selector: SelectorConfig,
    /// Default replenishment policy
    pub policy: IndentPolicy,
}

impl Config {
    /// Load a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.selector.validate()?;
        self.policy.validate()?;
        Ok(())
    }
}
