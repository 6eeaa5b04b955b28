#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantumflow/quantumflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod export;
pub mod handle;
pub mod io;
pub mod pipeline;

// Re-export main types from sub-crates
pub use quantumflow_features as features;
pub use quantumflow_inventory as inventory;
pub use quantumflow_models as models;

pub use config::Config;
pub use error::{Error, Result};
pub use export::{ExportFormat, Exporter, FeatureImportance, ForecastRecord};
pub use handle::ModelHandle;
pub use pipeline::{FORECAST_COLUMN, Pipeline, forecast_records};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
