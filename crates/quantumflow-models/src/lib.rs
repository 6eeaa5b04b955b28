#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantumflow/quantumflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod cv;
pub mod error;
pub mod forecast;
pub mod matrix;
pub mod metrics;
pub mod params;
pub mod registry;
pub mod selector;
pub mod trained;
pub mod tree;

// Re-export main types
pub use backend::RegressionBackend;
#[cfg(feature = "exact-gbm")]
pub use backend::ExactGradientBoosting;
#[cfg(feature = "hist-gbm")]
pub use backend::HistGradientBoosting;
pub use cv::{BlockedSplit, blocked_cv_slices};
pub use error::{ModelError, Result};
pub use forecast::ForecastEngine;
pub use matrix::FeatureMatrix;
pub use metrics::{mae, rmse};
pub use params::{BoosterParams, Objective};
pub use registry::{BackendRegistry, ModelSpec};
pub use selector::{CandidateScore, CvReport, DEFAULT_QUANTILES, ModelSelector, SelectorConfig};
pub use trained::{QuantileModel, TrainedModel};
pub use tree::{RegressionTree, TreeEnsemble, TreeNode};
