#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantumflow/quantumflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod policy;
pub mod recommend;
pub mod zscore;

pub use error::{PolicyError, Result};
pub use policy::{IndentPolicy, LeadTimeRecord, MAX_SERVICE_LEVEL};
pub use recommend::{
    BoundReason, DemandStatistics, InventoryPolicyEngine, OrderRecommendation, recommend_order,
};
pub use zscore::{FALLBACK_Z, Z_TABLE, z_for_service_level};
