#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/quantumflow/quantumflow/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod catalog;
pub mod enrich;
pub mod error;
pub mod schema;
pub mod temporal;

pub use builder::{CALENDAR_COLUMNS, FeatureBuilder, FeatureConfig};
pub use catalog::{FeatureCategory, FeatureInfo, available_features, model_feature_names};
pub use enrich::{Enricher, ExternalRegressors, HolidayCalendar, WeatherObservation, WeatherTable};
pub use error::{FeatureError, Result};
pub use schema::{PromotionRecord, SalesRecord, promotions_frame, sales_frame};
