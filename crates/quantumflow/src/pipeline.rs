//! End-to-end forecasting pipeline
//!
//! sales table → feature table → trained model → forecast → order
//! recommendation. The pipeline never stores a trained model; models live in
//! [`ModelHandle`]s passed into every forecast call.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::ForecastRecord;
use crate::handle::ModelHandle;
use polars::prelude::*;
use quantumflow_features::schema::{DATE, SALES_CHANNEL, SKU_ID};
use quantumflow_features::{Enricher, FeatureBuilder};
use quantumflow_inventory::{
    DemandStatistics, IndentPolicy, InventoryPolicyEngine, OrderRecommendation,
};
use quantumflow_models::{ForecastEngine, ModelSelector};
use tracing::info;

/// Name of the prediction column added by [`Pipeline::forecast_frame`]
pub const FORECAST_COLUMN: &str = "forecast";

/// Feature construction, model training and forecasting with one configuration
#[derive(Debug)]
pub struct Pipeline {
    config: Config,
    builder: FeatureBuilder,
    selector: ModelSelector,
}

impl Pipeline {
    /// Create a pipeline using the process-wide backend registry
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let builder = FeatureBuilder::new(config.features.clone())?;
        let selector = ModelSelector::with_config(config.selector.clone());
        Ok(Self {
            config,
            builder,
            selector,
        })
    }

    /// Replace the model selector (e.g. to restrict candidate backends)
    pub fn with_selector(mut self, selector: ModelSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Join a (Date, SKU_ID, Promo_Flag) promotions table into every feature build
    pub fn with_promotions(mut self, promotions: DataFrame) -> Result<Self> {
        self.builder = self.builder.with_promotions(promotions)?;
        Ok(self)
    }

    /// Add a best-effort enrichment step
    pub fn with_enricher(mut self, enricher: impl Enricher + 'static) -> Self {
        self.builder = self.builder.with_enricher(enricher);
        self
    }

    /// Pipeline configuration
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Build the leakage-safe feature table for `sales`
    pub fn build_features(&self, sales: &DataFrame) -> Result<DataFrame> {
        Ok(self.builder.build(sales)?)
    }

    /// Build features from `sales`, select a backend and train a model
    pub fn train(&self, sales: &DataFrame) -> Result<ModelHandle> {
        let features = self.build_features(sales)?;
        let feature_names = self.config.features.model_feature_names();
        let model = self.selector.select_and_train_frame(
            &features,
            &feature_names,
            &self.config.features.target,
        )?;
        info!(
            model = model.name(),
            rows = features.height(),
            quantiles = ?model.quantile_levels(),
            "Training run complete"
        );
        Ok(ModelHandle::new(model))
    }

    /// Predict every row of a feature table
    pub fn forecast(
        &self,
        handle: &ModelHandle,
        features: &DataFrame,
        quantile: Option<f64>,
    ) -> Result<Vec<f64>> {
        let predictions = ForecastEngine.predict(handle.model(), features, quantile)?;
        Ok(predictions.to_vec())
    }

    /// Date and group key columns of `features` with a `forecast` column appended
    pub fn forecast_frame(
        &self,
        handle: &ModelHandle,
        features: &DataFrame,
        quantile: Option<f64>,
    ) -> Result<DataFrame> {
        let predictions = self.forecast(handle, features, quantile)?;
        let keys = std::iter::once(&self.config.features.date_column)
            .chain(&self.config.features.group_keys)
            .map(String::as_str);
        let mut output = features.select(keys)?;
        output.with_column(Column::new(FORECAST_COLUMN.into(), predictions))?;
        Ok(output)
    }

    /// Recommend an order from a daily forecast horizon
    pub fn recommend(
        &self,
        forecast: &[f64],
        lead_time_days: u32,
        on_hand: f64,
        policy: Option<&IndentPolicy>,
    ) -> Result<OrderRecommendation> {
        let demand = DemandStatistics::from_forecast(forecast)?;
        let policy = policy.unwrap_or(&self.config.policy);
        Ok(InventoryPolicyEngine.recommend(demand, lead_time_days, on_hand, policy)?)
    }
}

/// Typed rows of a frame produced by [`Pipeline::forecast_frame`] with the
/// default `Date`, `SKU_ID` and `Sales_Channel` keys
pub fn forecast_records(frame: &DataFrame) -> Result<Vec<ForecastRecord>> {
    let dates = frame.column(DATE)?.as_materialized_series().date()?.clone();
    let skus = frame.column(SKU_ID)?.as_materialized_series().str()?.clone();
    let channels = frame
        .column(SALES_CHANNEL)?
        .as_materialized_series()
        .str()?
        .clone();
    let values = frame
        .column(FORECAST_COLUMN)?
        .as_materialized_series()
        .f64()?
        .clone();

    dates
        .as_date_iter()
        .zip(skus.into_iter())
        .zip(channels.into_iter())
        .zip(values.into_iter())
        .map(|(((date, sku), channel), forecast)| match (date, sku, channel, forecast) {
            (Some(date), Some(sku), Some(channel), Some(forecast)) => Ok(ForecastRecord {
                date,
                sku_id: sku.to_string(),
                sales_channel: channel.to_string(),
                forecast,
            }),
            _ => Err(Error::InvalidInput(
                "forecast frame contains null keys or values".to_string(),
            )),
        })
        .collect()
}
