//! Feature Builder
//!
//! Turns a raw sales table into the feature table consumed by model training
//! and forecasting:
//!
//! 1. Validate the schema and the `(Date, SKU_ID, Sales_Channel)` key
//! 2. Join promotions (missing flag -> 0)
//! 3. Apply best-effort enrichers
//! 4. Derive calendar parts
//! 5. Sort each `(SKU_ID, Sales_Channel)` group by date and derive lags and
//!    trailing rolling statistics
//! 6. Drop rows missing any lag or rolling value
//! 7. Order rows by date, then by group key, so any contiguous block of rows
//!    covers a contiguous span of time across all groups

use crate::enrich::Enricher;
use crate::error::{FeatureError, Result};
use crate::schema::{
    DATE, PROMO_FLAG, SALES_CHANNEL, SALES_QUANTITY, SKU_ID, ensure_columns, ensure_date_column,
    ensure_unique_keys,
};
use crate::temporal::{
    add_lags_and_rollups, calendar_columns, lag_name, roll_mean_name, roll_std_name,
};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Calendar columns, in output order
pub const CALENDAR_COLUMNS: &[&str] = &["dayofweek", "weekofyear", "month", "quarter"];

/// Configuration for the feature builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Date column (default: "Date")
    pub date_column: String,
    /// Target column (default: "Sales_Quantity")
    pub target: String,
    /// Columns identifying an independent series (default: SKU_ID, Sales_Channel)
    pub group_keys: Vec<String>,
    /// Lags in observations (default: 1, 7, 14)
    pub lags: Vec<usize>,
    /// Trailing rolling windows in observations (default: 7, 28)
    pub windows: Vec<usize>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            date_column: DATE.to_string(),
            target: SALES_QUANTITY.to_string(),
            group_keys: vec![SKU_ID.to_string(), SALES_CHANNEL.to_string()],
            lags: vec![1, 7, 14],
            windows: vec![7, 28],
        }
    }
}

impl FeatureConfig {
    /// Check that every lag and window looks at least one period back
    pub fn validate(&self) -> Result<()> {
        if self.group_keys.is_empty() {
            return Err(FeatureError::InvalidConfig(
                "at least one group key is required".to_string(),
            ));
        }
        if self.lags.contains(&0) {
            return Err(FeatureError::InvalidConfig(
                "lag 0 would expose the current target".to_string(),
            ));
        }
        if self.windows.contains(&0) {
            return Err(FeatureError::InvalidConfig(
                "rolling window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Lag and rolling columns, in output order
    pub fn derived_columns(&self) -> Vec<String> {
        let lags = self.lags.iter().map(|&l| lag_name(l));
        let rolls = self
            .windows
            .iter()
            .flat_map(|&w| [roll_mean_name(w), roll_std_name(w)]);
        lags.chain(rolls).collect()
    }

    /// Ordered model feature list for this configuration
    pub fn model_feature_names(&self) -> Vec<String> {
        std::iter::once(PROMO_FLAG.to_string())
            .chain(CALENDAR_COLUMNS.iter().map(|c| (*c).to_string()))
            .chain(self.derived_columns())
            .collect()
    }

    fn key_columns(&self) -> Vec<&str> {
        std::iter::once(self.date_column.as_str())
            .chain(self.group_keys.iter().map(String::as_str))
            .collect()
    }

    fn required_columns(&self) -> Vec<&str> {
        let mut required = self.key_columns();
        required.push(self.target.as_str());
        required
    }
}

/// Builds leakage-safe feature tables from sales tables
#[derive(Debug, Default)]
pub struct FeatureBuilder {
    config: FeatureConfig,
    promotions: Option<DataFrame>,
    enrichers: Vec<Box<dyn Enricher>>,
}

impl FeatureBuilder {
    /// Create a builder with the given configuration
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            promotions: None,
            enrichers: Vec::new(),
        })
    }

    /// Join promotions keyed by (Date, SKU_ID) with a `Promo_Flag` column
    pub fn with_promotions(mut self, promotions: DataFrame) -> Result<Self> {
        ensure_columns(&promotions, &[DATE, SKU_ID, PROMO_FLAG], "promotions")?;
        ensure_date_column(&promotions, DATE)?;
        ensure_unique_keys(&promotions, &[DATE, SKU_ID], "promotions")?;
        self.promotions = Some(promotions.select([DATE, SKU_ID, PROMO_FLAG])?);
        Ok(self)
    }

    /// Add a best-effort enricher, applied in insertion order
    pub fn with_enricher(mut self, enricher: impl Enricher + 'static) -> Self {
        self.enrichers.push(Box::new(enricher));
        self
    }

    /// Get the builder configuration
    pub const fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Build the feature table for `sales`.
    ///
    /// Fails with [`FeatureError::Schema`] naming any missing required column.
    pub fn build(&self, sales: &DataFrame) -> Result<DataFrame> {
        let config = &self.config;
        ensure_columns(sales, &config.required_columns(), "sales")?;
        ensure_date_column(sales, &config.date_column)?;
        ensure_unique_keys(sales, &config.key_columns(), "sales")?;

        let mut frame = self.join_promotions(sales)?;
        for enricher in &self.enrichers {
            frame = apply_best_effort(enricher.as_ref(), frame)?;
        }

        let mut output: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .map(|c| c.to_string())
            .collect();
        for name in CALENDAR_COLUMNS
            .iter()
            .map(|c| (*c).to_string())
            .chain(config.derived_columns())
        {
            if !output.contains(&name) {
                output.push(name);
            }
        }

        let mut sort_by: Vec<&str> = config.group_keys.iter().map(String::as_str).collect();
        sort_by.push(config.date_column.as_str());

        let prepared = frame
            .lazy()
            .with_columns(calendar_columns(&config.date_column))
            .with_columns([col(config.target.as_str()).cast(DataType::Float64)])
            .sort(
                sort_by,
                SortMultipleOptions::default().with_maintain_order(true),
            );

        let derived = config.derived_columns();
        let complete = derived
            .iter()
            .map(|c| col(c.as_str()).is_not_null())
            .reduce(|acc, e| acc.and(e));

        let mut features = add_lags_and_rollups(
            prepared,
            &config.target,
            &config.group_keys,
            &config.lags,
            &config.windows,
        );
        if let Some(predicate) = complete {
            features = features.filter(predicate);
        }
        features = features.sort(
            config.key_columns(),
            SortMultipleOptions::default().with_maintain_order(true),
        );

        let table = features
            .select(output.iter().map(|c| col(c.as_str())).collect::<Vec<_>>())
            .collect()?;

        debug!(
            input_rows = sales.height(),
            output_rows = table.height(),
            columns = table.width(),
            "built feature table"
        );
        Ok(table)
    }

    fn join_promotions(&self, sales: &DataFrame) -> Result<DataFrame> {
        let has_flag = sales
            .get_column_names()
            .iter()
            .any(|c| c.as_str() == PROMO_FLAG);

        let joined = match &self.promotions {
            Some(promotions) => {
                let base = if has_flag {
                    sales.drop(PROMO_FLAG)?
                } else {
                    sales.clone()
                };
                base.lazy().join(
                    promotions.clone().lazy(),
                    [col(DATE), col(SKU_ID)],
                    [col(DATE), col(SKU_ID)],
                    JoinArgs::new(JoinType::Left),
                )
            }
            None if has_flag => sales.clone().lazy(),
            None => sales.clone().lazy().with_columns([lit(0).alias(PROMO_FLAG)]),
        };

        let frame = joined
            .with_columns([col(PROMO_FLAG)
                .fill_null(lit(0))
                .cast(DataType::Int32)
                .alias(PROMO_FLAG)])
            .collect()?;
        Ok(frame)
    }
}

/// Run `enricher`, falling back to null columns when it fails
fn apply_best_effort(enricher: &dyn Enricher, frame: DataFrame) -> Result<DataFrame> {
    match enricher.enrich(&frame) {
        Ok(enriched) if enriched.height() == frame.height() => Ok(enriched),
        Ok(enriched) => {
            warn!(
                enricher = enricher.name(),
                expected = frame.height(),
                actual = enriched.height(),
                "enrichment changed the row count, ignoring its output"
            );
            null_columns(enricher, frame)
        }
        Err(err) => {
            warn!(
                enricher = enricher.name(),
                error = %err,
                "enrichment failed, continuing without it"
            );
            null_columns(enricher, frame)
        }
    }
}

fn null_columns(enricher: &dyn Enricher, mut frame: DataFrame) -> Result<DataFrame> {
    let height = frame.height();
    for name in enricher.output_columns() {
        frame.with_column(Series::full_null(
            name.as_str().into(),
            height,
            &DataType::Float64,
        ))?;
    }
    Ok(frame)
}
