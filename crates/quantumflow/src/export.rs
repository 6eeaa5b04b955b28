//! CSV and JSON export of forecasts, importances and recommendations

use crate::error::{Error, Result};
use chrono::NaiveDate;
use quantumflow_inventory::OrderRecommendation;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    PrettyJson,
}

impl ExportFormat {
    /// File extension for this format
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// One forecast value for a series and date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    /// Forecast date
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// SKU identifier
    #[serde(rename = "SKU_ID")]
    pub sku_id: String,
    /// Channel identifier
    #[serde(rename = "Sales_Channel")]
    pub sales_channel: String,
    /// Predicted demand
    pub forecast: f64,
}

/// Gain importance of one model feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Feature name
    pub feature: String,
    /// Share of total split gain
    pub importance: f64,
}

impl FeatureImportance {
    /// Importances of the base model, most important first
    pub fn from_model(model: &quantumflow_models::TrainedModel) -> Vec<Self> {
        let mut importances: Vec<Self> = model
            .feature_importances()
            .into_iter()
            .map(|(feature, importance)| Self {
                feature,
                importance,
            })
            .collect();
        importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        importances
    }
}

/// Trait for types that can be written as CSV or JSON
pub trait Exporter {
    /// Export to a string in the given format
    fn export_to_string(&self, format: ExportFormat) -> Result<String>;

    /// Export to a file in the given format
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string<T: Serialize>(records: &[T]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidInput(e.to_string()))
}

fn json_string<T: Serialize + ?Sized>(value: &T, format: ExportFormat) -> Result<String> {
    Ok(match format {
        ExportFormat::PrettyJson => serde_json::to_string_pretty(value)?,
        _ => serde_json::to_string(value)?,
    })
}

impl Exporter for [ForecastRecord] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => csv_string(self),
            _ => json_string(self, format),
        }
    }
}

impl Exporter for [FeatureImportance] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => csv_string(self),
            _ => json_string(self, format),
        }
    }
}

impl Exporter for OrderRecommendation {
    fn export_to_string(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Csv => csv_string(std::slice::from_ref(self)),
            _ => json_string(self, format),
        }
    }
}
