//! Sales table schema
//!
//! Column names, typed records for the raw sales and promotion tables, and the
//! validation applied before any feature is derived.

use crate::error::{FeatureError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Calendar date of the observation
pub const DATE: &str = "Date";
/// Stock-keeping unit identifier
pub const SKU_ID: &str = "SKU_ID";
/// Sales channel identifier
pub const SALES_CHANNEL: &str = "Sales_Channel";
/// Units sold (the forecast target)
pub const SALES_QUANTITY: &str = "Sales_Quantity";
/// Promotion indicator joined from the promotions table
pub const PROMO_FLAG: &str = "Promo_Flag";
/// Holiday indicator
pub const HOLIDAY_FLAG: &str = "Holiday_Flag";

/// Columns every sales table must carry
pub const REQUIRED_SALES_COLUMNS: &[&str] = &[DATE, SKU_ID, SALES_CHANNEL, SALES_QUANTITY];

/// Columns that identify a row of the sales table
pub const KEY_COLUMNS: &[&str] = &[DATE, SKU_ID, SALES_CHANNEL];

/// One observed sales row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Observation date
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// SKU identifier
    #[serde(rename = "SKU_ID")]
    pub sku_id: String,
    /// Channel identifier
    #[serde(rename = "Sales_Channel")]
    pub sales_channel: String,
    /// Units sold, never negative
    #[serde(rename = "Sales_Quantity")]
    pub sales_quantity: f64,
    /// Unit price
    #[serde(rename = "Price", default)]
    pub price: Option<f64>,
    /// Whether a promotion was running
    #[serde(rename = "Promotion_Active", default)]
    pub promotion_active: Option<i32>,
    /// Discount applied, in percent
    #[serde(rename = "Discount_Percentage", default)]
    pub discount_percentage: Option<f64>,
    /// Whether the date is a holiday
    #[serde(rename = "Holiday_Flag", default)]
    pub holiday_flag: Option<i32>,
}

impl SalesRecord {
    /// Create a record with only the required fields set
    pub fn new(
        date: NaiveDate,
        sku_id: impl Into<String>,
        sales_channel: impl Into<String>,
        sales_quantity: f64,
    ) -> Self {
        Self {
            date,
            sku_id: sku_id.into(),
            sales_channel: sales_channel.into(),
            sales_quantity,
            price: None,
            promotion_active: None,
            discount_percentage: None,
            holiday_flag: None,
        }
    }
}

/// A promotion running for a SKU on a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionRecord {
    /// Promotion date
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// SKU identifier
    #[serde(rename = "SKU_ID")]
    pub sku_id: String,
    /// 1 when a promotion runs, 0 otherwise
    #[serde(rename = "Promo_Flag")]
    pub promo_flag: i32,
}

/// Build a sales table from typed records.
///
/// Rejects negative quantities, which the schema does not allow.
pub fn sales_frame(records: &[SalesRecord]) -> Result<DataFrame> {
    if let Some(bad) = records.iter().find(|r| r.sales_quantity < 0.0) {
        return Err(FeatureError::InvalidConfig(format!(
            "negative {SALES_QUANTITY} {} for {} / {} on {}",
            bad.sales_quantity, bad.sku_id, bad.sales_channel, bad.date
        )));
    }

    let df = df!(
        DATE => records.iter().map(|r| r.date).collect::<Vec<_>>(),
        SKU_ID => records.iter().map(|r| r.sku_id.as_str()).collect::<Vec<_>>(),
        SALES_CHANNEL => records.iter().map(|r| r.sales_channel.as_str()).collect::<Vec<_>>(),
        SALES_QUANTITY => records.iter().map(|r| r.sales_quantity).collect::<Vec<_>>(),
        "Price" => records.iter().map(|r| r.price).collect::<Vec<_>>(),
        "Promotion_Active" => records.iter().map(|r| r.promotion_active).collect::<Vec<_>>(),
        "Discount_Percentage" => records.iter().map(|r| r.discount_percentage).collect::<Vec<_>>(),
        HOLIDAY_FLAG => records.iter().map(|r| r.holiday_flag).collect::<Vec<_>>(),
    )?;
    Ok(df)
}

/// Build a promotions table from typed records
pub fn promotions_frame(records: &[PromotionRecord]) -> Result<DataFrame> {
    let df = df!(
        DATE => records.iter().map(|r| r.date).collect::<Vec<_>>(),
        SKU_ID => records.iter().map(|r| r.sku_id.as_str()).collect::<Vec<_>>(),
        PROMO_FLAG => records.iter().map(|r| r.promo_flag).collect::<Vec<_>>(),
    )?;
    Ok(df)
}

/// Fail with a schema error naming every column of `required` absent from `df`
pub fn ensure_columns(df: &DataFrame, required: &[&str], table: &str) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !present.iter().any(|c| c.as_str() == **name))
        .map(|name| (*name).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(FeatureError::Schema {
            table: table.to_string(),
            missing,
        })
    }
}

/// Fail if `column` is not a calendar date
pub fn ensure_date_column(df: &DataFrame, column: &str) -> Result<()> {
    let dtype = df.column(column)?.dtype();
    if dtype == &DataType::Date {
        Ok(())
    } else {
        Err(FeatureError::ColumnType {
            column: column.to_string(),
            expected: DataType::Date.to_string(),
            actual: dtype.to_string(),
        })
    }
}

/// Fail if any combination of `keys` occurs on more than one row
pub fn ensure_unique_keys(df: &DataFrame, keys: &[&str], table: &str) -> Result<()> {
    let mut rendered: Vec<Vec<String>> = vec![Vec::with_capacity(keys.len()); df.height()];
    for key in keys {
        let values = df
            .column(key)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        for (row, value) in values.str()?.into_iter().enumerate() {
            rendered[row].push(value.unwrap_or("null").to_string());
        }
    }

    let mut seen = HashSet::with_capacity(rendered.len());
    for key in rendered {
        let joined = key.join("/");
        if !seen.insert(joined.clone()) {
            return Err(FeatureError::DuplicateKey {
                table: table.to_string(),
                key: joined,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_sales_frame_columns() {
        let records = vec![
            SalesRecord::new(day(1), "A", "web", 3.0),
            SalesRecord::new(day(2), "A", "web", 4.0),
        ];
        let df = sales_frame(&records).unwrap();
        assert_eq!(df.height(), 2);
        ensure_columns(&df, REQUIRED_SALES_COLUMNS, "sales").unwrap();
        ensure_date_column(&df, DATE).unwrap();
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let records = vec![SalesRecord::new(day(1), "A", "web", -1.0)];
        assert!(sales_frame(&records).is_err());
    }

    #[test]
    fn test_missing_columns_are_named() {
        let df = df!(
            "Date" => [day(1)],
            "SKU_ID" => ["A"],
        )
        .unwrap();

        match ensure_columns(&df, REQUIRED_SALES_COLUMNS, "sales") {
            Err(FeatureError::Schema { table, missing }) => {
                assert_eq!(table, "sales");
                assert_eq!(missing, vec!["Sales_Channel", "Sales_Quantity"]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_keys_detected() {
        let records = vec![
            SalesRecord::new(day(1), "A", "web", 3.0),
            SalesRecord::new(day(1), "A", "store", 3.0),
            SalesRecord::new(day(1), "A", "web", 5.0),
        ];
        let df = sales_frame(&records).unwrap();
        let err = ensure_unique_keys(&df, KEY_COLUMNS, "sales").unwrap_err();
        assert!(matches!(err, FeatureError::DuplicateKey { .. }));
    }

    #[test]
    fn test_unique_keys_pass() {
        let records = vec![
            SalesRecord::new(day(1), "A", "web", 3.0),
            SalesRecord::new(day(1), "A", "store", 3.0),
            SalesRecord::new(day(2), "A", "web", 5.0),
        ];
        let df = sales_frame(&records).unwrap();
        ensure_unique_keys(&df, KEY_COLUMNS, "sales").unwrap();
    }
}
