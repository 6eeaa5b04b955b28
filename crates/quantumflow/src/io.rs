//! CSV input tables

use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use quantumflow_features::{
    PromotionRecord, SalesRecord, WeatherObservation, promotions_frame, sales_frame,
};
use quantumflow_inventory::LeadTimeRecord;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Deserialize every row of a headered CSV stream
pub fn read_records<T: DeserializeOwned, R: Read>(reader: R) -> Result<Vec<T>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let records = csv_reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;
    Ok(records)
}

fn read_path<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let records: Vec<T> = read_records(std::fs::File::open(path)?)?;
    debug!(path = %path.display(), rows = records.len(), "Read CSV");
    Ok(records)
}

/// Sales table from a CSV with `Date,SKU_ID,Sales_Channel,Sales_Quantity`
/// and optional `Price,Promotion_Active,Discount_Percentage,Holiday_Flag`
pub fn read_sales_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let records: Vec<SalesRecord> = read_path(path.as_ref())?;
    Ok(sales_frame(&records)?)
}

/// Promotions table from a CSV with `Date,SKU_ID,Promo_Flag`
pub fn read_promotions_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let records: Vec<PromotionRecord> = read_path(path.as_ref())?;
    Ok(promotions_frame(&records)?)
}

#[derive(Debug, Deserialize)]
struct HolidayRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
}

/// Holiday dates from a CSV with a `Date` column
pub fn read_holidays_csv(path: impl AsRef<Path>) -> Result<Vec<NaiveDate>> {
    let rows: Vec<HolidayRow> = read_path(path.as_ref())?;
    Ok(rows.into_iter().map(|r| r.date).collect())
}

/// Daily weather from a CSV with `Date,temp_max,temp_min,precip_mm`
pub fn read_weather_csv(path: impl AsRef<Path>) -> Result<Vec<WeatherObservation>> {
    read_path(path.as_ref())
}

/// Lead-time master from a CSV with
/// `SKU_ID,Lead_Time_Days,Order_Multiple,MOQ,Shelf_Life_Days`
pub fn read_lead_times_csv(path: impl AsRef<Path>) -> Result<Vec<LeadTimeRecord>> {
    read_path(path.as_ref())
}
