//! External enrichment
//!
//! Date-keyed tables joined onto the sales table before lags are computed.
//! Fetching weather or holiday calendars is the caller's job; enrichers only
//! join data they were given. The builder treats every enricher as
//! best-effort: on failure its output columns are filled with nulls.

use crate::error::{FeatureError, Result};
use crate::schema::{DATE, HOLIDAY_FLAG, ensure_columns, ensure_date_column, ensure_unique_keys};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A best-effort source of extra columns keyed on `Date`
pub trait Enricher: std::fmt::Debug + Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Columns this enricher adds (null-filled when it fails)
    fn output_columns(&self) -> Vec<String>;

    /// Return `data` with the enrichment columns attached, row count unchanged
    fn enrich(&self, data: &DataFrame) -> Result<DataFrame>;
}

fn left_join_on_date(data: &DataFrame, other: DataFrame) -> Result<DataFrame> {
    let joined = data
        .clone()
        .lazy()
        .join(
            other.lazy(),
            [col(DATE)],
            [col(DATE)],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    Ok(joined)
}

/// Flags dates found in a holiday calendar
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolidayCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Create a calendar from a set of holiday dates
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Whether `date` is a holiday
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.dates.contains(date)
    }

    /// Number of holidays in the calendar
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the calendar has no holidays
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl Enricher for HolidayCalendar {
    fn name(&self) -> &str {
        "holiday_calendar"
    }

    fn output_columns(&self) -> Vec<String> {
        vec![HOLIDAY_FLAG.to_string()]
    }

    fn enrich(&self, data: &DataFrame) -> Result<DataFrame> {
        let dates: Vec<NaiveDate> = self.dates.iter().copied().collect();
        let marks = df!(
            DATE => dates.as_slice(),
            "__holiday" => vec![1i32; dates.len()],
        )?;

        let joined = left_join_on_date(data, marks)?;
        let flagged = joined
            .lazy()
            .with_columns([col("__holiday").fill_null(lit(0)).alias(HOLIDAY_FLAG)])
            .collect()?;
        Ok(flagged.drop("__holiday")?)
    }
}

/// One day of observed weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Observation date
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// Daily maximum temperature, C
    pub temp_max: Option<f64>,
    /// Daily minimum temperature, C
    pub temp_min: Option<f64>,
    /// Daily precipitation, mm
    pub precip_mm: Option<f64>,
}

/// Joins daily weather and derives rain/cold/hot flags
#[derive(Debug, Clone, Default)]
pub struct WeatherTable {
    observations: Vec<WeatherObservation>,
}

impl WeatherTable {
    /// Rain threshold in mm
    pub const RAIN_MM: f64 = 0.5;
    /// Cold threshold in C
    pub const COLD_C: f64 = 10.0;
    /// Hot threshold in C
    pub const HOT_C: f64 = 30.0;

    /// Create a weather table from daily observations
    pub const fn new(observations: Vec<WeatherObservation>) -> Self {
        Self { observations }
    }
}

impl Enricher for WeatherTable {
    fn name(&self) -> &str {
        "weather"
    }

    fn output_columns(&self) -> Vec<String> {
        ["temp_max", "temp_min", "precip_mm", "temp_avg", "is_rain", "is_cold", "is_hot"]
            .iter()
            .map(|c| (*c).to_string())
            .collect()
    }

    fn enrich(&self, data: &DataFrame) -> Result<DataFrame> {
        let weather = df!(
            DATE => self.observations.iter().map(|o| o.date).collect::<Vec<_>>(),
            "temp_max" => self.observations.iter().map(|o| o.temp_max).collect::<Vec<_>>(),
            "temp_min" => self.observations.iter().map(|o| o.temp_min).collect::<Vec<_>>(),
            "precip_mm" => self.observations.iter().map(|o| o.precip_mm).collect::<Vec<_>>(),
        )?;
        ensure_unique_keys(&weather, &[DATE], "weather")?;

        let joined = left_join_on_date(data, weather)?;
        let derived = joined
            .lazy()
            .with_columns([((col("temp_max") + col("temp_min")) / lit(2.0)).alias("temp_avg")])
            .with_columns([
                col("precip_mm")
                    .fill_null(lit(0.0))
                    .gt(lit(Self::RAIN_MM))
                    .cast(DataType::Int32)
                    .alias("is_rain"),
                col("temp_avg")
                    .lt(lit(Self::COLD_C))
                    .cast(DataType::Int32)
                    .alias("is_cold"),
                col("temp_avg")
                    .gt(lit(Self::HOT_C))
                    .cast(DataType::Int32)
                    .alias("is_hot"),
            ])
            .collect()?;
        Ok(derived)
    }
}

/// Arbitrary external regressors keyed on `Date`
#[derive(Debug, Clone)]
pub struct ExternalRegressors {
    table: DataFrame,
}

impl ExternalRegressors {
    /// Wrap a table that must contain a unique `Date` column
    pub fn new(table: DataFrame) -> Result<Self> {
        ensure_columns(&table, &[DATE], "external regressors")?;
        ensure_date_column(&table, DATE)?;
        ensure_unique_keys(&table, &[DATE], "external regressors")?;
        if table.width() < 2 {
            return Err(FeatureError::InvalidConfig(
                "external regressors need at least one column besides Date".to_string(),
            ));
        }
        Ok(Self { table })
    }
}

impl Enricher for ExternalRegressors {
    fn name(&self) -> &str {
        "external_regressors"
    }

    fn output_columns(&self) -> Vec<String> {
        self.table
            .get_column_names()
            .into_iter()
            .filter(|c| c.as_str() != DATE)
            .map(|c| c.to_string())
            .collect()
    }

    fn enrich(&self, data: &DataFrame) -> Result<DataFrame> {
        left_join_on_date(data, self.table.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn base() -> DataFrame {
        df!(
            DATE => [day(1), day(2), day(3)],
            "Sales_Quantity" => [1.0, 2.0, 3.0],
        )
        .unwrap()
    }

    fn sorted_i32(df: &DataFrame, name: &str) -> Vec<Option<i32>> {
        let sorted = df
            .sort([DATE], SortMultipleOptions::default())
            .unwrap();
        sorted
            .column(name)
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_holiday_flags() {
        let calendar = HolidayCalendar::new([day(2)]);
        let out = calendar.enrich(&base()).unwrap();
        assert_eq!(out.height(), 3);
        assert!(out.column("__holiday").is_err());
        assert_eq!(sorted_i32(&out, HOLIDAY_FLAG), vec![Some(0), Some(1), Some(0)]);
    }

    #[test]
    fn test_weather_flags() {
        let table = WeatherTable::new(vec![
            WeatherObservation {
                date: day(1),
                temp_max: Some(5.0),
                temp_min: Some(1.0),
                precip_mm: Some(3.0),
            },
            WeatherObservation {
                date: day(2),
                temp_max: Some(36.0),
                temp_min: Some(28.0),
                precip_mm: None,
            },
        ]);
        let out = table.enrich(&base()).unwrap();
        assert_eq!(out.height(), 3);
        assert_eq!(sorted_i32(&out, "is_rain"), vec![Some(1), Some(0), Some(0)]);
        assert_eq!(sorted_i32(&out, "is_cold"), vec![Some(1), Some(0), None]);
        assert_eq!(sorted_i32(&out, "is_hot"), vec![Some(0), Some(1), None]);
    }

    #[test]
    fn test_weather_rejects_duplicate_dates() {
        let obs = WeatherObservation {
            date: day(1),
            temp_max: None,
            temp_min: None,
            precip_mm: None,
        };
        let table = WeatherTable::new(vec![obs.clone(), obs]);
        assert!(table.enrich(&base()).is_err());
    }

    #[test]
    fn test_external_regressors_require_date() {
        let table = df!("price_index" => [1.0]).unwrap();
        assert!(matches!(
            ExternalRegressors::new(table),
            Err(FeatureError::Schema { .. })
        ));
    }

    #[test]
    fn test_external_regressors_join() {
        let table = df!(
            DATE => [day(1), day(3)],
            "price_index" => [1.5, 2.5],
        )
        .unwrap();
        let regressors = ExternalRegressors::new(table).unwrap();
        assert_eq!(regressors.output_columns(), vec!["price_index".to_string()]);

        let out = regressors.enrich(&base()).unwrap();
        assert_eq!(out.height(), 3);
        assert_eq!(out.column("price_index").unwrap().null_count(), 1);
    }
}
