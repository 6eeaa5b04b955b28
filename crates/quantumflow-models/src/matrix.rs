//! Dense feature matrices extracted from polars tables

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Numeric feature matrix with its column names and an optional target
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    names: Vec<String>,
    features: Array2<f64>,
    target: Option<Array1<f64>>,
}

impl FeatureMatrix {
    /// Extract `features` (in the given order) and optionally `target` from `df`.
    ///
    /// Feature values are cast to `f64` with nulls mapped to NaN. A missing
    /// feature or target column is reported as
    /// [`ModelError::MissingColumns`]; a target with nulls is rejected.
    pub fn from_frame(df: &DataFrame, features: &[String], target: Option<&str>) -> Result<Self> {
        let mut missing: Vec<String> = features
            .iter()
            .filter(|name| df.column(name.as_str()).is_err())
            .cloned()
            .collect();
        if let Some(target) = target {
            if df.column(target).is_err() {
                missing.push(target.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(ModelError::MissingColumns { missing });
        }

        let n_rows = df.height();
        let mut values = Array2::<f64>::zeros((n_rows, features.len()));
        for (j, name) in features.iter().enumerate() {
            let column = float_column(df, name)?;
            for (i, value) in column.into_iter().enumerate() {
                values[[i, j]] = value.unwrap_or(f64::NAN);
            }
        }

        let target = match target {
            Some(name) => {
                let column = float_column(df, name)?;
                if column.null_count() > 0 {
                    return Err(ModelError::InvalidParameter(format!(
                        "target column {name} contains {} nulls",
                        column.null_count()
                    )));
                }
                Some(column.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
            }
            None => None,
        };

        Ok(Self {
            names: features.to_vec(),
            features: values,
            target,
        })
    }

    /// Build directly from arrays
    pub fn new(
        names: Vec<String>,
        features: Array2<f64>,
        target: Option<Array1<f64>>,
    ) -> Result<Self> {
        if names.len() != features.ncols() {
            return Err(ModelError::DimensionMismatch {
                expected: names.len(),
                actual: features.ncols(),
            });
        }
        if let Some(t) = &target {
            if t.len() != features.nrows() {
                return Err(ModelError::DimensionMismatch {
                    expected: features.nrows(),
                    actual: t.len(),
                });
            }
        }
        Ok(Self {
            names,
            features,
            target,
        })
    }

    /// Feature names in column order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Feature values (rows x features)
    pub const fn features(&self) -> &Array2<f64> {
        &self.features
    }

    /// Target values, when extracted
    pub const fn target(&self) -> Option<&Array1<f64>> {
        self.target.as_ref()
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.clone())
}
