//! Calendar, lag and rolling features
//!
//! Lags and rolling statistics are evaluated per `(SKU_ID, Sales_Channel)`
//! group on a frame already sorted by date within each group. Rolling windows
//! run over the target shifted by one period, so the value at row `t` only
//! sees rows `t-W..t-1`.

use polars::prelude::*;

/// Column holding the target shifted one period within its group
const PREVIOUS_TARGET: &str = "__previous_target";

/// Name of the lag column for `lag`
pub fn lag_name(lag: usize) -> String {
    format!("lag_{lag}")
}

/// Name of the rolling mean column for `window`
pub fn roll_mean_name(window: usize) -> String {
    format!("roll_mean_{window}")
}

/// Name of the rolling standard deviation column for `window`
pub fn roll_std_name(window: usize) -> String {
    format!("roll_std_{window}")
}

/// Minimum observations before a rolling value is produced
pub fn rolling_min_periods(window: usize) -> usize {
    (window / 2).max(2)
}

/// Calendar columns derived from `date_col`
///
/// `dayofweek` is 0 for Monday through 6 for Sunday; `weekofyear` is the ISO
/// week.
pub fn calendar_columns(date_col: &str) -> Vec<Expr> {
    vec![
        (col(date_col).dt().weekday().cast(DataType::Int32) - lit(1)).alias("dayofweek"),
        col(date_col)
            .dt()
            .week()
            .cast(DataType::Int32)
            .alias("weekofyear"),
        col(date_col).dt().month().cast(DataType::Int32).alias("month"),
        col(date_col)
            .dt()
            .quarter()
            .cast(DataType::Int32)
            .alias("quarter"),
    ]
}

/// Add lag and rolling columns to a frame sorted by `keys` then date
pub fn add_lags_and_rollups(
    data: LazyFrame,
    target: &str,
    keys: &[String],
    lags: &[usize],
    windows: &[usize],
) -> LazyFrame {
    let partition: Vec<Expr> = keys.iter().map(|k| col(k.as_str())).collect();

    let lag_columns: Vec<Expr> = lags
        .iter()
        .map(|&lag| {
            col(target)
                .shift(lit(lag as i64))
                .over(partition.clone())
                .alias(lag_name(lag))
        })
        .collect();

    let rolling_columns: Vec<Expr> = windows
        .iter()
        .flat_map(|&window| {
            let options = RollingOptionsFixedWindow {
                window_size: window,
                min_periods: rolling_min_periods(window),
                ..Default::default()
            };
            [
                col(PREVIOUS_TARGET)
                    .rolling_mean(options.clone())
                    .over(partition.clone())
                    .alias(roll_mean_name(window)),
                col(PREVIOUS_TARGET)
                    .rolling_std(options)
                    .over(partition.clone())
                    .alias(roll_std_name(window)),
            ]
        })
        .collect();

    data.with_columns(lag_columns)
        // Strict one-step lookback: the current row never enters its window
        .with_columns([col(target)
            .shift(lit(1))
            .over(partition.clone())
            .alias(PREVIOUS_TARGET)])
        .with_columns(rolling_columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(7, 3)]
    #[case(28, 14)]
    #[case(3, 2)]
    #[case(1, 2)]
    fn test_rolling_min_periods(#[case] window: usize, #[case] expected: usize) {
        assert_eq!(rolling_min_periods(window), expected);
    }

    #[test]
    fn test_column_names() {
        assert_eq!(lag_name(14), "lag_14");
        assert_eq!(roll_mean_name(7), "roll_mean_7");
        assert_eq!(roll_std_name(28), "roll_std_28");
    }

    #[test]
    fn test_lags_stay_within_group() {
        let df = df!(
            "SKU_ID" => ["A", "A", "A", "B", "B"],
            "Sales_Channel" => ["web", "web", "web", "web", "web"],
            "y" => [1.0, 2.0, 3.0, 10.0, 20.0],
        )
        .unwrap();

        let keys = vec!["SKU_ID".to_string(), "Sales_Channel".to_string()];
        let out = add_lags_and_rollups(df.lazy(), "y", &keys, &[1], &[])
            .collect()
            .unwrap();

        let lag: Vec<Option<f64>> = out
            .column("lag_1")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(lag, vec![None, Some(1.0), Some(2.0), None, Some(10.0)]);
    }

    #[test]
    fn test_rolling_mean_excludes_current_row() {
        let df = df!(
            "SKU_ID" => ["A", "A", "A", "A"],
            "Sales_Channel" => ["web", "web", "web", "web"],
            "y" => [1.0, 2.0, 3.0, 100.0],
        )
        .unwrap();

        let keys = vec!["SKU_ID".to_string(), "Sales_Channel".to_string()];
        let out = add_lags_and_rollups(df.lazy(), "y", &keys, &[], &[3])
            .collect()
            .unwrap();

        let mean: Vec<Option<f64>> = out
            .column("roll_mean_3")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        // Row 3 averages rows 0..=2 only, never its own 100.0
        assert_eq!(mean[0], None);
        assert_eq!(mean[1], None);
        assert_eq!(mean[2], Some(1.5));
        assert_eq!(mean[3], Some(2.0));
    }
}
