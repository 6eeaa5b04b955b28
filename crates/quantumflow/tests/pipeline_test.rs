//! Sales → features → model → forecast → order, end to end

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use quantumflow::features::{HolidayCalendar, SalesRecord, sales_frame};
use quantumflow::inventory::IndentPolicy;
use quantumflow::models::{
    BackendRegistry, BoosterParams, ExactGradientBoosting, FeatureMatrix, HistGradientBoosting,
    ModelSelector, RegressionBackend, SelectorConfig, blocked_cv_slices,
};
use quantumflow::{
    Config, Error, ExportFormat, Exporter, FORECAST_COLUMN, FeatureImportance, ModelHandle,
    Pipeline, forecast_records,
};
use rstest::rstest;
use std::sync::Arc;

const DAYS: i64 = 90;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Two SKUs on one channel with a weekly pattern
fn sales() -> polars::prelude::DataFrame {
    let mut records = Vec::new();
    for (sku, level) in [("SKU-A", 20.0), ("SKU-B", 60.0)] {
        for t in 0..DAYS {
            let weekday = (t % 7) as f64;
            let quantity = level + 3.0 * weekday + ((t * 13) % 5) as f64;
            records.push(SalesRecord::new(
                start() + Duration::days(t),
                sku,
                "retail",
                quantity,
            ));
        }
    }
    sales_frame(&records).unwrap()
}

fn fast_params() -> BoosterParams {
    BoosterParams {
        n_estimators: 40,
        learning_rate: 0.1,
        max_depth: None,
        max_leaves: 8,
        min_samples_leaf: 5,
        subsample: 0.9,
        colsample_bytree: 0.8,
        lambda: 0.0,
        max_bins: 64,
        seed: 7,
    }
}

/// Histogram and exact backends competing under blocked CV
fn competing_selector(n_splits: usize) -> ModelSelector {
    let backends: Vec<Arc<dyn RegressionBackend>> = vec![
        Arc::new(HistGradientBoosting::with_params(fast_params())),
        Arc::new(ExactGradientBoosting::with_params(BoosterParams {
            max_depth: Some(3),
            lambda: 1.0,
            ..fast_params()
        })),
    ];
    ModelSelector::new(
        BackendRegistry::from_backends(backends),
        SelectorConfig {
            n_splits,
            ..Default::default()
        },
    )
}

/// Day number of every feature row, in row order
fn row_days(features: &polars::prelude::DataFrame) -> Vec<i32> {
    features
        .column("Date")
        .unwrap()
        .as_materialized_series()
        .date()
        .unwrap()
        .physical()
        .into_iter()
        .map(|d| d.unwrap())
        .collect()
}

fn pipeline() -> Pipeline {
    let backend: Arc<dyn RegressionBackend> =
        Arc::new(HistGradientBoosting::with_params(fast_params()));
    let selector = ModelSelector::new(
        BackendRegistry::from_backends(vec![backend]),
        SelectorConfig::default(),
    );
    Pipeline::new(Config::default())
        .unwrap()
        .with_selector(selector)
        .with_enricher(HolidayCalendar::new([start() + Duration::days(40)]))
}

#[test]
fn test_train_forecast_and_recommend() {
    let pipeline = pipeline();
    let sales = sales();
    let handle = pipeline.train(&sales).unwrap();

    assert_eq!(handle.name(), "hist_gbm");
    assert_eq!(handle.quantile_levels(), vec![0.5, 0.8, 0.9, 0.95]);
    assert_eq!(
        handle.feature_names(),
        Config::default().features.model_feature_names().as_slice()
    );

    let features = pipeline.build_features(&sales).unwrap();
    // 28-day rolling window needs 14 prior observations
    assert_eq!(features.height(), 2 * (DAYS as usize - 14));

    let frame = pipeline.forecast_frame(&handle, &features, Some(0.9)).unwrap();
    assert_eq!(
        frame.get_column_names_str(),
        vec!["Date", "SKU_ID", "Sales_Channel", FORECAST_COLUMN]
    );
    let records = forecast_records(&frame).unwrap();
    assert_eq!(records.len(), features.height());

    let horizon: Vec<f64> = records
        .iter()
        .filter(|r| r.sku_id == "SKU-B")
        .rev()
        .take(7)
        .map(|r| r.forecast)
        .collect();
    let rec = pipeline.recommend(&horizon, 5, 0.0, None).unwrap();
    assert!(rec.suggested_order > 0.0);
    assert!(rec.reorder_point >= rec.safety_stock);
}

#[test]
fn test_reloaded_handle_is_new_and_equivalent() {
    let pipeline = pipeline();
    let sales = sales();
    let handle = pipeline.train(&sales).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    handle.save(&path).unwrap();

    let reloaded = ModelHandle::load(&path).unwrap();
    assert!(!reloaded.same_model(&handle));
    assert!(handle.clone().same_model(&handle));

    let features = pipeline.build_features(&sales).unwrap();
    let before = pipeline.forecast(&handle, &features, None).unwrap();
    let after = pipeline.forecast(&reloaded, &features, None).unwrap();
    assert_eq!(before, after);

    let importances = FeatureImportance::from_model(reloaded.model());
    let total: f64 = importances.iter().map(|i| i.importance).sum();
    assert_relative_eq!(total, 1.0, epsilon = 1e-9);
    let csv = importances.export_to_string(ExportFormat::Csv).unwrap();
    assert!(csv.starts_with("feature,importance\n"));
}

#[rstest]
#[case(2)]
#[case(3)]
#[case(5)]
fn test_validation_blocks_follow_training_blocks(#[case] n_splits: usize) {
    let features = pipeline().build_features(&sales()).unwrap();
    let days = row_days(&features);

    for split in blocked_cv_slices(features.height(), n_splits) {
        let train_end = days[split.train.clone()].iter().max().unwrap();
        let validation_start = days[split.validation.clone()].iter().min().unwrap();
        assert!(
            validation_start >= train_end,
            "validation {:?} starts before training {:?} ends",
            split.validation,
            split.train
        );
    }
}

#[test]
fn test_competing_backends_over_several_skus() {
    let sales = sales();
    let selector = competing_selector(3);
    let pipeline = pipeline().with_selector(selector.clone());

    let first = pipeline.train(&sales).unwrap();
    let second = pipeline.train(&sales).unwrap();
    assert_eq!(first.name(), second.name());

    let features = pipeline.build_features(&sales).unwrap();
    assert_eq!(
        pipeline.forecast(&first, &features, None).unwrap(),
        pipeline.forecast(&second, &features, None).unwrap()
    );

    let names = Config::default().features.model_feature_names();
    let matrix = FeatureMatrix::from_frame(&features, &names, Some("Sales_Quantity")).unwrap();
    let report = selector.evaluate(&matrix).unwrap();
    let scored: Vec<&str> = report
        .candidates
        .iter()
        .map(|c| c.spec.name.as_str())
        .collect();
    assert_eq!(scored, vec!["hist_gbm", "exact_gbm"]);
    for candidate in &report.candidates {
        assert_eq!(candidate.fold_rmse.len(), 3);
        assert!(candidate.mean_rmse.is_finite());
    }
    assert_eq!(report.best().unwrap().spec.name, first.name());

    // Only the histogram backend trains quantile models
    let expected_levels = if first.name() == "hist_gbm" { 4 } else { 0 };
    assert_eq!(first.quantile_levels().len(), expected_levels);
}

#[test]
fn test_missing_sales_columns_abort_training() {
    let pipeline = pipeline();
    let sales = sales().drop("Sales_Channel").unwrap();
    let err = pipeline.train(&sales).unwrap_err();
    assert!(matches!(err, Error::Feature(_)));
}

#[test]
fn test_forecast_rejects_missing_feature_columns() {
    let pipeline = pipeline();
    let sales = sales();
    let handle = pipeline.train(&sales).unwrap();
    let features = pipeline.build_features(&sales).unwrap().drop("lag_7").unwrap();
    let err = pipeline.forecast(&handle, &features, None).unwrap_err();
    assert!(matches!(
        err,
        Error::Model(quantumflow::models::ModelError::PredictionShape { .. })
    ));
}

#[test]
fn test_invalid_policy_override() {
    let pipeline = pipeline();
    let policy = IndentPolicy {
        service_level: 1.5,
        ..Default::default()
    };
    let err = pipeline.recommend(&[5.0, 6.0], 3, 0.0, Some(&policy)).unwrap_err();
    assert!(matches!(err, Error::Policy(_)));
}
