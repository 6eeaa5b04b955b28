//! Feature Catalog
//!
//! Central list of every column the feature builder derives. The ordered
//! model feature list is read from here, so training and forecasting agree on
//! column names and order.

/// Feature categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureCategory {
    /// Parts of the observation date
    Calendar,
    /// Target value a fixed number of periods earlier
    Lag,
    /// Trailing mean or standard deviation of the target
    Rolling,
    /// Promotion indicator
    Promotion,
    /// Weather and holiday enrichment
    External,
}

/// Feature metadata
#[derive(Debug, Clone)]
pub struct FeatureInfo {
    /// Column name (unique identifier)
    pub name: &'static str,
    /// Feature category
    pub category: FeatureCategory,
    /// Brief description of the column
    pub description: &'static str,
    /// Whether the column is part of the model feature list
    pub model_input: bool,
}

/// Get all derived feature info, in model column order first
pub fn available_features() -> Vec<FeatureInfo> {
    vec![
        FeatureInfo {
            name: "Promo_Flag",
            category: FeatureCategory::Promotion,
            description: "1 when a promotion runs for the SKU on the date, else 0",
            model_input: true,
        },
        // Calendar
        FeatureInfo {
            name: "dayofweek",
            category: FeatureCategory::Calendar,
            description: "Day of week, 0 = Monday",
            model_input: true,
        },
        FeatureInfo {
            name: "weekofyear",
            category: FeatureCategory::Calendar,
            description: "ISO week number",
            model_input: true,
        },
        FeatureInfo {
            name: "month",
            category: FeatureCategory::Calendar,
            description: "Month of year, 1-12",
            model_input: true,
        },
        FeatureInfo {
            name: "quarter",
            category: FeatureCategory::Calendar,
            description: "Quarter of year, 1-4",
            model_input: true,
        },
        // Lags
        FeatureInfo {
            name: "lag_1",
            category: FeatureCategory::Lag,
            description: "Target one observation earlier in the group",
            model_input: true,
        },
        FeatureInfo {
            name: "lag_7",
            category: FeatureCategory::Lag,
            description: "Target seven observations earlier in the group",
            model_input: true,
        },
        FeatureInfo {
            name: "lag_14",
            category: FeatureCategory::Lag,
            description: "Target fourteen observations earlier in the group",
            model_input: true,
        },
        // Rolling
        FeatureInfo {
            name: "roll_mean_7",
            category: FeatureCategory::Rolling,
            description: "Mean of the previous 7 targets (min 3 observations)",
            model_input: true,
        },
        FeatureInfo {
            name: "roll_std_7",
            category: FeatureCategory::Rolling,
            description: "Sample std of the previous 7 targets (min 3 observations)",
            model_input: true,
        },
        FeatureInfo {
            name: "roll_mean_28",
            category: FeatureCategory::Rolling,
            description: "Mean of the previous 28 targets (min 14 observations)",
            model_input: true,
        },
        FeatureInfo {
            name: "roll_std_28",
            category: FeatureCategory::Rolling,
            description: "Sample std of the previous 28 targets (min 14 observations)",
            model_input: true,
        },
        // External
        FeatureInfo {
            name: "Holiday_Flag",
            category: FeatureCategory::External,
            description: "1 when the date is in the holiday calendar",
            model_input: false,
        },
        FeatureInfo {
            name: "temp_avg",
            category: FeatureCategory::External,
            description: "Mean of daily max and min temperature",
            model_input: false,
        },
        FeatureInfo {
            name: "is_rain",
            category: FeatureCategory::External,
            description: "Precipitation above 0.5 mm",
            model_input: false,
        },
        FeatureInfo {
            name: "is_cold",
            category: FeatureCategory::External,
            description: "Average temperature below 10 C",
            model_input: false,
        },
        FeatureInfo {
            name: "is_hot",
            category: FeatureCategory::External,
            description: "Average temperature above 30 C",
            model_input: false,
        },
    ]
}

/// Ordered list of columns a model is trained on
pub fn model_feature_names() -> Vec<&'static str> {
    available_features()
        .into_iter()
        .filter(|f| f.model_input)
        .map(|f| f.name)
        .collect()
}
