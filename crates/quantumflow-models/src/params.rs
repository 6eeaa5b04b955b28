//! Boosting hyperparameters and loss objectives

use crate::error::{ModelError, Result};
use serde::{Deserialize, Serialize};

/// Loss minimised by a boosted ensemble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Objective {
    /// Mean squared error
    SquaredError,
    /// Pinball loss for the `alpha` quantile
    Quantile {
        /// Quantile level in (0, 1)
        alpha: f64,
    },
}

impl Objective {
    /// Validate the objective parameters
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::SquaredError => Ok(()),
            Self::Quantile { alpha } if alpha > 0.0 && alpha < 1.0 => Ok(()),
            Self::Quantile { alpha } => Err(ModelError::InvalidParameter(format!(
                "quantile alpha {alpha} must be in (0, 1)"
            ))),
        }
    }

    /// First-order gradient of the loss with respect to the prediction
    pub fn gradient(&self, target: f64, prediction: f64) -> f64 {
        match *self {
            Self::SquaredError => prediction - target,
            Self::Quantile { alpha } => {
                if target > prediction {
                    -alpha
                } else {
                    1.0 - alpha
                }
            }
        }
    }

    /// Second-order gradient (constant 1 for both losses)
    pub const fn hessian(&self) -> f64 {
        1.0
    }

    /// Constant prediction minimising the loss over `target`
    pub fn initial_prediction(&self, target: &[f64]) -> f64 {
        match *self {
            Self::SquaredError => {
                if target.is_empty() {
                    0.0
                } else {
                    target.iter().sum::<f64>() / target.len() as f64
                }
            }
            Self::Quantile { alpha } => quantile_of(target.to_vec(), alpha),
        }
    }
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SquaredError => write!(f, "squared_error"),
            Self::Quantile { alpha } => write!(f, "quantile(alpha={alpha})"),
        }
    }
}

/// Empirical `alpha` quantile with linear interpolation (0 for empty input)
pub fn quantile_of(mut values: Vec<f64>, alpha: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let position = alpha.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    values[lower] * (1.0 - weight) + values[upper] * weight
}

/// Hyperparameters shared by the boosted-tree backends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterParams {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to each tree
    pub learning_rate: f64,
    /// Maximum tree depth (`None` = limited by `max_leaves` only)
    pub max_depth: Option<usize>,
    /// Maximum leaves per tree
    pub max_leaves: usize,
    /// Minimum training rows per leaf
    pub min_samples_leaf: usize,
    /// Fraction of rows sampled per tree
    pub subsample: f64,
    /// Fraction of features sampled per tree
    pub colsample_bytree: f64,
    /// L2 regularisation on leaf weights
    pub lambda: f64,
    /// Maximum histogram bins per feature
    pub max_bins: usize,
    /// Seed for row and feature sampling
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: Some(6),
            max_leaves: 31,
            min_samples_leaf: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            lambda: 0.0,
            max_bins: 255,
            seed: 0,
        }
    }
}

impl BoosterParams {
    /// Validate parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ModelError::InvalidParameter(format!(
                "learning_rate {} must be in (0, 1]",
                self.learning_rate
            )));
        }
        if self.max_depth == Some(0) || self.max_leaves < 2 {
            return Err(ModelError::InvalidParameter(
                "trees need max_depth >= 1 and max_leaves >= 2".to_string(),
            ));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParameter(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("subsample", self.subsample),
            ("colsample_bytree", self.colsample_bytree),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ModelError::InvalidParameter(format!(
                    "{name} {value} must be in (0, 1]"
                )));
            }
        }
        if self.lambda < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "lambda {} must be non-negative",
                self.lambda
            )));
        }
        if !(2..=u16::MAX as usize).contains(&self.max_bins) {
            return Err(ModelError::InvalidParameter(format!(
                "max_bins {} out of range",
                self.max_bins
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_default_params_valid() {
        BoosterParams::default().validate().unwrap();
    }

    #[rstest]
    #[case(BoosterParams { n_estimators: 0, ..Default::default() })]
    #[case(BoosterParams { learning_rate: 0.0, ..Default::default() })]
    #[case(BoosterParams { subsample: 1.5, ..Default::default() })]
    #[case(BoosterParams { colsample_bytree: 0.0, ..Default::default() })]
    #[case(BoosterParams { max_depth: Some(0), ..Default::default() })]
    #[case(BoosterParams { lambda: -1.0, ..Default::default() })]
    #[case(BoosterParams { max_bins: 1, ..Default::default() })]
    fn test_invalid_params(#[case] params: BoosterParams) {
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_quantile_gradient() {
        let objective = Objective::Quantile { alpha: 0.9 };
        assert_relative_eq!(objective.gradient(10.0, 5.0), -0.9);
        assert_relative_eq!(objective.gradient(5.0, 10.0), 0.1);
    }

    #[test]
    fn test_squared_gradient() {
        assert_relative_eq!(Objective::SquaredError.gradient(3.0, 5.0), 2.0);
    }

    #[test]
    fn test_initial_prediction() {
        let target = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(Objective::SquaredError.initial_prediction(&target), 3.0);
        assert_relative_eq!(
            Objective::Quantile { alpha: 0.5 }.initial_prediction(&target),
            3.0
        );
        assert_relative_eq!(
            Objective::Quantile { alpha: 0.75 }.initial_prediction(&target),
            4.0
        );
    }

    #[test]
    fn test_invalid_alpha() {
        assert!(Objective::Quantile { alpha: 1.0 }.validate().is_err());
        assert!(Objective::Quantile { alpha: 0.95 }.validate().is_ok());
    }

    #[test]
    fn test_quantile_interpolation() {
        assert_relative_eq!(quantile_of(vec![0.0, 10.0], 0.25), 2.5);
        assert_relative_eq!(quantile_of(Vec::new(), 0.5), 0.0);
    }
}
