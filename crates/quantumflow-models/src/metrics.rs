//! Forecast error metrics

use crate::error::{ModelError, Result};
use ndarray::ArrayView1;

fn check_lengths(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(ModelError::DimensionMismatch {
            expected: actual.len(),
            actual: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(ModelError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    Ok(())
}

/// Root mean squared error
pub fn rmse(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let mse = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    Ok(mse.sqrt())
}

/// Mean absolute error
pub fn mae(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> Result<f64> {
    check_lengths(actual, predicted)?;
    Ok(actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_rmse() {
        let actual = array![1.0, 2.0, 3.0, 4.0];
        let predicted = array![1.0, 2.0, 3.0, 6.0];
        // sqrt(4 / 4)
        assert_relative_eq!(rmse(actual.view(), predicted.view()).unwrap(), 1.0);
    }

    #[test]
    fn test_mae() {
        let actual = array![1.0, 2.0, 3.0];
        let predicted = array![2.0, 2.0, 0.0];
        assert_relative_eq!(mae(actual.view(), predicted.view()).unwrap(), 4.0 / 3.0);
    }

    #[test]
    fn test_length_mismatch() {
        let actual = array![1.0, 2.0];
        let predicted = array![1.0];
        assert!(matches!(
            rmse(actual.view(), predicted.view()),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        let empty = ndarray::Array1::<f64>::zeros(0);
        assert!(mae(empty.view(), empty.view()).is_err());
    }
}
