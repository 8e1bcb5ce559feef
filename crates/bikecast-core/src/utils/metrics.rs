//! Forecast accuracy metrics
//!
//! Provides standard metrics for evaluating time series forecasts. Every
//! function returns `NaN` when the inputs are empty or differ in length.

use serde::{Deserialize, Serialize};

fn paired(actual: &[f64], predicted: &[f64]) -> bool {
    actual.len() == predicted.len() && !actual.is_empty()
}

/// Mean Error (bias): average of `actual - predicted`
pub fn mean_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if !paired(actual, predicted) {
        return f64::NAN;
    }
    actual.iter().zip(predicted).map(|(a, p)| a - p).sum::<f64>() / actual.len() as f64
}

/// Mean Absolute Error (MAE)
///
/// Average of absolute differences between predictions and actual values.
/// Lower is better. Same scale as the data.
///
/// # Example
///
/// ```rust
/// use bikecast_core::utils::metrics::mae;
///
/// let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let predicted = vec![1.1, 2.2, 2.9, 4.1, 5.0];
/// let error = mae(&actual, &predicted);
/// assert!((error - 0.1).abs() < 1e-9);
/// ```
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if !paired(actual, predicted) {
        return f64::NAN;
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();

    sum / actual.len() as f64
}

/// Mean Squared Error (MSE)
///
/// Average of squared differences. Penalizes large errors more heavily.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if !paired(actual, predicted) {
        return f64::NAN;
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    sum / actual.len() as f64
}

/// Root Mean Squared Error (RMSE)
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// Mean Percentage Error, in percent. Zero actuals are skipped.
pub fn mpe(actual: &[f64], predicted: &[f64]) -> f64 {
    percentage_mean(actual, predicted, |a, p| (a - p) / a)
}

/// Mean Absolute Percentage Error, in percent. Zero actuals are skipped.
pub fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
    percentage_mean(actual, predicted, |a, p| ((a - p) / a).abs())
}

fn percentage_mean(actual: &[f64], predicted: &[f64], f: impl Fn(f64, f64) -> f64) -> f64 {
    if !paired(actual, predicted) {
        return f64::NAN;
    }
    let terms: Vec<f64> = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| a.abs() > 1e-10)
        .map(|(&a, &p)| f(a, p))
        .collect();
    if terms.is_empty() {
        return f64::NAN;
    }
    100.0 * terms.iter().sum::<f64>() / terms.len() as f64
}

/// Share of actual values that fall inside `[lower, upper]`
pub fn coverage(actual: &[f64], lower: &[f64], upper: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != lower.len() || actual.len() != upper.len() {
        return f64::NAN;
    }
    let inside = actual
        .iter()
        .zip(lower.iter().zip(upper))
        .filter(|(a, (l, u))| **a >= **l && **a <= **u)
        .count();
    inside as f64 / actual.len() as f64
}

/// Summary of forecast accuracy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub me: f64,
    pub rmse: f64,
    pub mae: f64,
    pub mpe: f64,
    pub mape: f64,
}

impl Accuracy {
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Self {
        Self {
            me: mean_error(actual, predicted),
            rmse: rmse(actual, predicted),
            mae: mae(actual, predicted),
            mpe: mpe(actual, predicted),
            mape: mape(actual, predicted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_metrics() {
        let actual = vec![10.0, 20.0, 30.0];
        let predicted = vec![12.0, 18.0, 30.0];

        assert!((mean_error(&actual, &predicted) - 0.0).abs() < 1e-12);
        assert!((mae(&actual, &predicted) - 4.0 / 3.0).abs() < 1e-12);
        assert!((mse(&actual, &predicted) - 8.0 / 3.0).abs() < 1e-12);
        assert!((rmse(&actual, &predicted) - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_percentage_metrics() {
        let actual = vec![100.0, 200.0];
        let predicted = vec![90.0, 220.0];

        assert!((mape(&actual, &predicted) - 10.0).abs() < 1e-9);
        assert!((mpe(&actual, &predicted) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentage_skips_zero_actuals() {
        let actual = vec![0.0, 50.0];
        let predicted = vec![5.0, 40.0];
        assert!((mape(&actual, &predicted) - 20.0).abs() < 1e-9);
        assert!(mape(&[0.0], &[1.0]).is_nan());
    }

    #[test]
    fn test_mismatched_lengths_are_nan() {
        assert!(mae(&[1.0, 2.0], &[1.0]).is_nan());
        assert!(rmse(&[], &[]).is_nan());
    }

    #[test]
    fn test_coverage() {
        let actual = vec![1.0, 5.0, 10.0, 3.0];
        let lower = vec![0.0, 0.0, 0.0, 0.0];
        let upper = vec![2.0, 6.0, 8.0, 4.0];
        assert!((coverage(&actual, &lower, &upper) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_accuracy_summary() {
        let acc = Accuracy::compute(&[10.0, 10.0], &[8.0, 12.0]);
        assert_eq!(acc.me, 0.0);
        assert_eq!(acc.mae, 2.0);
        assert_eq!(acc.rmse, 2.0);
        assert_eq!(acc.mape, 20.0);
    }
}
