//! Moving averages for smoothing and naive forecasting
//!
//! - **Centered moving average**: symmetric smoother used to expose the
//!   weekly and monthly level of a daily series
//! - **Simple Moving Average (SMA)**: trailing mean, usable as a baseline
//!   [`Predictor`]

use serde::{Deserialize, Serialize};

use crate::algorithms::Predictor;
use crate::error::{Result, TsError};

/// Weights of a centered moving average of `order`.
///
/// An odd order averages `order` points with equal weight. An even order
/// is a `2 x order` average: `order + 1` points, half weight at both ends.
pub fn centered_weights(order: usize) -> Vec<f64> {
    let k = order as f64;
    if order % 2 == 1 {
        vec![1.0 / k; order]
    } else {
        let mut w = vec![1.0 / k; order + 1];
        w[0] = 0.5 / k;
        w[order] = 0.5 / k;
        w
    }
}

/// Centered moving average of `order`, same length as `data`.
///
/// The first and last `order / 2` positions have no full window and are
/// `NaN`. Any `NaN` inside a window makes that output `NaN`.
///
/// ```rust
/// use bikecast_core::algorithms::moving_average::centered_moving_average;
///
/// let ma = centered_moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 3).unwrap();
/// assert!(ma[0].is_nan());
/// assert_eq!(ma[2], 3.0);
/// ```
pub fn centered_moving_average(data: &[f64], order: usize) -> Result<Vec<f64>> {
    if order == 0 {
        return Err(TsError::invalid_parameter("order", "must be at least 1"));
    }
    let weights = centered_weights(order);
    if data.len() < weights.len() {
        return Err(TsError::InsufficientData {
            required: weights.len(),
            actual: data.len(),
        });
    }

    let half = weights.len() / 2;
    let mut out = vec![f64::NAN; data.len()];
    for t in half..data.len() - half {
        out[t] = weights
            .iter()
            .zip(&data[t - half..=t + half])
            .map(|(w, x)| w * x)
            .sum();
    }
    Ok(out)
}

/// Simple Moving Average (SMA)
///
/// Computes the unweighted mean of the previous `window` observations.
///
/// # Example
///
/// ```rust
/// use bikecast_core::algorithms::moving_average::SimpleMovingAverage;
/// use bikecast_core::algorithms::Predictor;
///
/// let data = vec![10.0, 12.0, 11.0, 13.0, 15.0, 14.0, 16.0, 18.0];
/// let mut sma = SimpleMovingAverage::new(3).unwrap();
/// sma.fit(&data).unwrap();
///
/// let forecast = sma.predict(3).unwrap();
/// assert_eq!(forecast, vec![16.0; 3]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleMovingAverage {
    /// Window size for averaging
    window: usize,
    /// Smoothed values after fitting
    smoothed: Vec<f64>,
    fitted: bool,
}

impl SimpleMovingAverage {
    /// Create a new SMA with specified window size
    ///
    /// # Arguments
    ///
    /// * `window` - Number of observations to average (must be >= 2)
    pub fn new(window: usize) -> Result<Self> {
        if window < 2 {
            return Err(TsError::invalid_parameter("window", "must be at least 2"));
        }

        Ok(Self {
            window,
            smoothed: Vec::new(),
            fitted: false,
        })
    }

    /// Get the smoothed time series
    pub fn smoothed_values(&self) -> &[f64] {
        &self.smoothed
    }

    pub fn window_size(&self) -> usize {
        self.window
    }

    /// Trailing averages; the first entry covers `data[..window]`
    pub fn compute(data: &[f64], window: usize) -> Vec<f64> {
        if window == 0 || data.len() < window {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(data.len() - window + 1);

        let mut sum: f64 = data[..window].iter().sum();
        result.push(sum / window as f64);

        // Sliding window
        for i in window..data.len() {
            sum = sum - data[i - window] + data[i];
            result.push(sum / window as f64);
        }

        result
    }
}

impl Predictor for SimpleMovingAverage {
    fn fit(&mut self, data: &[f64]) -> Result<()> {
        if data.len() < self.window {
            return Err(TsError::InsufficientData {
                required: self.window,
                actual: data.len(),
            });
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(TsError::InvalidData(
                "Data contains NaN or infinite values".to_string(),
            ));
        }

        self.smoothed = Self::compute(data, self.window);
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, steps: usize) -> Result<Vec<f64>> {
        match self.smoothed.last() {
            Some(last) if self.fitted => Ok(vec![*last; steps]),
            _ => Err(TsError::NotFitted),
        }
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_weights() {
        assert_eq!(centered_weights(1), vec![1.0]);
        let w = centered_weights(4);
        assert_eq!(w, vec![0.125, 0.25, 0.25, 0.25, 0.125]);
        assert!((centered_weights(30).iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(centered_weights(30).len(), 31);
    }

    #[test]
    fn test_weekly_average_edges() {
        let data: Vec<f64> = (0..20).map(|x| x as f64).collect();
        let ma = centered_moving_average(&data, 7).unwrap();

        assert_eq!(ma.len(), 20);
        assert!(ma[..3].iter().all(|v| v.is_nan()));
        assert!(ma[17..].iter().all(|v| v.is_nan()));
        // a linear series is reproduced exactly
        for t in 3..17 {
            assert!((ma[t] - t as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_even_order_removes_matching_cycle() {
        let data: Vec<f64> = (0..40)
            .map(|t| 50.0 + if t % 2 == 0 { 5.0 } else { -5.0 })
            .collect();
        let ma = centered_moving_average(&data, 2).unwrap();
        assert!(ma[0].is_nan());
        assert!(ma[39].is_nan());
        for v in &ma[1..39] {
            assert!((v - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_monthly_average_nan_span() {
        let data = vec![1.0; 100];
        let ma = centered_moving_average(&data, 30).unwrap();
        assert_eq!(ma.iter().filter(|v| v.is_nan()).count(), 30);
        assert!((ma[15] - 1.0).abs() < 1e-12);
        assert!(ma[14].is_nan());
    }

    #[test]
    fn test_nan_propagates_through_window() {
        let mut data = vec![2.0; 15];
        data[7] = f64::NAN;
        let ma = centered_moving_average(&data, 3).unwrap();
        assert!(ma[6].is_nan() && ma[7].is_nan() && ma[8].is_nan());
        assert_eq!(ma[5], 2.0);
        assert_eq!(ma[9], 2.0);
    }

    #[test]
    fn test_centered_invalid() {
        assert!(centered_moving_average(&[1.0, 2.0], 0).is_err());
        assert!(matches!(
            centered_moving_average(&[1.0; 5], 6),
            Err(TsError::InsufficientData {
                required: 7,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let mut sma = SimpleMovingAverage::new(3).unwrap();
        sma.fit(&data).unwrap();

        let smoothed = sma.smoothed_values();
        assert_eq!(smoothed.len(), 3);
        assert!((smoothed[0] - 2.0).abs() < 1e-10);
        assert!((smoothed[1] - 3.0).abs() < 1e-10);
        assert!((smoothed[2] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_sma_predict() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let mut sma = SimpleMovingAverage::new(3).unwrap();
        sma.fit(&data).unwrap();

        let forecast = sma.predict(3).unwrap();
        assert_eq!(forecast.len(), 3);
        assert!(forecast.iter().all(|&f| (f - 4.0).abs() < 1e-10));
    }

    #[test]
    fn test_sma_errors() {
        assert!(SimpleMovingAverage::new(1).is_err());
        let sma = SimpleMovingAverage::new(3).unwrap();
        assert!(matches!(sma.predict(1), Err(TsError::NotFitted)));
    }
}
