//! Time series prediction algorithms
//!
//! Seasonal ARIMA estimated by conditional sum of squares, and moving
//! averages for smoothing and baseline forecasts.

pub mod arima;
pub mod moving_average;

/// Common trait for all time series predictors
pub trait Predictor {
    /// Fit the model to historical data
    fn fit(&mut self, data: &[f64]) -> crate::Result<()>;

    /// Predict future values
    fn predict(&self, steps: usize) -> crate::Result<Vec<f64>>;

    /// Check if the model has been fitted
    fn is_fitted(&self) -> bool;
}
