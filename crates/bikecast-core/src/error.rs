//! Time series error types
//!
//! Defines the error type shared by every statistical operation in bikecast.

use thiserror::Error;

/// Result type alias for time series operations
pub type Result<T> = std::result::Result<T, TsError>;

/// Errors that can occur during time series operations
#[derive(Error, Debug)]
pub enum TsError {
    /// Insufficient data points for the operation
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Model has not been fitted yet
    #[error("Model must be fitted before prediction")]
    NotFitted,

    /// Optimizer produced no usable estimate
    #[error("Optimization failed to converge after {iterations} iterations")]
    ConvergenceFailure { iterations: usize },

    /// Numerical computation error
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Invalid time series data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Reading input failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV input
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl TsError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        TsError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_insufficient_data_error_message() {
        let error = TsError::InsufficientData {
            required: 100,
            actual: 10,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient data: need at least 100 points, got 10"
        );
    }

    #[test]
    fn test_invalid_parameter_helper() {
        let error = TsError::invalid_parameter("order", "must be positive");
        assert_eq!(error.to_string(), "Invalid parameter 'order': must be positive");
    }

    #[test]
    fn test_convergence_failure_message() {
        let error = TsError::ConvergenceFailure { iterations: 500 };
        assert_eq!(
            error.to_string(),
            "Optimization failed to converge after 500 iterations"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "day.csv");
        let error = TsError::from(io);
        assert!(error.to_string().contains("day.csv"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TsError>();
    }
}
