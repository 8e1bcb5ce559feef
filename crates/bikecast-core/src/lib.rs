//! # bikecast-core
//!
//! Statistical building blocks for forecasting daily demand series.
//!
//! ## Contents
//!
//! - **data**: date-indexed daily series loaded from CSV
//! - **algorithms**: seasonal ARIMA and moving averages
//! - **diagnostics**: ACF/PACF, Ljung-Box, ADF and KPSS tests
//! - **utils**: outlier cleaning, differencing, optimization, accuracy metrics
//!
//! ## Example
//!
//! ```rust
//! use bikecast_core::prelude::*;
//!
//! let data: Vec<f64> = (1..=40).map(|x| x as f64 + (x as f64).sin()).collect();
//! let mut arima = Arima::new(1, 1, 0).unwrap();
//! arima.fit(&data).unwrap();
//! let forecast = arima.forecast(3, &[0.95]).unwrap();
//! assert_eq!(forecast.mean.len(), 3);
//! ```

pub mod algorithms;
pub mod data;
pub mod diagnostics;
pub mod utils;
mod error;

pub use error::{Result, TsError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithms::arima::{
        Arima, ArimaOrder, ArimaSpec, FitSummary, Forecast, PredictionInterval, SeasonalOrder,
    };
    pub use crate::algorithms::moving_average::{centered_moving_average, SimpleMovingAverage};
    pub use crate::algorithms::Predictor;
    pub use crate::data::{CsvSpec, DailySeries, Observation};
    pub use crate::diagnostics::{
        adf_test, kpss_test, ljung_box, ndiffs, AdfTest, Correlogram, KpssTest, PortmanteauTest,
    };
    pub use crate::error::{Result, TsError};
    pub use crate::utils::metrics::Accuracy;
    pub use crate::utils::preprocessing::{clean_outliers, CleanConfig, CleanResult};
}
