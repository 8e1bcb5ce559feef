//! Model identification and residual diagnostics
//!
//! Correlograms for choosing AR/MA orders, portmanteau tests for residual
//! whiteness, and unit-root/stationarity tests for choosing the degree of
//! differencing.

pub mod autocorrelation;
pub mod stationarity;

pub use autocorrelation::{acf, ljung_box, pacf, Correlogram, PortmanteauTest};
pub use stationarity::{adf_test, kpss_test, ndiffs, AdfTest, KpssTest};
