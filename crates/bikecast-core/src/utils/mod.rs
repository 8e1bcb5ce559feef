//! Numerical helpers shared by the algorithms and diagnostics

pub mod distributions;
pub mod linalg;
pub mod metrics;
pub mod optimize;
pub mod preprocessing;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
