//! # bikecast-forecast
//!
//! Seasonal decomposition, automatic ARIMA selection, holdout evaluation
//! and the configurable end-to-end analysis built on `bikecast-core`.

mod config;
mod confidence;
mod decomposition;
mod evaluation;
mod pipeline;
mod report;
mod seasonality;
mod selection;

pub use config::*;
pub use confidence::*;
pub use decomposition::*;
pub use evaluation::*;
pub use pipeline::*;
pub use report::{
    write_annotated_csv, write_forecast_csv, write_report_json, AnalysisReport, AnnotatedRow,
    Bound, CleaningSummary, DecompositionSummary, ForecastReport, ForecastRow, ModelReport,
};
pub use seasonality::*;
pub use selection::*;
