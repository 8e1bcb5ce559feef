//! Daily series loading
//!
//! Reads a CSV of date/count records into a gap-free daily series.

mod series;

pub use series::{CsvSpec, DailySeries, Observation};
