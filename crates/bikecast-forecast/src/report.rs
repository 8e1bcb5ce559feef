//! Analysis output: per-day table, forecast table and JSON summary

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use bikecast_core::algorithms::arima::{ArimaSpec, FitSummary, Forecast};
use bikecast_core::diagnostics::{AdfTest, Correlogram, PortmanteauTest};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::confidence::ForecastWithConfidence;
use crate::decomposition::DecompositionMethod;
use crate::evaluation::HoldoutEvaluation;

/// Turn `NaN` into an empty cell
pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// One calendar day with every intermediate series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedRow {
    pub date: NaiveDate,
    pub count: Option<f64>,
    pub clean_count: Option<f64>,
    pub ma_weekly: Option<f64>,
    pub ma_monthly: Option<f64>,
    pub seasonal: Option<f64>,
    pub deseasonal: Option<f64>,
    /// In-sample residual of the forecasting model
    pub residual: Option<f64>,
}

/// Bounds at one confidence level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bound {
    /// Level in percent
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
}

/// One forecast day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub date: NaiveDate,
    pub mean: f64,
    pub se: f64,
    pub bounds: Vec<Bound>,
}

impl ForecastRow {
    /// Date the forecast rows starting the day after `last`
    pub fn from_forecast(forecast: &Forecast, last: NaiveDate) -> Vec<Self> {
        let intervals = ForecastWithConfidence::levels(forecast);
        (0..forecast.mean.len())
            .map(|h| ForecastRow {
                date: last + Duration::days(h as i64 + 1),
                mean: forecast.mean[h],
                se: forecast.se[h],
                bounds: intervals
                    .iter()
                    .map(|ci| Bound {
                        level: ci.level * 100.0,
                        lower: ci.lower[h],
                        upper: ci.upper[h],
                    })
                    .collect(),
            })
            .collect()
    }
}

/// Outcome of the cleaning step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningSummary {
    pub missing: Vec<NaiveDate>,
    pub outliers: Vec<NaiveDate>,
}

/// Outcome of the STL step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecompositionSummary {
    pub method: DecompositionMethod,
    pub period: usize,
    /// First date of the smoothed series that was decomposed
    pub start: NaiveDate,
    pub length: usize,
    pub seasonal_strength: f64,
    /// Strongest autocorrelation peak of the differenced clean counts
    pub detected_period: Option<usize>,
}

/// A fitted model with its residual diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub label: String,
    pub spec: ArimaSpec,
    pub summary: FitSummary,
    pub ljung_box: PortmanteauTest,
    pub residual_correlogram: Correlogram,
    /// Models tried by the automatic search; 0 for a manual order
    pub candidates: usize,
}

/// Forecast of one model
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub label: String,
    pub rows: Vec<ForecastRow>,
}

/// Everything the analysis produced
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub observations: usize,
    pub cleaning: CleaningSummary,
    pub decomposition: DecompositionSummary,
    /// ADF test of the weekly moving average
    pub adf_smoothed: AdfTest,
    /// ADF test of the differenced deseasonalized series
    pub adf_differenced: AdfTest,
    /// Correlogram of the differenced deseasonalized series
    pub correlogram: Correlogram,
    pub auto_model: ModelReport,
    pub manual_model: Option<ModelReport>,
    pub forecast: ForecastReport,
    pub holdout: Option<HoldoutEvaluation>,
    pub seasonal_model: Option<ModelReport>,
    pub seasonal_forecast: Option<ForecastReport>,
    #[serde(skip)]
    pub rows: Vec<AnnotatedRow>,
}

impl AnalysisReport {
    /// Write `annotated.csv`, `forecast.csv` and `report.json` into `dir`
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> io::Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        write_annotated_csv(&self.rows, BufWriter::new(File::create(dir.join("annotated.csv"))?))?;
        write_forecast_csv(
            &self.forecast.rows,
            BufWriter::new(File::create(dir.join("forecast.csv"))?),
        )?;
        let mut json = BufWriter::new(File::create(dir.join("report.json"))?);
        write_report_json(self, &mut json)?;
        json.flush()?;

        tracing::info!(dir = %dir.display(), "wrote analysis output");
        Ok(())
    }
}

/// Per-day table as CSV; missing values are empty cells
pub fn write_annotated_csv<W: Write>(rows: &[AnnotatedRow], writer: W) -> io::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()
}

/// Forecast table as CSV with `lo<level>`/`hi<level>` columns per interval
pub fn write_forecast_csv<W: Write>(rows: &[ForecastRow], writer: W) -> io::Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    let mut header = vec!["date".to_string(), "mean".to_string(), "se".to_string()];
    if let Some(first) = rows.first() {
        for bound in &first.bounds {
            header.push(format!("lo{}", bound.level));
            header.push(format!("hi{}", bound.level));
        }
    }
    out.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.date.format("%Y-%m-%d").to_string(),
            row.mean.to_string(),
            row.se.to_string(),
        ];
        for bound in &row.bounds {
            record.push(bound.lower.to_string());
            record.push(bound.upper.to_string());
        }
        out.write_record(&record)?;
    }
    out.flush()
}

/// Report as pretty-printed JSON
pub fn write_report_json<W: Write>(report: &AnalysisReport, writer: W) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikecast_core::algorithms::arima::PredictionInterval;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2012, 12, d).unwrap()
    }

    fn sample_forecast() -> Forecast {
        Forecast {
            mean: vec![10.0, 11.0],
            se: vec![1.0, 2.0],
            intervals: vec![PredictionInterval {
                level: 0.8,
                lower: vec![8.718, 8.437],
                upper: vec![11.282, 13.563],
            }],
        }
    }

    #[test]
    fn test_forecast_rows_are_dated_after_last() {
        let rows = ForecastRow::from_forecast(&sample_forecast(), day(30));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, day(31));
        assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2013, 1, 1).unwrap());
        assert_eq!(rows[1].bounds[0].level, 80.0);
    }

    #[test]
    fn test_forecast_csv_layout() {
        let rows = ForecastRow::from_forecast(&sample_forecast(), day(1));
        let mut buf = Vec::new();
        write_forecast_csv(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("date,mean,se,lo80,hi80"));
        let first: Vec<f64> = lines
            .next()
            .unwrap()
            .split(',')
            .skip(1)
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(&first[..2], &[10.0, 1.0]);
        assert!((first[2] - 8.7184).abs() < 1e-4);
        assert!((first[3] - 11.2816).abs() < 1e-4);
    }

    #[test]
    fn test_annotated_csv_leaves_missing_cells_empty() {
        let rows = vec![AnnotatedRow {
            date: day(5),
            count: Some(120.0),
            clean_count: Some(120.0),
            ma_weekly: finite(f64::NAN),
            ma_monthly: None,
            seasonal: None,
            deseasonal: None,
            residual: None,
        }];
        let mut buf = Vec::new();
        write_annotated_csv(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("date,count,clean_count,ma_weekly,ma_monthly,seasonal,deseasonal,residual")
        );
        assert_eq!(lines.next(), Some("2012-12-05,120.0,120.0,,,,,"));
    }
}
