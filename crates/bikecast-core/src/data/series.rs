//! Calendar-indexed daily series

use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Range;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TsError};

/// A single dated observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Which CSV columns hold the date and the count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvSpec {
    /// Column name, or zero-based index, of the date column
    pub date_column: String,
    /// Column name, or zero-based index, of the value column
    pub value_column: String,
    /// `chrono` format string for the date column
    pub date_format: String,
}

impl Default for CsvSpec {
    fn default() -> Self {
        Self {
            date_column: "dteday".to_string(),
            value_column: "cnt".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl CsvSpec {
    fn resolve(headers: &csv::StringRecord, column: &str) -> Result<usize> {
        if let Some(idx) = headers.iter().position(|h| h.trim() == column) {
            return Ok(idx);
        }
        match column.parse::<usize>() {
            Ok(idx) if idx < headers.len() => Ok(idx),
            _ => Err(TsError::InvalidData(format!(
                "Header row: column '{}' not found among [{}]",
                column,
                headers.iter().collect::<Vec<_>>().join(", ")
            ))),
        }
    }
}

/// One value per calendar day, starting at `start`.
///
/// Days without an observation hold `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl DailySeries {
    /// Build a series from contiguous daily values
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Self {
        Self { start, values }
    }

    /// Build a series from unordered observations.
    ///
    /// Calendar gaps are filled with `NaN`; duplicate dates are rejected.
    pub fn from_observations(mut observations: Vec<Observation>) -> Result<Self> {
        if observations.is_empty() {
            return Err(TsError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        observations.sort_by_key(|o| o.date);
        if let Some(pair) = observations.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(TsError::InvalidData(format!(
                "Duplicate observation for {}",
                pair[0].date
            )));
        }

        let start = observations[0].date;
        let end = observations[observations.len() - 1].date;
        let days = (end - start).num_days() as usize + 1;
        let mut values = vec![f64::NAN; days];
        for obs in &observations {
            values[(obs.date - start).num_days() as usize] = obs.value;
        }

        let gaps = days - observations.len();
        if gaps > 0 {
            tracing::warn!(gaps, "calendar gaps filled with missing values");
        }

        Ok(Self { start, values })
    }

    /// Read a series from any CSV source
    pub fn from_csv_reader<R: Read>(reader: R, spec: &CsvSpec) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers()?.clone();
        let date_idx = CsvSpec::resolve(&headers, &spec.date_column)?;
        let value_idx = CsvSpec::resolve(&headers, &spec.value_column)?;

        let mut observations = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let cell = |idx: usize, column: &str| {
                record.get(idx).map(str::trim).ok_or_else(|| {
                    TsError::InvalidData(format!(
                        "Row {}: missing column '{}' ({} fields)",
                        row + 1,
                        column,
                        record.len()
                    ))
                })
            };
            let raw_date = cell(date_idx, &spec.date_column)?;
            let date = NaiveDate::parse_from_str(raw_date, &spec.date_format).map_err(|e| {
                TsError::InvalidData(format!("Row {}: bad date '{}': {}", row + 1, raw_date, e))
            })?;

            let raw_value = cell(value_idx, &spec.value_column)?;
            let value = if raw_value.is_empty() || raw_value.eq_ignore_ascii_case("na") {
                f64::NAN
            } else {
                raw_value.parse::<f64>().map_err(|_| {
                    TsError::InvalidData(format!("Row {}: bad value '{}'", row + 1, raw_value))
                })?
            };
            observations.push(Observation::new(date, value));
        }

        let series = Self::from_observations(observations)?;
        tracing::debug!(
            start = %series.start,
            days = series.len(),
            missing = series.missing_count(),
            "loaded daily series"
        );
        Ok(series)
    }

    /// Read a series from a CSV file on disk
    pub fn from_csv_path(path: impl AsRef<Path>, spec: &CsvSpec) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_csv_reader(BufReader::new(file), spec)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last calendar day covered by the series
    pub fn end(&self) -> NaiveDate {
        self.date_at(self.values.len().saturating_sub(1))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Date of the value at `index`
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::days(index as i64)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.values.len()).map(move |i| self.date_at(i))
    }

    /// Number of days without an observation
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Sub-series over `range`, keeping calendar alignment
    pub fn slice(&self, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > self.values.len() {
            return Err(TsError::invalid_parameter(
                "range",
                format!("{:?} outside series of length {}", range, self.values.len()),
            ));
        }
        Ok(Self {
            start: self.date_at(range.start),
            values: self.values[range].to_vec(),
        })
    }

    /// Same calendar index with new values
    pub fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        if values.len() != self.values.len() {
            return Err(TsError::InvalidData(format!(
                "expected {} values, got {}",
                self.values.len(),
                values.len()
            )));
        }
        Ok(Self {
            start: self.start,
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_observations_sorts_and_fills_gaps() {
        let obs = vec![
            Observation::new(date(2011, 1, 3), 30.0),
            Observation::new(date(2011, 1, 1), 10.0),
            Observation::new(date(2011, 1, 5), 50.0),
        ];
        let series = DailySeries::from_observations(obs).unwrap();

        assert_eq!(series.start(), date(2011, 1, 1));
        assert_eq!(series.end(), date(2011, 1, 5));
        assert_eq!(series.len(), 5);
        assert_eq!(series.values()[0], 10.0);
        assert!(series.values()[1].is_nan());
        assert_eq!(series.values()[2], 30.0);
        assert_eq!(series.missing_count(), 2);
    }

    #[test]
    fn test_duplicate_dates_rejected() {
        let obs = vec![
            Observation::new(date(2011, 1, 1), 10.0),
            Observation::new(date(2011, 1, 1), 11.0),
        ];
        let err = DailySeries::from_observations(obs).unwrap_err();
        assert!(matches!(err, TsError::InvalidData(_)));
    }

    #[test]
    fn test_empty_observations_rejected() {
        let err = DailySeries::from_observations(Vec::new()).unwrap_err();
        assert!(matches!(err, TsError::InsufficientData { .. }));
    }

    #[test]
    fn test_csv_reader_by_name() {
        let csv = "instant,dteday,cnt\n1,2011-01-01,985\n2,2011-01-02,801\n3,2011-01-03,1349\n";
        let series = DailySeries::from_csv_reader(csv.as_bytes(), &CsvSpec::default()).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.values(), &[985.0, 801.0, 1349.0]);
        assert_eq!(series.start(), date(2011, 1, 1));
    }

    #[test]
    fn test_csv_reader_by_index_and_missing_cell() {
        let csv = "d,v\n2020-03-01,1\n2020-03-02,\n2020-03-03,3\n";
        let spec = CsvSpec {
            date_column: "0".to_string(),
            value_column: "1".to_string(),
            ..CsvSpec::default()
        };
        let series = DailySeries::from_csv_reader(csv.as_bytes(), &spec).unwrap();

        assert_eq!(series.len(), 3);
        assert!(series.values()[1].is_nan());
    }

    #[test]
    fn test_csv_reader_unknown_column() {
        let csv = "date,count\n2020-03-01,1\n";
        let err = DailySeries::from_csv_reader(csv.as_bytes(), &CsvSpec::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Header row"));
        assert!(message.contains("dteday"));
        assert!(message.contains("date, count"));
    }

    #[test]
    fn test_csv_reader_short_row_names_row() {
        let csv = "dteday,cnt\n2020-03-01,1\n2020-03-02,2\n2020-03-03\n";
        let err = DailySeries::from_csv_reader(csv.as_bytes(), &CsvSpec::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Row 3"), "{}", message);
        assert!(message.contains("'cnt'"));
    }

    #[test]
    fn test_csv_reader_bad_date_names_row() {
        let csv = "dteday,cnt\n2020-03-01,1\n03/02/2020,2\n";
        let err = DailySeries::from_csv_reader(csv.as_bytes(), &CsvSpec::default()).unwrap_err();
        assert!(err.to_string().contains("Row 2"));
    }

    #[test]
    fn test_slice_keeps_calendar() {
        let series = DailySeries::new(date(2012, 2, 27), vec![1.0, 2.0, 3.0, 4.0]);
        let tail = series.slice(2..4).unwrap();

        assert_eq!(tail.start(), date(2012, 2, 29));
        assert_eq!(tail.values(), &[3.0, 4.0]);
        assert!(series.slice(3..5).is_err());
    }
}
