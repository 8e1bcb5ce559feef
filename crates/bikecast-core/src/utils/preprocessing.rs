//! Data preprocessing utilities for time series
//!
//! Differencing, gap interpolation and outlier cleaning.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TsError};

/// Compute differences of the given order
pub fn difference(data: &[f64], order: usize) -> Vec<f64> {
    let mut result = data.to_vec();
    for _ in 0..order {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Compute seasonal differences
pub fn seasonal_difference(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() <= period {
        return Vec::new();
    }

    data.iter()
        .skip(period)
        .zip(data.iter())
        .map(|(curr, prev)| curr - prev)
        .collect()
}

/// Interpolate missing values (marked as NaN)
///
/// Leading and trailing gaps take the nearest observed value.
pub fn interpolate_linear(data: &[f64]) -> Vec<f64> {
    let mut result = data.to_vec();
    let n = result.len();

    for i in 0..n {
        if result[i].is_nan() {
            let prev_idx = (0..i).rev().find(|&j| !result[j].is_nan());
            let next_idx = ((i + 1)..n).find(|&j| !result[j].is_nan());

            result[i] = match (prev_idx, next_idx) {
                (Some(p), Some(n_idx)) => {
                    let ratio = (i - p) as f64 / (n_idx - p) as f64;
                    result[p] + ratio * (result[n_idx] - result[p])
                }
                (Some(p), None) => result[p],
                (None, Some(n_idx)) => result[n_idx],
                (None, None) => f64::NAN,
            };
        }
    }

    result
}

/// Sample quantile with linear interpolation between order statistics
///
/// `sorted` must be sorted ascending and non-empty.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn sorted_finite(data: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = data.iter().filter(|x| x.is_finite()).cloned().collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Detect outliers using IQR method
///
/// Returns indices of outlier points
pub fn detect_outliers_iqr(data: &[f64], multiplier: f64) -> Vec<usize> {
    let sorted = sorted_finite(data);
    if sorted.len() < 4 {
        return Vec::new();
    }

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;

    let lower_bound = q1 - multiplier * iqr;
    let upper_bound = q3 + multiplier * iqr;

    data.iter()
        .enumerate()
        .filter(|(_, x)| **x < lower_bound || **x > upper_bound)
        .map(|(i, _)| i)
        .collect()
}

/// Centered running median; the window shrinks at the edges
pub fn running_median(data: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    let n = data.len();
    let mut buf = Vec::with_capacity(window);

    (0..n)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(n);
            buf.clear();
            buf.extend_from_slice(&data[start..end]);
            buf.sort_by(|a, b| a.total_cmp(b));
            quantile(&buf, 0.5)
        })
        .collect()
}

/// Settings for outlier cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanConfig {
    /// Width of the running median used as baseline (odd)
    pub window: usize,
    /// Residuals beyond this many IQRs from the quartiles are outliers
    pub iqr_multiplier: f64,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            window: 7,
            iqr_multiplier: 3.0,
        }
    }
}

/// Output of [`clean_outliers`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanResult {
    pub values: Vec<f64>,
    /// Indices that were missing and got interpolated
    pub missing: Vec<usize>,
    /// Indices whose value was replaced as an outlier
    pub outliers: Vec<usize>,
}

/// Interpolate gaps, then replace points far from a running-median baseline.
pub fn clean_outliers(data: &[f64], config: &CleanConfig) -> Result<CleanResult> {
    if config.window == 0 || config.window % 2 == 0 {
        return Err(TsError::invalid_parameter("window", "must be odd and positive"));
    }
    if !(config.iqr_multiplier > 0.0) {
        return Err(TsError::invalid_parameter("iqr_multiplier", "must be positive"));
    }
    if data.iter().any(|x| x.is_infinite()) {
        return Err(TsError::InvalidData("Data contains infinite values".to_string()));
    }
    if !data.is_empty() && data.iter().all(|x| x.is_nan()) {
        return Err(TsError::InvalidData("Data contains no observations".to_string()));
    }

    let missing: Vec<usize> = (0..data.len()).filter(|&i| data[i].is_nan()).collect();
    let mut values = interpolate_linear(data);

    if values.len() < 4 {
        return Ok(CleanResult {
            values,
            missing,
            outliers: Vec::new(),
        });
    }

    let baseline = running_median(&values, config.window);
    let residuals: Vec<f64> = values.iter().zip(&baseline).map(|(v, b)| v - b).collect();
    let outliers = detect_outliers_iqr(&residuals, config.iqr_multiplier);

    if !outliers.is_empty() {
        for &i in &outliers {
            values[i] = f64::NAN;
        }
        values = interpolate_linear(&values);
    }

    tracing::debug!(
        missing = missing.len(),
        outliers = outliers.len(),
        "cleaned series"
    );

    Ok(CleanResult {
        values,
        missing,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference() {
        let data = vec![1.0, 3.0, 6.0, 10.0];
        let diff = difference(&data, 1);
        assert_eq!(diff, vec![2.0, 3.0, 4.0]);

        let diff2 = difference(&data, 2);
        assert_eq!(diff2, vec![1.0, 1.0]);

        assert!(difference(&[1.0], 1).is_empty());
    }

    #[test]
    fn test_seasonal_difference() {
        let data = vec![1.0, 2.0, 3.0, 11.0, 12.0, 13.0];
        assert_eq!(seasonal_difference(&data, 3), vec![10.0, 10.0, 10.0]);
        assert!(seasonal_difference(&data, 6).is_empty());
    }

    #[test]
    fn test_interpolate_linear() {
        let data = vec![f64::NAN, 1.0, f64::NAN, f64::NAN, 4.0, f64::NAN];
        let filled = interpolate_linear(&data);
        assert_eq!(filled, vec![1.0, 1.0, 2.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = vec![1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&sorted, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&sorted, 0.25) - 1.75).abs() < 1e-12);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
    }

    #[test]
    fn test_running_median_ignores_spike() {
        let data = vec![1.0, 1.0, 1.0, 50.0, 1.0, 1.0, 1.0];
        let med = running_median(&data, 3);
        assert!(med.iter().all(|&m| (m - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_clean_outliers_replaces_spike() {
        let mut data: Vec<f64> = (0..40).map(|i| 100.0 + (i % 7) as f64).collect();
        data[20] = 1000.0;
        data[30] = f64::NAN;

        let result = clean_outliers(&data, &CleanConfig::default()).unwrap();

        assert_eq!(result.outliers, vec![20]);
        assert_eq!(result.missing, vec![30]);
        assert!((result.values[20] - 102.5).abs() < 1e-9);
        assert!(result.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_clean_outliers_leaves_regular_series() {
        let data: Vec<f64> = (0..30).map(|i| 10.0 + (i as f64 * 0.9).sin()).collect();
        let result = clean_outliers(&data, &CleanConfig::default()).unwrap();
        assert!(result.outliers.is_empty());
        assert_eq!(result.values, data);
    }

    #[test]
    fn test_clean_outliers_rejects_even_window() {
        let config = CleanConfig {
            window: 6,
            ..CleanConfig::default()
        };
        assert!(clean_outliers(&[1.0, 2.0, 3.0, 4.0], &config).is_err());
    }

    #[test]
    fn test_clean_outliers_all_missing() {
        let err = clean_outliers(&[f64::NAN, f64::NAN], &CleanConfig::default()).unwrap_err();
        assert!(matches!(err, TsError::InvalidData(_)));
    }
}
