//! Seasonality detection

use bikecast_core::diagnostics::acf;
use bikecast_core::{Result, TsError};

use crate::decomposition::{seasonal_strength, stl, SeasonalWindow, StlConfig};

/// Seasonal strength above which one seasonal difference is taken
pub const SEASONAL_STRENGTH_THRESHOLD: f64 = 0.64;

/// Detect seasonality period using autocorrelation
///
/// Returns the lag in `2..=max_period` with the largest autocorrelation
/// peak above 0.3, or `None` when no lag qualifies.
pub fn detect_seasonality(data: &[f64], max_period: usize) -> Option<usize> {
    if data.len() < max_period * 2 || max_period < 2 {
        return None;
    }

    let r = acf(data, max_period.min(data.len() / 2) + 1);
    if r.iter().skip(1).any(|v| v.is_nan()) {
        return None;
    }

    let mut best_period = 0;
    let mut best_acf = 0.3;

    for lag in 2..r.len().saturating_sub(1) {
        let is_peak = r[lag] > r[lag - 1] && r[lag] >= r[lag + 1];
        if is_peak && r[lag] > best_acf {
            best_acf = r[lag];
            best_period = lag;
        }
    }

    if best_period > 0 {
        tracing::debug!(period = best_period, acf = best_acf, "detected seasonality");
        Some(best_period)
    } else {
        None
    }
}

/// Number of seasonal differences (0 or 1) from the STL seasonal strength
pub fn nsdiffs(data: &[f64], period: usize, threshold: f64) -> Result<usize> {
    if period < 2 {
        return Err(TsError::InvalidParameter {
            name: "period".to_string(),
            reason: "must be at least 2".to_string(),
        });
    }
    if data.len() < 2 * period {
        return Ok(0);
    }

    let config = StlConfig::new(period).with_seasonal_window(SeasonalWindow::Span(11));
    let strength = seasonal_strength(&stl(data, &config)?);
    tracing::debug!(period, strength, "seasonal strength");
    Ok(usize::from(strength > threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikecast_core::utils::testing::white_noise;

    #[test]
    fn test_detect_weekly_cycle() {
        let data: Vec<f64> = (0..140)
            .map(|t| 100.0 + 10.0 * (t as f64 * 2.0 * std::f64::consts::PI / 7.0).sin())
            .collect();
        assert_eq!(detect_seasonality(&data, 10), Some(7));
    }

    #[test]
    fn test_no_seasonality_in_short_or_flat_data() {
        assert_eq!(detect_seasonality(&[1.0; 10], 7), None);
        assert_eq!(detect_seasonality(&[2.0; 40], 7), None);
    }

    #[test]
    fn test_nsdiffs() {
        let pattern = [6.0, -2.0, 3.0, -5.0, 1.0, -4.0, 1.0];
        let seasonal: Vec<f64> = (0..140)
            .map(|t| 40.0 + 0.1 * t as f64 + pattern[t % 7])
            .collect();
        assert_eq!(nsdiffs(&seasonal, 7, SEASONAL_STRENGTH_THRESHOLD).unwrap(), 1);

        let noise = white_noise(140, 12);
        let trend: Vec<f64> = (0..140).map(|t| 40.0 + 0.1 * t as f64 + 0.6 * noise[t]).collect();
        assert_eq!(nsdiffs(&trend, 7, SEASONAL_STRENGTH_THRESHOLD).unwrap(), 0);

        assert_eq!(nsdiffs(&seasonal[..10], 7, 0.64).unwrap(), 0);
        assert!(nsdiffs(&seasonal, 1, 0.64).is_err());
    }
}
