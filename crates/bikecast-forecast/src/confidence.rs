//! Prediction intervals around a point forecast

use bikecast_core::algorithms::arima::Forecast;
use bikecast_core::utils::distributions::z_critical;
use bikecast_core::utils::metrics::coverage;
use serde::{Deserialize, Serialize};

/// Symmetric normal interval at one confidence level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastWithConfidence {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Fraction, e.g. 0.95
    pub level: f64,
}

impl ForecastWithConfidence {
    /// `mean ± z·se` for every step
    pub fn from_standard_errors(mean: Vec<f64>, se: &[f64], level: f64) -> Self {
        let z = z_critical(level);
        let (lower, upper) = mean
            .iter()
            .zip(se)
            .map(|(m, s)| (m - z * s, m + z * s))
            .unzip();
        Self {
            mean,
            lower,
            upper,
            level,
        }
    }

    /// Interval at `level` from the model's standard errors
    pub fn from_forecast(forecast: &Forecast, level: f64) -> Self {
        Self::from_standard_errors(forecast.mean.clone(), &forecast.se, level)
    }

    /// One interval per level the forecast was requested with
    pub fn levels(forecast: &Forecast) -> Vec<Self> {
        forecast
            .intervals
            .iter()
            .map(|i| Self::from_forecast(forecast, i.level))
            .collect()
    }

    /// Interval for a forecast with no error model, from its past one-step
    /// errors; the standard error grows as `σ·√h`
    pub fn from_residuals(mean: Vec<f64>, residuals: &[f64], level: f64) -> Self {
        let finite: Vec<f64> = residuals.iter().copied().filter(|r| r.is_finite()).collect();
        let sigma = if finite.is_empty() {
            f64::NAN
        } else {
            (finite.iter().map(|r| r * r).sum::<f64>() / finite.len() as f64).sqrt()
        };
        let se: Vec<f64> = (1..=mean.len()).map(|h| sigma * (h as f64).sqrt()).collect();
        Self::from_standard_errors(mean, &se, level)
    }

    /// Share of `actual` inside the interval
    pub fn coverage(&self, actual: &[f64]) -> f64 {
        coverage(actual, &self.lower, &self.upper)
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikecast_core::algorithms::arima::Arima;
    use bikecast_core::algorithms::Predictor;
    use bikecast_core::utils::testing::ar1;

    #[test]
    fn test_from_standard_errors() {
        let ci = ForecastWithConfidence::from_standard_errors(
            vec![10.0, 11.0, 12.0],
            &[1.0, 1.5, 2.0],
            0.95,
        );

        assert_eq!(ci.len(), 3);
        assert!((ci.upper[0] - 11.959964).abs() < 1e-4);
        assert!((ci.lower[2] - (12.0 - 2.0 * 1.959964)).abs() < 1e-4);
    }

    #[test]
    fn test_eighty_percent_is_narrower() {
        let wide = ForecastWithConfidence::from_standard_errors(vec![0.0], &[2.0], 0.95);
        let narrow = ForecastWithConfidence::from_standard_errors(vec![0.0], &[2.0], 0.80);
        assert!((narrow.upper[0] - 2.0 * 1.281552).abs() < 1e-4);
        assert!(narrow.upper[0] < wide.upper[0]);
    }

    #[test]
    fn test_levels_match_model_intervals() {
        let mut model = Arima::new(1, 0, 0).unwrap();
        model.fit(&ar1(150, 0.5, 8)).unwrap();
        let forecast = model.forecast(5, &[0.8, 0.95]).unwrap();

        let cis = ForecastWithConfidence::levels(&forecast);
        assert_eq!(cis.len(), 2);
        for (ci, interval) in cis.iter().zip(&forecast.intervals) {
            assert_eq!(ci.level, interval.level);
            for h in 0..5 {
                assert!((ci.lower[h] - interval.lower[h]).abs() < 1e-9);
                assert!((ci.upper[h] - interval.upper[h]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_from_residuals_widens_with_horizon() {
        let residuals = [3.0, -4.0, f64::NAN, 3.0, -4.0];
        let ci = ForecastWithConfidence::from_residuals(vec![100.0; 4], &residuals, 0.95);

        // rms of the finite residuals is 3.5355
        let sigma = 12.5_f64.sqrt();
        assert!((ci.upper[0] - (100.0 + 1.959964 * sigma)).abs() < 1e-4);
        let widths: Vec<f64> = (0..4).map(|h| ci.upper[h] - ci.lower[h]).collect();
        assert!(widths.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_from_residuals_without_history() {
        let ci = ForecastWithConfidence::from_residuals(vec![1.0; 2], &[], 0.9);
        assert!(ci.lower.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_coverage() {
        let ci = ForecastWithConfidence::from_standard_errors(vec![0.0; 4], &[1.0; 4], 0.95);
        assert_eq!(ci.coverage(&[0.5, -0.5, 3.0, 1.0]), 0.75);
    }
}
