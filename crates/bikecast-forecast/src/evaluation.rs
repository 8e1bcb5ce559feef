//! Out-of-sample evaluation on a holdout window

use bikecast_core::algorithms::arima::{Arima, ArimaSpec, Forecast};
use bikecast_core::algorithms::moving_average::SimpleMovingAverage;
use bikecast_core::algorithms::Predictor;
use bikecast_core::utils::metrics::Accuracy;
use bikecast_core::{Result, TsError};
use serde::Serialize;

use crate::confidence::ForecastWithConfidence;

/// Window of the naive moving-average benchmark
pub const BASELINE_WINDOW: usize = 7;

/// Forecast of the final `horizon` points from a model fitted on the rest
#[derive(Debug, Clone, Serialize)]
pub struct HoldoutEvaluation {
    pub spec: ArimaSpec,
    pub train_len: usize,
    pub forecast: Forecast,
    pub actual: Vec<f64>,
    pub accuracy: Accuracy,
    /// Share of actual values inside each interval, per level
    pub coverage: Vec<(f64, f64)>,
    /// Flat forecast at the last trailing weekly mean of the training span
    pub baseline: Baseline,
}

/// Naive benchmark scored on the same holdout
#[derive(Debug, Clone, Serialize)]
pub struct Baseline {
    pub window: usize,
    pub forecast: Vec<f64>,
    pub accuracy: Accuracy,
    /// Coverage of intervals built from the benchmark's one-step errors
    pub coverage: Vec<(f64, f64)>,
}

/// Fit `spec` on all but the last `horizon` values and score its forecast
pub fn holdout(
    series: &[f64],
    spec: ArimaSpec,
    horizon: usize,
    levels: &[f64],
) -> Result<HoldoutEvaluation> {
    if horizon == 0 {
        return Err(TsError::InvalidParameter {
            name: "horizon".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if horizon >= series.len() {
        return Err(TsError::InsufficientData {
            required: horizon + 1,
            actual: series.len(),
        });
    }

    let train_len = series.len() - horizon;
    let (train, test) = series.split_at(train_len);

    let mut model = Arima::with_spec(spec)?;
    model.fit(train)?;
    let forecast = model.forecast(horizon, levels)?;

    let accuracy = Accuracy::compute(test, &forecast.mean);
    let coverage = ForecastWithConfidence::levels(&forecast)
        .iter()
        .map(|ci| (ci.level, ci.coverage(test)))
        .collect();
    let baseline = moving_average_baseline(train, test, levels)?;

    tracing::info!(
        spec = %spec,
        train_len,
        horizon,
        rmse = accuracy.rmse,
        mape = accuracy.mape,
        baseline_mape = baseline.accuracy.mape,
        "holdout evaluation"
    );

    Ok(HoldoutEvaluation {
        spec,
        train_len,
        forecast,
        actual: test.to_vec(),
        accuracy,
        coverage,
        baseline,
    })
}

fn moving_average_baseline(train: &[f64], test: &[f64], levels: &[f64]) -> Result<Baseline> {
    let mut sma = SimpleMovingAverage::new(BASELINE_WINDOW)?;
    sma.fit(train)?;
    let forecast = sma.predict(test.len())?;

    // smoothed[k] averages train[k..k + window] and predicts train[k + window]
    let errors: Vec<f64> = sma
        .smoothed_values()
        .iter()
        .zip(&train[BASELINE_WINDOW..])
        .map(|(predicted, actual)| actual - predicted)
        .collect();
    let coverage = levels
        .iter()
        .map(|&level| {
            let ci = ForecastWithConfidence::from_residuals(forecast.clone(), &errors, level);
            (level, ci.coverage(test))
        })
        .collect();

    Ok(Baseline {
        window: BASELINE_WINDOW,
        accuracy: Accuracy::compute(test, &forecast),
        forecast,
        coverage,
    })
}
