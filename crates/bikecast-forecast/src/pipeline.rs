//! End-to-end demand forecasting analysis
//!
//! Runs the workflow step by step: clean the raw counts, smooth them with
//! weekly and monthly moving averages, remove the seasonal component of the
//! weekly average with STL, check stationarity, identify and fit ARIMA
//! models, check their residuals, forecast, and evaluate on a holdout.

use bikecast_core::algorithms::arima::{Arima, ArimaSpec};
use bikecast_core::algorithms::moving_average::centered_moving_average;
use bikecast_core::algorithms::Predictor;
use bikecast_core::data::DailySeries;
use bikecast_core::diagnostics::{adf_test, ljung_box, Correlogram};
use bikecast_core::utils::preprocessing::{clean_outliers, difference, CleanResult};
use bikecast_core::{Result, TsError};
use chrono::NaiveDate;

use crate::config::AnalysisConfig;
use crate::decomposition::{
    decompose_additive, seasonal_strength, seasonally_adjust, stl, DecompositionMethod,
    DecompositionResult,
};
use crate::evaluation::holdout;
use crate::seasonality::detect_seasonality;
use crate::report::{
    finite, AnalysisReport, AnnotatedRow, CleaningSummary, DecompositionSummary, ForecastReport,
    ForecastRow, ModelReport,
};
use crate::selection::{auto_arima, AutoArimaConfig};

/// Weekly and monthly centered moving averages of the cleaned series
#[derive(Debug, Clone, PartialEq)]
pub struct Smoothed {
    pub weekly: Vec<f64>,
    pub monthly: Vec<f64>,
}

/// STL of the weekly average with its seasonal component removed
#[derive(Debug, Clone, PartialEq)]
pub struct Deseasonalized {
    /// Index in the full series of `smoothed[0]`
    pub offset: usize,
    /// Weekly average without its `NaN` edges
    pub smoothed: Vec<f64>,
    pub decomposition: DecompositionResult,
    pub adjusted: Vec<f64>,
}

/// Configured analysis over a daily series
#[derive(Debug, Clone)]
pub struct Analysis {
    config: AnalysisConfig,
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Interpolate missing days and replace outliers
    pub fn clean(&self, series: &DailySeries) -> Result<CleanResult> {
        let cleaned = clean_outliers(series.values(), &self.config.cleaning)?;
        tracing::info!(
            missing = cleaned.missing.len(),
            outliers = cleaned.outliers.len(),
            "cleaned series"
        );
        Ok(cleaned)
    }

    pub fn smooth(&self, values: &[f64]) -> Result<Smoothed> {
        let smoothed = Smoothed {
            weekly: centered_moving_average(values, self.config.weekly_order)?,
            monthly: centered_moving_average(values, self.config.monthly_order)?,
        };
        tracing::info!(
            weekly = self.config.weekly_order,
            monthly = self.config.monthly_order,
            "smoothed series"
        );
        Ok(smoothed)
    }

    /// Decompose the finite span of `weekly` and subtract its seasonal part
    pub fn deseasonalize(&self, weekly: &[f64]) -> Result<Deseasonalized> {
        let first = weekly.iter().position(|v| v.is_finite());
        let last = weekly.iter().rposition(|v| v.is_finite());
        let (first, last) = match (first, last) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(TsError::InsufficientData {
                    required: 2 * self.config.stl_period,
                    actual: 0,
                })
            }
        };
        let smoothed = weekly[first..=last].to_vec();
        let decomposition = match self.config.decomposition {
            DecompositionMethod::Stl => stl(&smoothed, &self.config.stl_config())?,
            DecompositionMethod::Classical => {
                decompose_additive(&smoothed, self.config.stl_period)?
            }
        };
        let adjusted = seasonally_adjust(&smoothed, &decomposition)?;

        tracing::info!(
            method = %self.config.decomposition,
            period = self.config.stl_period,
            length = smoothed.len(),
            strength = seasonal_strength(&decomposition),
            "deseasonalized weekly average"
        );
        Ok(Deseasonalized {
            offset: first,
            smoothed,
            decomposition,
            adjusted,
        })
    }

    /// Dominant cycle of the cleaned counts, searched up to `stl_period`
    pub fn detect_period(&self, cleaned: &[f64]) -> Option<usize> {
        let period = detect_seasonality(&difference(cleaned, 1), self.config.stl_period);
        tracing::info!(?period, "autocorrelation peak");
        period
    }

    fn confidence(&self) -> f64 {
        1.0 - self.config.significance
    }

    /// Residual correlogram and Ljung-Box test of a fitted model
    pub fn diagnose(&self, label: &str, model: &Arima, candidates: usize) -> Result<ModelReport> {
        let summary = model.summary().ok_or(TsError::NotFitted)?.clone();
        let residuals = model.residuals();
        let spec = *model.spec();
        let arma_df = summary.ar.len()
            + summary.ma.len()
            + summary.seasonal_ar.len()
            + summary.seasonal_ma.len();

        let lag = self
            .config
            .ljung_box_lag
            .unwrap_or_else(|| (residuals.len() / 5).min(10))
            .max(arma_df + 1);
        let ljung_box = ljung_box(residuals, lag, arma_df)?;
        let residual_correlogram =
            Correlogram::compute(residuals, self.config.acf_max_lag, self.confidence())?;

        tracing::info!(
            model = label,
            spec = %spec,
            aicc = summary.aicc,
            ljung_box_p = ljung_box.p_value,
            "fitted model"
        );
        Ok(ModelReport {
            label: label.to_string(),
            spec,
            summary,
            ljung_box,
            residual_correlogram,
            candidates,
        })
    }

    /// Fit `spec`, or select one automatically when `None`
    pub fn fit(&self, data: &[f64], spec: Option<ArimaSpec>) -> Result<(Arima, usize)> {
        match spec {
            Some(spec) => {
                let mut model = Arima::with_spec(spec)?;
                model.fit(data)?;
                Ok((model, 0))
            }
            None => {
                let auto = AutoArimaConfig {
                    seasonal: false,
                    ..self.config.auto.clone()
                };
                let selection = auto_arima(data, &auto)?;
                Ok((selection.model, selection.candidates.len()))
            }
        }
    }

    /// Run every step on `series`
    pub fn run(&self, series: &DailySeries) -> Result<AnalysisReport> {
        let config = &self.config;
        let levels = config.interval_levels();

        let cleaned = self.clean(series)?;
        let smoothed = self.smooth(&cleaned.values)?;
        let deseasonal = self.deseasonalize(&smoothed.weekly)?;
        let offset = deseasonal.offset;
        let last_date = series.date_at(offset + deseasonal.adjusted.len() - 1);

        let adf_smoothed = adf_test(&deseasonal.smoothed, config.adf_lags)?;
        tracing::info!(
            statistic = adf_smoothed.statistic,
            p_value = adf_smoothed.p_value,
            "ADF test on weekly average"
        );

        let differenced = difference(&deseasonal.adjusted, 1);
        let adf_differenced = adf_test(&differenced, config.adf_lags)?;
        tracing::info!(
            statistic = adf_differenced.statistic,
            p_value = adf_differenced.p_value,
            "ADF test on differenced deseasonalized series"
        );
        let correlogram = Correlogram::compute(&differenced, config.acf_max_lag, self.confidence())?;
        tracing::info!(
            acf = ?correlogram.significant_acf_lags(),
            pacf = ?correlogram.significant_pacf_lags(),
            "significant lags of differenced series"
        );

        let (auto_fit, tried) = self.fit(&deseasonal.adjusted, None)?;
        let auto_model = self.diagnose("auto", &auto_fit, tried)?;

        let manual = match config.manual_order {
            Some(order) => {
                let spec = ArimaSpec::new(order.p, order.d, order.q);
                let (model, _) = self.fit(&deseasonal.adjusted, Some(spec))?;
                let report = self.diagnose("manual", &model, 0)?;
                Some((model, report))
            }
            None => None,
        };

        let (final_model, final_label) = match &manual {
            Some((model, report)) => (model, report.label.clone()),
            None => (&auto_fit, auto_model.label.clone()),
        };
        let forecast = final_model.forecast(config.horizon, &levels)?;
        let forecast = ForecastReport {
            label: final_label,
            rows: ForecastRow::from_forecast(&forecast, last_date),
        };
        tracing::info!(horizon = config.horizon, model = %final_model.spec(), "forecast");

        let holdout = if config.holdout > 0 {
            Some(holdout(
                &deseasonal.adjusted,
                *final_model.spec(),
                config.holdout,
                &levels,
            )?)
        } else {
            None
        };

        let (seasonal_model, seasonal_forecast) = if config.seasonal_refit {
            let seasonal = AutoArimaConfig {
                seasonal: true,
                period: config.stl_period,
                ..config.auto.clone()
            };
            let selection = auto_arima(&deseasonal.adjusted, &seasonal)?;
            let report = self.diagnose("seasonal", &selection.model, selection.candidates.len())?;
            let fc = selection.model.forecast(config.horizon, &levels)?;
            let rows = ForecastRow::from_forecast(&fc, last_date);
            (
                Some(report),
                Some(ForecastReport {
                    label: "seasonal".to_string(),
                    rows,
                }),
            )
        } else {
            (None, None)
        };

        let mut residuals = vec![f64::NAN; series.len()];
        let model_offset = offset + final_model.residual_offset();
        for (i, e) in final_model.residuals().iter().enumerate() {
            residuals[model_offset + i] = *e;
        }
        let rows = (0..series.len())
            .map(|t| {
                let in_span = t >= offset && t - offset < deseasonal.adjusted.len();
                let pick = |values: &[f64]| {
                    if in_span {
                        finite(values[t - offset])
                    } else {
                        None
                    }
                };
                AnnotatedRow {
                    date: series.date_at(t),
                    count: finite(series.values()[t]),
                    clean_count: finite(cleaned.values[t]),
                    ma_weekly: finite(smoothed.weekly[t]),
                    ma_monthly: finite(smoothed.monthly[t]),
                    seasonal: pick(&deseasonal.decomposition.seasonal),
                    deseasonal: pick(&deseasonal.adjusted),
                    residual: finite(residuals[t]),
                }
            })
            .collect();

        let dates = |idx: &[usize]| -> Vec<NaiveDate> {
            idx.iter().map(|&i| series.date_at(i)).collect()
        };
        Ok(AnalysisReport {
            start: series.start(),
            end: series.end(),
            observations: series.len(),
            cleaning: CleaningSummary {
                missing: dates(&cleaned.missing),
                outliers: dates(&cleaned.outliers),
            },
            decomposition: DecompositionSummary {
                method: config.decomposition,
                period: config.stl_period,
                start: series.date_at(offset),
                length: deseasonal.smoothed.len(),
                seasonal_strength: seasonal_strength(&deseasonal.decomposition),
                detected_period: self.detect_period(&cleaned.values),
            },
            adf_smoothed,
            adf_differenced,
            correlogram,
            auto_model,
            manual_model: manual.map(|(_, report)| report),
            forecast,
            holdout,
            seasonal_model,
            seasonal_forecast,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikecast_core::utils::testing::white_noise;

    fn demand(n: usize) -> DailySeries {
        let noise = white_noise(n, 17);
        let values = (0..n)
            .map(|i| {
                let t = i as f64;
                2000.0 + 5.0 * t
                    + 400.0 * (t * 2.0 * std::f64::consts::PI / 7.0).sin()
                    + 250.0 * (t * 2.0 * std::f64::consts::PI / 30.0).cos()
                    + 50.0 * noise[i]
            })
            .collect();
        DailySeries::new(NaiveDate::from_ymd_opt(2011, 1, 1).unwrap(), values)
    }

    fn quick_config() -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.auto.max_models = 12;
        config.seasonal_refit = false;
        config
    }

    #[test]
    fn test_deseasonalize_drops_edges() {
        let analysis = Analysis::new(quick_config());
        let series = demand(200);
        let smoothed = analysis.smooth(series.values()).unwrap();
        let des = analysis.deseasonalize(&smoothed.weekly).unwrap();

        assert_eq!(des.offset, 3);
        assert_eq!(des.smoothed.len(), 194);
        assert_eq!(des.adjusted.len(), 194);
    }

    #[test]
    fn test_classical_decomposition_keeps_alignment() {
        let mut config = quick_config();
        config.decomposition = DecompositionMethod::Classical;
        let analysis = Analysis::new(config);
        let smoothed = analysis.smooth(demand(200).values()).unwrap();
        let des = analysis.deseasonalize(&smoothed.weekly).unwrap();

        assert_eq!(des.offset, 3);
        assert_eq!(des.adjusted.len(), 194);
        // moving-average trend is undefined at the edges, the adjusted series is not
        assert!(des.decomposition.trend[0].is_nan());
        assert!(des.adjusted.iter().all(|v| v.is_finite()));
        for t in 30..164 {
            let s = des.decomposition.seasonal[t];
            assert!((s - des.decomposition.seasonal[t + 30]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_detect_period_finds_the_week() {
        let analysis = Analysis::new(quick_config());
        assert_eq!(analysis.detect_period(demand(240).values()), Some(7));
        assert_eq!(analysis.detect_period(&[1.0; 20]), None);
    }

    #[test]
    fn test_deseasonalize_rejects_all_nan() {
        let analysis = Analysis::new(quick_config());
        assert!(analysis.deseasonalize(&[f64::NAN; 10]).is_err());
    }

    #[test]
    fn test_fit_manual_and_auto() {
        let analysis = Analysis::new(quick_config());
        let data: Vec<f64> = demand(150).values().to_vec();

        let (manual, tried) = analysis.fit(&data, Some(ArimaSpec::new(1, 1, 1))).unwrap();
        assert_eq!(tried, 0);
        assert_eq!(manual.params(), (1, 1, 1));

        let (auto, tried) = analysis.fit(&data, None).unwrap();
        assert!(tried >= 1 && tried <= 12);
        assert!(auto.spec().seasonal.is_none());

        let report = analysis.diagnose("auto", &auto, tried).unwrap();
        assert_eq!(report.label, "auto");
        assert!((0.0..=1.0).contains(&report.ljung_box.p_value));
    }

    #[test]
    fn test_run_produces_aligned_rows() {
        let mut config = quick_config();
        config.horizon = 10;
        config.holdout = 15;
        let analysis = Analysis::new(config);
        let series = demand(240);

        let report = analysis.run(&series).unwrap();
        assert_eq!(report.rows.len(), 240);
        assert_eq!(report.forecast.rows.len(), 10);
        assert_eq!(report.forecast.rows[0].bounds.len(), 2);
        assert_eq!(report.forecast.label, "auto");
        assert!(report.manual_model.is_none());
        assert_eq!(report.holdout.as_ref().unwrap().actual.len(), 15);
        assert_eq!(report.decomposition.method, DecompositionMethod::Stl);
        assert_eq!(report.decomposition.detected_period, Some(7));

        // weekly average and deseasonalized series share their NaN edges
        assert!(report.rows[2].deseasonal.is_none());
        assert!(report.rows[3].deseasonal.is_some());
        assert!(report.rows[236].deseasonal.is_some());
        assert!(report.rows[237].deseasonal.is_none());
        assert_eq!(
            report.forecast.rows[0].date,
            NaiveDate::from_ymd_opt(2011, 1, 1).unwrap() + chrono::Duration::days(237)
        );
    }
}
