//! Unit-root and stationarity tests
//!
//! The augmented Dickey-Fuller test (H0: unit root) decides whether a series
//! needs differencing; the KPSS test (H0: level stationary) drives the
//! automatic choice of the differencing order.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TsError};
use crate::utils::distributions::interpolate_clamped;
use crate::utils::linalg::ols;
use crate::utils::preprocessing::difference;

/// Critical values of the ADF statistic with constant and trend
/// (Banerjee et al. 1993), one row per sample size.
const ADF_TABLE: [[f64; 8]; 6] = [
    [-4.38, -3.95, -3.60, -3.24, -1.14, -0.80, -0.50, -0.15],
    [-4.15, -3.80, -3.50, -3.18, -1.19, -0.87, -0.58, -0.24],
    [-4.04, -3.73, -3.45, -3.15, -1.22, -0.90, -0.62, -0.28],
    [-3.99, -3.69, -3.43, -3.13, -1.23, -0.92, -0.64, -0.31],
    [-3.98, -3.68, -3.42, -3.13, -1.24, -0.93, -0.65, -0.32],
    [-3.96, -3.66, -3.41, -3.12, -1.25, -0.94, -0.66, -0.33],
];
const ADF_SAMPLE_SIZES: [f64; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, 100_000.0];
const ADF_PROBABILITIES: [f64; 8] = [0.01, 0.025, 0.05, 0.10, 0.90, 0.95, 0.975, 0.99];

const KPSS_CRITICAL: [f64; 4] = [0.347, 0.463, 0.574, 0.739];
const KPSS_PROBABILITIES: [f64; 4] = [0.10, 0.05, 0.025, 0.01];

fn check_finite(data: &[f64]) -> Result<()> {
    if data.iter().any(|x| !x.is_finite()) {
        return Err(TsError::InvalidData(
            "Data contains NaN or infinite values".to_string(),
        ));
    }
    Ok(())
}

/// Augmented Dickey-Fuller test result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdfTest {
    /// t-ratio of the lagged level coefficient
    pub statistic: f64,
    /// Number of lagged differences in the regression
    pub lags: usize,
    /// p-value against the stationary alternative
    pub p_value: f64,
    /// The statistic fell outside the table and the p-value was clamped
    pub p_value_truncated: bool,
    /// Rows used in the test regression
    pub n_obs: usize,
}

impl AdfTest {
    /// Reject the unit root at significance `alpha`
    pub fn is_stationary(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Default lag order `trunc((n - 1)^(1/3))`
pub fn adf_default_lags(n: usize) -> usize {
    ((n.saturating_sub(1)) as f64).cbrt().trunc() as usize
}

/// Augmented Dickey-Fuller test with constant and linear trend.
///
/// Regresses `Δy_t` on a constant, `t`, `y_{t-1}` and `lags` lagged
/// differences.
pub fn adf_test(data: &[f64], lags: Option<usize>) -> Result<AdfTest> {
    check_finite(data)?;
    let k = lags.unwrap_or_else(|| adf_default_lags(data.len()));
    let dy = difference(data, 1);
    let n = dy.len();
    let n_regressors = 3 + k;

    let first = k;
    let n_rows = n.saturating_sub(first);
    if n_rows <= n_regressors + 1 {
        return Err(TsError::InsufficientData {
            required: n_regressors + k + 3,
            actual: data.len(),
        });
    }

    let mut rows = Vec::with_capacity(n_rows);
    let mut y = Vec::with_capacity(n_rows);
    for t in first..n {
        let mut row = Vec::with_capacity(n_regressors);
        row.push(1.0);
        row.push(data[t]);
        row.push((t + 1) as f64);
        for i in 1..=k {
            row.push(dy[t - i]);
        }
        rows.push(row);
        y.push(dy[t]);
    }

    let fit = ols(&rows, &y)?;
    let statistic = fit.t_stat(1);
    if !statistic.is_finite() {
        return Err(TsError::NumericalError(
            "ADF statistic is undefined for this series".to_string(),
        ));
    }

    let interpolated: Vec<f64> = (0..ADF_PROBABILITIES.len())
        .map(|col| {
            let column: Vec<f64> = ADF_TABLE.iter().map(|row| row[col]).collect();
            interpolate_clamped(&ADF_SAMPLE_SIZES, &column, n as f64)
        })
        .collect();
    let p_value = interpolate_clamped(&interpolated, &ADF_PROBABILITIES, statistic);
    let p_value_truncated =
        statistic <= interpolated[0] || statistic >= interpolated[interpolated.len() - 1];
    if p_value_truncated {
        tracing::debug!(statistic, p_value, "ADF p-value outside table range");
    }

    Ok(AdfTest {
        statistic,
        lags: k,
        p_value,
        p_value_truncated,
        n_obs: n_rows,
    })
}

/// KPSS level-stationarity test result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpssTest {
    pub statistic: f64,
    pub lags: usize,
    pub p_value: f64,
    pub p_value_truncated: bool,
}

impl KpssTest {
    /// Fail to reject level stationarity at `alpha`
    pub fn is_stationary(&self, alpha: f64) -> bool {
        self.p_value >= alpha
    }
}

/// Default truncation lag `trunc(4 (n/100)^(1/4))`
pub fn kpss_default_lags(n: usize) -> usize {
    (4.0 * (n as f64 / 100.0).powf(0.25)).trunc() as usize
}

/// KPSS test for level stationarity with a Bartlett long-run variance
pub fn kpss_test(data: &[f64], lags: Option<usize>) -> Result<KpssTest> {
    check_finite(data)?;
    let n = data.len();
    if n < 4 {
        return Err(TsError::InsufficientData {
            required: 4,
            actual: n,
        });
    }
    let lags = lags.unwrap_or_else(|| kpss_default_lags(n)).min(n - 1);

    let mean = data.iter().sum::<f64>() / n as f64;
    let e: Vec<f64> = data.iter().map(|x| x - mean).collect();

    let mut partial = 0.0;
    let eta = e
        .iter()
        .map(|v| {
            partial += v;
            partial * partial
        })
        .sum::<f64>()
        / (n as f64 * n as f64);

    let mut s2 = e.iter().map(|v| v * v).sum::<f64>() / n as f64;
    for l in 1..=lags {
        let w = 1.0 - l as f64 / (lags as f64 + 1.0);
        let cov: f64 = e.iter().skip(l).zip(&e).map(|(a, b)| a * b).sum();
        s2 += 2.0 * w * cov / n as f64;
    }
    if s2 <= 0.0 {
        return Err(TsError::NumericalError(
            "long-run variance is not positive".to_string(),
        ));
    }

    let statistic = eta / s2;
    let p_value = interpolate_clamped(&KPSS_CRITICAL, &KPSS_PROBABILITIES, statistic);
    let p_value_truncated =
        statistic <= KPSS_CRITICAL[0] || statistic >= KPSS_CRITICAL[KPSS_CRITICAL.len() - 1];

    Ok(KpssTest {
        statistic,
        lags,
        p_value,
        p_value_truncated,
    })
}

/// Number of first differences needed before KPSS stops rejecting
/// level stationarity at `alpha`, up to `max_d`.
pub fn ndiffs(data: &[f64], alpha: f64, max_d: usize) -> Result<usize> {
    check_finite(data)?;
    let mut series = data.to_vec();
    let mut d = 0;

    while d < max_d {
        if is_constant(&series) || series.len() < 4 {
            break;
        }
        let test = kpss_test(&series, None)?;
        if test.is_stationary(alpha) {
            break;
        }
        series = difference(&series, 1);
        d += 1;
    }

    tracing::debug!(d, "selected differencing order");
    Ok(d)
}

fn is_constant(data: &[f64]) -> bool {
    match data.first() {
        Some(first) => data.iter().all(|v| (v - first).abs() < 1e-12),
        None => true,
    }
}
