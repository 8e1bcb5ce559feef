//! Autocorrelation, partial autocorrelation and the Ljung-Box test

use serde::{Deserialize, Serialize};

use crate::error::{Result, TsError};
use crate::utils::distributions::{chi_squared_sf, z_critical};

/// Sample autocorrelations for lags `0..=max_lag`.
///
/// Uses the biased estimator (divides by `n`). `max_lag` is capped at
/// `n - 1`; a constant series yields `NaN` beyond lag 0.
pub fn acf(data: &[f64], max_lag: usize) -> Vec<f64> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let max_lag = max_lag.min(n - 1);
    let mean = data.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = data.iter().map(|x| x - mean).collect();
    let c0: f64 = centered.iter().map(|x| x * x).sum();

    (0..=max_lag)
        .map(|k| {
            if k == 0 {
                return 1.0;
            }
            if c0 <= 0.0 {
                return f64::NAN;
            }
            centered
                .iter()
                .zip(centered.iter().skip(k))
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / c0
        })
        .collect()
}

/// Partial autocorrelations for lags `1..=max_lag` (Durbin-Levinson)
pub fn pacf(data: &[f64], max_lag: usize) -> Vec<f64> {
    let r = acf(data, max_lag);
    if r.len() < 2 {
        return Vec::new();
    }
    durbin_levinson(&r)
}

/// Partial autocorrelations from an autocorrelation sequence `r[0..=m]`
pub(crate) fn durbin_levinson(r: &[f64]) -> Vec<f64> {
    let m = r.len() - 1;
    let mut result = Vec::with_capacity(m);
    let mut phi: Vec<f64> = Vec::with_capacity(m);

    for k in 1..=m {
        let num = r[k] - (1..k).map(|j| phi[j - 1] * r[k - j]).sum::<f64>();
        let den = 1.0 - (1..k).map(|j| phi[j - 1] * r[j]).sum::<f64>();
        let phi_kk = if den.abs() < 1e-12 { f64::NAN } else { num / den };

        let prev = phi.clone();
        for j in 1..k {
            phi[j - 1] = prev[j - 1] - phi_kk * prev[k - j - 1];
        }
        phi.push(phi_kk);
        result.push(phi_kk);
    }

    result
}

/// `floor(10 log10(n))`, capped at `n - 1`
pub fn default_max_lag(n: usize) -> usize {
    if n < 2 {
        return 0;
    }
    ((10.0 * (n as f64).log10()).floor() as usize).min(n - 1)
}

/// Approximate significance bound for white noise
pub fn confidence_bound(n: usize, level: f64) -> f64 {
    z_critical(level) / (n as f64).sqrt()
}

/// ACF and PACF of a series with the white-noise significance bound
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correlogram {
    /// Lags `1..=max_lag`
    pub lags: Vec<usize>,
    pub acf: Vec<f64>,
    pub pacf: Vec<f64>,
    /// Values beyond `±bound` are significant
    pub bound: f64,
}

impl Correlogram {
    /// Compute a correlogram; `max_lag` defaults to [`default_max_lag`]
    pub fn compute(data: &[f64], max_lag: Option<usize>, level: f64) -> Result<Self> {
        if data.len() < 3 {
            return Err(TsError::InsufficientData {
                required: 3,
                actual: data.len(),
            });
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(TsError::InvalidData(
                "Data contains NaN or infinite values".to_string(),
            ));
        }
        if !(level > 0.0 && level < 1.0) {
            return Err(TsError::invalid_parameter("level", "must be in (0, 1)"));
        }

        let max_lag = max_lag
            .unwrap_or_else(|| default_max_lag(data.len()))
            .clamp(1, data.len() - 1);
        let r = acf(data, max_lag);
        if r[1..].iter().any(|v| v.is_nan()) {
            return Err(TsError::NumericalError(
                "autocorrelation undefined for a constant series".to_string(),
            ));
        }

        Ok(Self {
            lags: (1..=max_lag).collect(),
            acf: r[1..].to_vec(),
            pacf: durbin_levinson(&r),
            bound: confidence_bound(data.len(), level),
        })
    }

    /// Lags whose autocorrelation exceeds the bound
    pub fn significant_acf_lags(&self) -> Vec<usize> {
        self.significant(&self.acf)
    }

    /// Lags whose partial autocorrelation exceeds the bound
    pub fn significant_pacf_lags(&self) -> Vec<usize> {
        self.significant(&self.pacf)
    }

    fn significant(&self, values: &[f64]) -> Vec<usize> {
        self.lags
            .iter()
            .zip(values)
            .filter(|(_, v)| v.abs() > self.bound)
            .map(|(lag, _)| *lag)
            .collect()
    }
}

/// Result of a portmanteau test for residual autocorrelation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortmanteauTest {
    pub statistic: f64,
    pub lag: usize,
    pub df: usize,
    pub p_value: f64,
}

impl PortmanteauTest {
    /// True when the residuals look like white noise at `alpha`
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value >= alpha
    }
}

/// Ljung-Box test: `Q = n(n+2) Σ r_k² / (n-k)` against χ²(lag - fitted_df)
pub fn ljung_box(residuals: &[f64], lag: usize, fitted_df: usize) -> Result<PortmanteauTest> {
    let n = residuals.len();
    if lag == 0 || lag >= n {
        return Err(TsError::invalid_parameter(
            "lag",
            format!("must be in 1..{} for {} residuals", n, n),
        ));
    }
    if lag <= fitted_df {
        return Err(TsError::invalid_parameter(
            "lag",
            format!("must exceed the {} fitted coefficients", fitted_df),
        ));
    }

    let r = acf(residuals, lag);
    if r.iter().any(|v| v.is_nan()) {
        return Err(TsError::NumericalError(
            "autocorrelation undefined for constant residuals".to_string(),
        ));
    }
    let nf = n as f64;
    let statistic = nf
        * (nf + 2.0)
        * (1..=lag)
            .map(|k| r[k] * r[k] / (nf - k as f64))
            .sum::<f64>();
    let df = lag - fitted_df;

    Ok(PortmanteauTest {
        statistic,
        lag,
        df,
        p_value: chi_squared_sf(statistic, df as f64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{ar1, white_noise};

    #[test]
    fn test_acf_known_values() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let r = acf(&data, 2);

        assert_eq!(r.len(), 3);
        assert_eq!(r[0], 1.0);
        assert!((r[1] - 0.4).abs() < 1e-12);
        assert!((r[2] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_acf_caps_lag() {
        let r = acf(&[1.0, 2.0, 4.0], 10);
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_pacf_known_values() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let p = pacf(&data, 2);

        assert!((p[0] - 0.4).abs() < 1e-12);
        assert!((p[1] - (-0.26 / 0.84)).abs() < 1e-12);
    }

    #[test]
    fn test_ar1_signature() {
        let data = ar1(2000, 0.7, 42);
        let gram = Correlogram::compute(&data, Some(10), 0.95).unwrap();

        assert!((gram.acf[0] - 0.7).abs() < 0.08);
        assert!((gram.acf[1] - 0.49).abs() < 0.1);
        assert!((gram.pacf[0] - 0.7).abs() < 0.08);
        assert!(gram.pacf[1].abs() < 0.1);
        assert!(gram.significant_pacf_lags().contains(&1));
    }

    #[test]
    fn test_default_max_lag() {
        assert_eq!(default_max_lag(100), 20);
        assert_eq!(default_max_lag(725), 28);
        assert_eq!(default_max_lag(5), 4);
    }

    #[test]
    fn test_confidence_bound() {
        assert!((confidence_bound(100, 0.95) - 0.1959964).abs() < 1e-5);
    }

    #[test]
    fn test_correlogram_rejects_constant_series() {
        let err = Correlogram::compute(&[3.0; 20], None, 0.95).unwrap_err();
        assert!(matches!(err, TsError::NumericalError(_)));
    }

    #[test]
    fn test_ljung_box_white_noise_vs_ar() {
        let noise = white_noise(500, 7);
        let lb = ljung_box(&noise, 10, 0).unwrap();
        assert_eq!(lb.df, 10);
        assert!(lb.statistic > 0.0);

        let persistent = ar1(500, 0.8, 7);
        let lb_ar = ljung_box(&persistent, 10, 0).unwrap();
        assert!(lb_ar.p_value < 1e-6);
        assert!(!lb_ar.is_white_noise(0.05));
        assert!(lb_ar.statistic > lb.statistic);
    }

    #[test]
    fn test_ljung_box_lag_validation() {
        let noise = white_noise(50, 1);
        assert!(ljung_box(&noise, 0, 0).is_err());
        assert!(ljung_box(&noise, 50, 0).is_err());
        assert!(ljung_box(&noise, 2, 2).is_err());
    }
}
