//! ARIMA (AutoRegressive Integrated Moving Average) implementation
//!
//! ARIMA models are one of the most widely used approaches for time series forecasting.
//! The model combines three components:
//!
//! - **AR (AutoRegressive)**: Uses past values to predict future values
//! - **I (Integrated)**: Differencing to achieve stationarity
//! - **MA (Moving Average)**: Uses past forecast errors
//!
//! An optional multiplicative seasonal part `(P, D, Q)[s]` applies the same
//! three components at multiples of the seasonal period.
//!
//! Coefficients are estimated by conditional sum of squares. The optimizer
//! works on an unconstrained scale that maps through partial
//! autocorrelations, so every fitted AR polynomial is stationary and every
//! MA polynomial is invertible.
//!
//! ## Example
//!
//! ```rust
//! use bikecast_core::algorithms::{arima::Arima, Predictor};
//!
//! let data: Vec<f64> = (1..=60).map(|x| x as f64 + (x as f64 * 0.7).sin()).collect();
//! let mut model = Arima::new(1, 1, 0).unwrap();
//! model.fit(&data).unwrap();
//! let forecast = model.predict(3).unwrap();
//! assert_eq!(forecast.len(), 3);
//! ```

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithms::Predictor;
use crate::error::{Result, TsError};
use crate::utils::distributions::z_critical;
use crate::utils::linalg::invert;
use crate::utils::optimize::{nelder_mead, NelderMeadConfig};
use crate::utils::preprocessing::{difference, seasonal_difference};

/// Non-seasonal orders `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

/// Seasonal orders `(P, D, Q)` at lag `period`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    fn is_empty(&self) -> bool {
        self.p == 0 && self.d == 0 && self.q == 0
    }
}

/// Full model specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaSpec {
    pub order: ArimaOrder,
    pub seasonal: Option<SeasonalOrder>,
    /// Estimate a mean; ignored when any differencing is applied
    pub include_mean: bool,
}

impl ArimaSpec {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            order: ArimaOrder::new(p, d, q),
            seasonal: None,
            include_mean: true,
        }
    }

    pub fn with_seasonal(mut self, p: usize, d: usize, q: usize, period: usize) -> Self {
        self.seasonal = Some(SeasonalOrder::new(p, d, q, period));
        self
    }

    pub fn with_mean(mut self, include_mean: bool) -> Self {
        self.include_mean = include_mean;
        self
    }

    /// Check order limits
    pub fn validate(&self) -> Result<()> {
        let ArimaOrder { p, d, q } = self.order;
        if p > 10 {
            return Err(TsError::invalid_parameter("p", "AR order must be <= 10"));
        }
        if d > 2 {
            return Err(TsError::invalid_parameter("d", "Differencing order must be <= 2"));
        }
        if q > 10 {
            return Err(TsError::invalid_parameter("q", "MA order must be <= 10"));
        }
        if let Some(s) = self.seasonal {
            if s.p > 2 || s.q > 2 {
                return Err(TsError::invalid_parameter(
                    "seasonal",
                    "seasonal AR and MA orders must be <= 2",
                ));
            }
            if s.d > 1 {
                return Err(TsError::invalid_parameter(
                    "seasonal",
                    "seasonal differencing order must be <= 1",
                ));
            }
            if !s.is_empty() && s.period < 2 {
                return Err(TsError::invalid_parameter("period", "must be >= 2"));
            }
        }
        Ok(())
    }

    /// Seasonal part, if it has any non-zero order
    pub fn seasonal_part(&self) -> Option<SeasonalOrder> {
        self.seasonal.filter(|s| !s.is_empty())
    }

    /// Whether a mean is estimated
    pub fn has_mean(&self) -> bool {
        let seasonal_d = self.seasonal_part().map(|s| s.d).unwrap_or(0);
        self.include_mean && self.order.d == 0 && seasonal_d == 0
    }

    /// Number of estimated coefficients, mean included
    pub fn n_coefficients(&self) -> usize {
        let (sp, sq) = self.seasonal_part().map(|s| (s.p, s.q)).unwrap_or((0, 0));
        self.order.p + self.order.q + sp + sq + usize::from(self.has_mean())
    }

    /// Observations consumed by differencing
    pub fn differencing_span(&self) -> usize {
        self.order.d + self.seasonal_part().map(|s| s.d * s.period).unwrap_or(0)
    }

    /// Length of the expanded AR polynomial
    fn ar_span(&self) -> usize {
        self.order.p + self.seasonal_part().map(|s| s.p * s.period).unwrap_or(0)
    }

    /// Length of the expanded MA polynomial
    fn ma_span(&self) -> usize {
        self.order.q + self.seasonal_part().map(|s| s.q * s.period).unwrap_or(0)
    }

    /// Smallest series length this specification can be fitted to
    pub fn min_observations(&self) -> usize {
        self.differencing_span() + self.ar_span() + self.ma_span() + 10
    }
}

impl fmt::Display for ArimaSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ArimaOrder { p, d, q } = self.order;
        write!(f, "ARIMA({},{},{})", p, d, q)?;
        if let Some(s) = self.seasonal_part() {
            write!(f, "({},{},{})[{}]", s.p, s.d, s.q, s.period)?;
        }
        if self.has_mean() {
            write!(f, " with non-zero mean")?;
        }
        Ok(())
    }
}

/// Estimates and information criteria of a fitted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub spec: ArimaSpec,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    pub mean: Option<f64>,
    /// Innovation variance
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
    /// Residuals entering the sum of squares
    pub n_used: usize,
    /// Standard errors in coefficient order (ar, ma, seasonal ar, seasonal ma, mean)
    pub std_errors: Option<Vec<f64>>,
}

impl FitSummary {
    /// Coefficient names and values in estimation order
    pub fn coefficients(&self) -> Vec<(String, f64)> {
        let mut out = Vec::new();
        let named = [
            ("ar", &self.ar),
            ("ma", &self.ma),
            ("sar", &self.seasonal_ar),
            ("sma", &self.seasonal_ma),
        ];
        for (prefix, values) in named {
            for (i, v) in values.iter().enumerate() {
                out.push((format!("{}{}", prefix, i + 1), *v));
            }
        }
        if let Some(mean) = self.mean {
            out.push(("mean".to_string(), mean));
        }
        out
    }
}

/// Prediction interval at one confidence level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInterval {
    /// Confidence level in (0, 1)
    pub level: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Point forecasts with standard errors and intervals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub mean: Vec<f64>,
    pub se: Vec<f64>,
    pub intervals: Vec<PredictionInterval>,
}

impl Forecast {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Interval for `level`, if it was requested
    pub fn interval(&self, level: f64) -> Option<&PredictionInterval> {
        self.intervals
            .iter()
            .find(|i| (i.level - level).abs() < 1e-9)
    }
}

/// Coefficients split by polynomial
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Coefficients {
    ar: Vec<f64>,
    ma: Vec<f64>,
    sar: Vec<f64>,
    sma: Vec<f64>,
    mean: f64,
}

impl Coefficients {
    fn flatten(&self, with_mean: bool) -> Vec<f64> {
        let mut out: Vec<f64> = self
            .ar
            .iter()
            .chain(&self.ma)
            .chain(&self.sar)
            .chain(&self.sma)
            .copied()
            .collect();
        if with_mean {
            out.push(self.mean);
        }
        out
    }
}

/// Map unconstrained values to the coefficients of a stationary AR
/// polynomial via partial autocorrelations `tanh(u)`.
fn pacf_to_ar(u: &[f64]) -> Vec<f64> {
    let mut a: Vec<f64> = Vec::with_capacity(u.len());
    for (k, &raw) in u.iter().enumerate() {
        let r = raw.tanh();
        let prev = a.clone();
        for j in 0..k {
            a[j] = prev[j] - r * prev[k - 1 - j];
        }
        a.push(r);
    }
    a
}

/// Multiply two polynomials given by coefficient vectors (constant first)
fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * Σ c_i B^(i * step)` as a coefficient vector
fn lag_poly(coeffs: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coeffs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Expanded AR coefficients `c` such that `z_t = Σ c_k z_{t-k} + ...`
fn expand_ar(ar: &[f64], sar: &[f64], period: usize) -> Vec<f64> {
    let poly = poly_mul(&lag_poly(ar, 1, -1.0), &lag_poly(sar, period.max(1), -1.0));
    poly[1..].iter().map(|c| -c).collect()
}

/// Expanded MA coefficients of `(1 + Σθ B)(1 + ΣΘ B^s)`
fn expand_ma(ma: &[f64], sma: &[f64], period: usize) -> Vec<f64> {
    let poly = poly_mul(&lag_poly(ma, 1, 1.0), &lag_poly(sma, period.max(1), 1.0));
    poly[1..].to_vec()
}

/// Conditional residuals of an ARMA recursion.
///
/// Residuals before `ncond` are zero; the returned sum of squares covers
/// indices from `sum_from` on.
fn css_residuals(
    w: &[f64],
    phi: &[f64],
    theta: &[f64],
    mean: f64,
    ncond: usize,
    sum_from: usize,
) -> (f64, Vec<f64>) {
    let n = w.len();
    let mut e = vec![0.0; n];
    let mut sse = 0.0;

    for t in ncond..n {
        let mut pred = 0.0;
        for (j, &c) in phi.iter().enumerate() {
            pred += c * (w[t - j - 1] - mean);
        }
        for (j, &c) in theta.iter().enumerate() {
            if t > j {
                pred += c * e[t - j - 1];
            }
        }
        e[t] = (w[t] - mean) - pred;
        if t >= sum_from {
            sse += e[t] * e[t];
        }
    }

    (sse, e)
}

/// ARIMA model for time series forecasting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arima {
    spec: ArimaSpec,
    /// Minimum number of differenced observations skipped before the sum of squares
    conditioning: usize,
    coefficients: Coefficients,
    sigma2: f64,
    /// Original data (for undifferencing)
    original_data: Vec<f64>,
    /// Innovations aligned to `original_data[residual_offset..]`
    residuals: Vec<f64>,
    residual_offset: usize,
    summary: Option<FitSummary>,
    fitted: bool,
}

impl Arima {
    /// Create a non-seasonal ARIMA model with specified orders
    ///
    /// # Arguments
    ///
    /// * `p` - Order of autoregressive component (0-10)
    /// * `d` - Degree of differencing (0-2)
    /// * `q` - Order of moving average component (0-10)
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        Self::with_spec(ArimaSpec::new(p, d, q))
    }

    /// Create a model from a full specification
    pub fn with_spec(spec: ArimaSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            conditioning: 0,
            coefficients: Coefficients::default(),
            sigma2: f64::NAN,
            original_data: Vec::new(),
            residuals: Vec::new(),
            residual_offset: 0,
            summary: None,
            fitted: false,
        })
    }

    /// Start the sum of squares at least `skip` differenced observations in.
    ///
    /// Models fitted with the same conditioning share an estimation sample,
    /// which keeps their information criteria comparable.
    pub fn with_conditioning(mut self, skip: usize) -> Self {
        self.conditioning = skip;
        self
    }

    pub fn spec(&self) -> &ArimaSpec {
        &self.spec
    }

    /// Get model parameters
    pub fn params(&self) -> (usize, usize, usize) {
        (self.spec.order.p, self.spec.order.d, self.spec.order.q)
    }

    /// Get AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients.ar
    }

    /// Get MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients.ma
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        &self.coefficients.sar
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        &self.coefficients.sma
    }

    /// Estimation summary, available after fitting
    pub fn summary(&self) -> Option<&FitSummary> {
        self.summary.as_ref()
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// In-sample innovations, starting at [`Arima::residual_offset`]
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Index in the fitted series of the first residual
    pub fn residual_offset(&self) -> usize {
        self.residual_offset
    }

    /// One-step-ahead fitted values; `NaN` where no residual exists
    pub fn fitted_values(&self) -> Vec<f64> {
        let mut fitted = vec![f64::NAN; self.original_data.len()];
        for (i, e) in self.residuals.iter().enumerate() {
            let t = self.residual_offset + i;
            fitted[t] = self.original_data[t] - e;
        }
        fitted
    }

    fn period(&self) -> usize {
        self.spec.seasonal_part().map(|s| s.period).unwrap_or(1)
    }

    fn differenced(&self, data: &[f64]) -> Vec<f64> {
        let mut w = difference(data, self.spec.order.d);
        if let Some(s) = self.spec.seasonal_part() {
            for _ in 0..s.d {
                w = seasonal_difference(&w, s.period);
            }
        }
        w
    }

    /// Split a flat vector in estimation order into its blocks
    fn blocks<'a>(&self, flat: &'a [f64]) -> [&'a [f64]; 5] {
        let ArimaOrder { p, q, .. } = self.spec.order;
        let (sp, sq) = self
            .spec
            .seasonal_part()
            .map(|s| (s.p, s.q))
            .unwrap_or((0, 0));
        let (ar, rest) = flat.split_at(p);
        let (ma, rest) = rest.split_at(q);
        let (sar, rest) = rest.split_at(sp);
        let (sma, mean) = rest.split_at(sq);
        [ar, ma, sar, sma, mean]
    }

    /// Coefficients from the unconstrained optimizer scale
    fn unpack(&self, u: &[f64]) -> Coefficients {
        let [ar, ma, sar, sma, mean] = self.blocks(u);
        let negate = |v: Vec<f64>| v.into_iter().map(|c| -c).collect::<Vec<f64>>();
        Coefficients {
            ar: pacf_to_ar(ar),
            ma: negate(pacf_to_ar(ma)),
            sar: pacf_to_ar(sar),
            sma: negate(pacf_to_ar(sma)),
            mean: mean.first().copied().unwrap_or(0.0),
        }
    }

    /// Coefficients from a flat vector on the natural scale
    fn split(&self, flat: &[f64]) -> Coefficients {
        let [ar, ma, sar, sma, mean] = self.blocks(flat);
        Coefficients {
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            sar: sar.to_vec(),
            sma: sma.to_vec(),
            mean: mean.first().copied().unwrap_or(0.0),
        }
    }

    fn sum_of_squares(&self, w: &[f64], c: &Coefficients, sum_from: usize) -> (f64, Vec<f64>) {
        let period = self.period();
        let phi = expand_ar(&c.ar, &c.sar, period);
        let theta = expand_ma(&c.ma, &c.sma, period);
        css_residuals(w, &phi, &theta, c.mean, self.spec.ar_span(), sum_from)
    }

    /// Numerical standard errors from the Hessian of the negative
    /// concentrated log-likelihood in coefficient space.
    fn standard_errors(&self, w: &[f64], c: &Coefficients, sum_from: usize) -> Option<Vec<f64>> {
        let x = c.flatten(self.spec.has_mean());
        let k = x.len();
        if k == 0 {
            return Some(Vec::new());
        }
        let n_used = (w.len() - sum_from) as f64;
        let nll = |v: &[f64]| {
            let (sse, _) = self.sum_of_squares(w, &self.split(v), sum_from);
            0.5 * n_used * ((2.0 * PI * sse / n_used).ln() + 1.0)
        };

        let h: Vec<f64> = x.iter().map(|v| 1e-4 * v.abs().max(1.0)).collect();
        let mut hessian = vec![vec![0.0; k]; k];
        for i in 0..k {
            for j in i..k {
                let shifted = |si: f64, sj: f64| {
                    let mut v = x.clone();
                    v[i] += si * h[i];
                    v[j] += sj * h[j];
                    nll(&v)
                };
                let value = (shifted(1.0, 1.0) - shifted(1.0, -1.0) - shifted(-1.0, 1.0)
                    + shifted(-1.0, -1.0))
                    / (4.0 * h[i] * h[j]);
                hessian[i][j] = value;
                hessian[j][i] = value;
            }
        }

        let cov = invert(&hessian).ok()?;
        let se: Vec<f64> = (0..k).map(|i| cov[i][i]).collect();
        if se.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return None;
        }
        Some(se.into_iter().map(f64::sqrt).collect())
    }

    /// Forecast `steps` ahead with intervals at each of `levels` (in (0, 1))
    pub fn forecast(&self, steps: usize, levels: &[f64]) -> Result<Forecast> {
        if !self.fitted {
            return Err(TsError::NotFitted);
        }
        if let Some(bad) = levels.iter().find(|l| !(**l > 0.0 && **l < 1.0)) {
            return Err(TsError::invalid_parameter(
                "level",
                format!("{} is not in (0, 1)", bad),
            ));
        }
        if steps == 0 {
            return Ok(Forecast {
                mean: Vec::new(),
                se: Vec::new(),
                intervals: levels
                    .iter()
                    .map(|&level| PredictionInterval {
                        level,
                        lower: Vec::new(),
                        upper: Vec::new(),
                    })
                    .collect(),
            });
        }

        let period = self.period();
        let c = &self.coefficients;

        // AR polynomial on the original scale, differencing folded in
        let mut ar_poly = lag_poly(&expand_ar(&c.ar, &c.sar, period), 1, -1.0);
        for _ in 0..self.spec.order.d {
            ar_poly = poly_mul(&ar_poly, &[1.0, -1.0]);
        }
        if let Some(s) = self.spec.seasonal_part() {
            for _ in 0..s.d {
                ar_poly = poly_mul(&ar_poly, &lag_poly(&[1.0], s.period, -1.0));
            }
        }
        let phi: Vec<f64> = ar_poly[1..].iter().map(|v| -v).collect();
        let theta = expand_ma(&c.ma, &c.sma, period);

        let n = self.original_data.len();
        let mut z: Vec<f64> = self.original_data.iter().map(|x| x - c.mean).collect();
        let mut e = vec![0.0; n];
        e[self.residual_offset..].copy_from_slice(&self.residuals);

        for _ in 0..steps {
            let t = z.len();
            let mut pred = 0.0;
            for (k, &a) in phi.iter().enumerate() {
                if t > k {
                    pred += a * z[t - k - 1];
                }
            }
            for (j, &b) in theta.iter().enumerate() {
                if t > j {
                    pred += b * e[t - j - 1];
                }
            }
            z.push(pred);
            e.push(0.0);
        }
        let mean: Vec<f64> = z[n..].iter().map(|v| v + c.mean).collect();

        // psi weights of the integrated model
        let mut psi = vec![1.0; steps];
        for j in 1..steps {
            let mut value = theta.get(j - 1).copied().unwrap_or(0.0);
            for k in 1..=j.min(phi.len()) {
                value += phi[k - 1] * psi[j - k];
            }
            psi[j] = value;
        }
        let mut cumulative = 0.0;
        let se: Vec<f64> = psi
            .iter()
            .map(|p| {
                cumulative += p * p;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect();

        let intervals = levels
            .iter()
            .map(|&level| {
                let z = z_critical(level);
                PredictionInterval {
                    level,
                    lower: mean.iter().zip(&se).map(|(m, s)| m - z * s).collect(),
                    upper: mean.iter().zip(&se).map(|(m, s)| m + z * s).collect(),
                }
            })
            .collect();

        Ok(Forecast {
            mean,
            se,
            intervals,
        })
    }
}

impl Predictor for Arima {
    fn fit(&mut self, data: &[f64]) -> Result<()> {
        let min_required = self.spec.min_observations();
        if data.len() < min_required {
            return Err(TsError::InsufficientData {
                required: min_required,
                actual: data.len(),
            });
        }

        // Check for invalid values
        if data.iter().any(|x| x.is_nan() || x.is_infinite()) {
            return Err(TsError::InvalidData(
                "Data contains NaN or infinite values".to_string(),
            ));
        }

        let w = self.differenced(data);
        let ncond = self.spec.ar_span();
        let sum_from = ncond.max(self.conditioning);
        let n_coef = self.spec.n_coefficients();
        if w.len() < sum_from + n_coef + 3 {
            return Err(TsError::InsufficientData {
                required: data.len() + sum_from + n_coef + 3 - w.len(),
                actual: data.len(),
            });
        }
        let n_used = w.len() - sum_from;

        let w_mean = w.iter().sum::<f64>() / w.len() as f64;
        let mut x0 = vec![0.0; n_coef];
        if self.spec.has_mean() {
            x0[n_coef - 1] = w_mean;
        }

        let objective = |u: &[f64]| {
            let (sse, _) = self.sum_of_squares(&w, &self.unpack(u), sum_from);
            0.5 * (sse / n_used as f64).ln()
        };
        let config = NelderMeadConfig {
            max_iterations: 500 * (n_coef + 1),
            ..NelderMeadConfig::default()
        };
        let min = nelder_mead(objective, &x0, &config);
        if !min.value.is_finite() {
            return Err(TsError::ConvergenceFailure {
                iterations: min.iterations,
            });
        }
        if !min.converged {
            tracing::warn!(
                spec = %self.spec,
                iterations = min.iterations,
                "optimizer stopped at the iteration limit"
            );
        }

        let coefficients = self.unpack(&min.x);
        let (sse, e) = self.sum_of_squares(&w, &coefficients, sum_from);
        let sigma2 = sse / n_used as f64;
        if !(sigma2.is_finite() && sigma2 > 0.0) {
            return Err(TsError::NumericalError(format!(
                "innovation variance {} is not positive",
                sigma2
            )));
        }

        let n_f = n_used as f64;
        let log_likelihood = -0.5 * n_f * ((2.0 * PI * sigma2).ln() + 1.0);
        let npar = (n_coef + 1) as f64;
        let aic = -2.0 * log_likelihood + 2.0 * npar;
        let aicc = if n_f - npar - 1.0 > 0.0 {
            aic + 2.0 * npar * (npar + 1.0) / (n_f - npar - 1.0)
        } else {
            f64::INFINITY
        };
        let bic = -2.0 * log_likelihood + npar * n_f.ln();
        let std_errors = self.standard_errors(&w, &coefficients, sum_from);

        let span = self.spec.differencing_span();
        self.original_data = data.to_vec();
        self.residual_offset = span + ncond;
        self.residuals = e[ncond..].to_vec();
        self.sigma2 = sigma2;
        self.summary = Some(FitSummary {
            spec: self.spec,
            ar: coefficients.ar.clone(),
            ma: coefficients.ma.clone(),
            seasonal_ar: coefficients.sar.clone(),
            seasonal_ma: coefficients.sma.clone(),
            mean: self.spec.has_mean().then_some(coefficients.mean),
            sigma2,
            log_likelihood,
            aic,
            aicc,
            bic,
            n_used,
            std_errors,
        });
        self.coefficients = coefficients;
        self.fitted = true;

        tracing::debug!(spec = %self.spec, sigma2, aicc, "fitted ARIMA");
        Ok(())
    }

    fn predict(&self, steps: usize) -> Result<Vec<f64>> {
        Ok(self.forecast(steps, &[])?.mean)
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}
