//! Time series decomposition
//!
//! Seasonal-trend decomposition by loess (STL, Cleveland et al. 1990) and the
//! classical moving-average decomposition. Both split a series additively
//! into trend, seasonal and remainder components.

use bikecast_core::algorithms::moving_average::centered_moving_average;
use bikecast_core::{Result, TsError};
use serde::{Deserialize, Serialize};

/// Decomposed time series components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<f64>,
}

/// How the weekly average is split into trend and seasonal parts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecompositionMethod {
    #[default]
    Stl,
    /// Moving-average trend with a per-position seasonal mean
    Classical,
}

impl std::fmt::Display for DecompositionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecompositionMethod::Stl => write!(f, "stl"),
            DecompositionMethod::Classical => write!(f, "classical"),
        }
    }
}

impl std::str::FromStr for DecompositionMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stl" => Ok(DecompositionMethod::Stl),
            "classical" => Ok(DecompositionMethod::Classical),
            other => Err(format!(
                "unknown decomposition method '{}' (expected stl or classical)",
                other
            )),
        }
    }
}

/// Span of the seasonal smoother
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalWindow {
    /// Seasonal pattern identical in every cycle
    Periodic,
    /// Loess span in cycles (rounded up to odd)
    Span(usize),
}

/// STL settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StlConfig {
    pub period: usize,
    pub seasonal_window: SeasonalWindow,
    /// Defaults to `nextodd(1.5 period / (1 - 1.5 / seasonal_window))`
    pub trend_window: Option<usize>,
    /// Defaults to `nextodd(period)`
    pub low_pass_window: Option<usize>,
    pub inner: usize,
    pub outer: usize,
    pub robust: bool,
}

impl StlConfig {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            seasonal_window: SeasonalWindow::Periodic,
            trend_window: None,
            low_pass_window: None,
            inner: 2,
            outer: 0,
            robust: false,
        }
    }

    pub fn with_seasonal_window(mut self, window: SeasonalWindow) -> Self {
        self.seasonal_window = window;
        self
    }

    /// Downweight outliers with bisquare weights over 15 outer passes
    pub fn robust(mut self) -> Self {
        self.robust = true;
        self.inner = 1;
        self.outer = 15;
        self
    }
}

fn nextodd(x: usize) -> usize {
    if x % 2 == 0 {
        x + 1
    } else {
        x
    }
}

/// Local weighted regression of `y` (at positions `0..n`) evaluated at
/// `xs` from the points `left..=right`. `None` when every weight is zero.
fn loess_at(
    y: &[f64],
    span: usize,
    degree: usize,
    xs: f64,
    left: usize,
    right: usize,
    robustness: Option<&[f64]>,
) -> Option<f64> {
    let n = y.len();
    let range = n as f64 - 1.0;
    let mut h = (xs - left as f64).max(right as f64 - xs);
    if span > n {
        h += ((span - n) / 2) as f64;
    }
    let h9 = 0.999 * h;
    let h1 = 0.001 * h;

    let mut w = vec![0.0; right - left + 1];
    let mut total = 0.0;
    for j in left..=right {
        let r = (j as f64 - xs).abs();
        if r <= h9 {
            let mut wj = if r <= h1 {
                1.0
            } else {
                (1.0 - (r / h).powi(3)).powi(3)
            };
            if let Some(rw) = robustness {
                wj *= rw[j];
            }
            w[j - left] = wj;
            total += wj;
        }
    }
    if total <= 0.0 {
        return None;
    }
    for wj in w.iter_mut() {
        *wj /= total;
    }

    if h > 0.0 && degree > 0 {
        let a: f64 = w
            .iter()
            .enumerate()
            .map(|(i, wj)| wj * (left + i) as f64)
            .sum();
        let c: f64 = w
            .iter()
            .enumerate()
            .map(|(i, wj)| wj * ((left + i) as f64 - a).powi(2))
            .sum();
        if c.sqrt() > 0.001 * range {
            let b = (xs - a) / c;
            for (i, wj) in w.iter_mut().enumerate() {
                *wj *= b * ((left + i) as f64 - a) + 1.0;
            }
        }
    }

    Some(w.iter().zip(&y[left..=right]).map(|(wj, yj)| wj * yj).sum())
}

/// Loess smooth evaluated at every position
fn loess_smooth(y: &[f64], span: usize, degree: usize, robustness: Option<&[f64]>) -> Vec<f64> {
    let n = y.len();
    if n < 2 {
        return y.to_vec();
    }

    let mut out = Vec::with_capacity(n);
    let (mut left, mut right) = if span >= n { (0, n - 1) } else { (0, span - 1) };
    let half = (span + 1) / 2;
    for i in 0..n {
        if span < n && i + 1 > half && right != n - 1 {
            left += 1;
            right += 1;
        }
        let value = loess_at(y, span, degree, i as f64, left, right, robustness).unwrap_or(y[i]);
        out.push(value);
    }
    out
}

/// Smooth each cycle-subseries and extend it one cycle at both ends.
///
/// The result has `n + 2 * period` values.
fn smooth_cycle_subseries(
    data: &[f64],
    period: usize,
    span: usize,
    degree: usize,
    robustness: Option<&[f64]>,
) -> Vec<f64> {
    let mut out = vec![0.0; data.len() + 2 * period];

    for j in 0..period {
        let sub: Vec<f64> = data.iter().skip(j).step_by(period).copied().collect();
        let sub_rw: Option<Vec<f64>> =
            robustness.map(|rw| rw.iter().skip(j).step_by(period).copied().collect());
        let sub_rw = sub_rw.as_deref();
        let k = sub.len();

        let smoothed = loess_smooth(&sub, span, degree, sub_rw);
        let first = loess_at(&sub, span, degree, -1.0, 0, span.min(k) - 1, sub_rw)
            .unwrap_or(smoothed[0]);
        let last = loess_at(&sub, span, degree, k as f64, k.saturating_sub(span), k - 1, sub_rw)
            .unwrap_or(smoothed[k - 1]);

        out[j] = first;
        for (m, value) in smoothed.iter().enumerate() {
            out[(m + 1) * period + j] = *value;
        }
        out[(k + 1) * period + j] = last;
    }

    out
}

/// Trailing moving average of `window`, length `n - window + 1`
fn moving_sum_average(data: &[f64], window: usize) -> Vec<f64> {
    data.windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Seasonal-trend decomposition by loess.
///
/// ```rust
/// use bikecast_forecast::{stl, StlConfig};
///
/// let pattern = [3.0, -1.0, -2.0, 0.0];
/// let data: Vec<f64> = (0..40).map(|t| 20.0 + pattern[t % 4]).collect();
/// let parts = stl(&data, &StlConfig::new(4)).unwrap();
/// assert!((parts.seasonal[0] - 3.0).abs() < 1e-9);
/// ```
pub fn stl(data: &[f64], config: &StlConfig) -> Result<DecompositionResult> {
    let n = data.len();
    let period = config.period;
    if period < 2 {
        return Err(TsError::InvalidParameter {
            name: "period".to_string(),
            reason: "must be at least 2".to_string(),
        });
    }
    if n < 2 * period {
        return Err(TsError::InsufficientData {
            required: 2 * period,
            actual: n,
        });
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(TsError::InvalidData(
            "Data contains NaN or infinite values".to_string(),
        ));
    }

    let (seasonal_span, periodic) = match config.seasonal_window {
        SeasonalWindow::Periodic => (10 * n + 1, true),
        SeasonalWindow::Span(span) => (nextodd(span).max(3), false),
    };
    let trend_span = config
        .trend_window
        .unwrap_or_else(|| {
            (1.5 * period as f64 / (1.0 - 1.5 / seasonal_span as f64)).ceil() as usize
        });
    let trend_span = nextodd(trend_span).max(3);
    let low_pass_span = nextodd(config.low_pass_window.unwrap_or(period)).max(3);

    let mut trend = vec![0.0; n];
    let mut seasonal = vec![0.0; n];
    let mut weights: Option<Vec<f64>> = None;

    for pass in 0..=config.outer {
        for _ in 0..config.inner.max(1) {
            let detrended: Vec<f64> = data.iter().zip(&trend).map(|(y, t)| y - t).collect();
            let cycle =
                smooth_cycle_subseries(&detrended, period, seasonal_span, 0, weights.as_deref());

            let low = moving_sum_average(&cycle, period);
            let low = moving_sum_average(&low, period);
            let low = moving_sum_average(&low, 3);
            let low = loess_smooth(&low, low_pass_span, 1, None);

            for i in 0..n {
                seasonal[i] = cycle[period + i] - low[i];
            }
            let deseasonal: Vec<f64> = data.iter().zip(&seasonal).map(|(y, s)| y - s).collect();
            trend = loess_smooth(&deseasonal, trend_span, 1, weights.as_deref());
        }

        if pass < config.outer {
            weights = Some(robustness_weights(data, &trend, &seasonal));
        }
    }

    if periodic {
        let mut means = vec![0.0; period];
        let mut counts = vec![0usize; period];
        for (i, s) in seasonal.iter().enumerate() {
            means[i % period] += s;
            counts[i % period] += 1;
        }
        for (m, c) in means.iter_mut().zip(&counts) {
            *m /= *c as f64;
        }
        for (i, s) in seasonal.iter_mut().enumerate() {
            *s = means[i % period];
        }
    }

    let residual = data
        .iter()
        .zip(&trend)
        .zip(&seasonal)
        .map(|((y, t), s)| y - t - s)
        .collect();

    tracing::debug!(
        period,
        seasonal_span,
        trend_span,
        low_pass_span,
        "STL decomposition"
    );

    Ok(DecompositionResult {
        trend,
        seasonal,
        residual,
    })
}

/// Bisquare weights of the remainder scaled by six median absolute residuals
fn robustness_weights(data: &[f64], trend: &[f64], seasonal: &[f64]) -> Vec<f64> {
    let abs_res: Vec<f64> = data
        .iter()
        .zip(trend)
        .zip(seasonal)
        .map(|((y, t), s)| (y - t - s).abs())
        .collect();
    let mut sorted = abs_res.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };
    let h = 6.0 * median;

    abs_res
        .iter()
        .map(|r| {
            if *r <= 0.001 * h {
                1.0
            } else if *r <= 0.999 * h {
                (1.0 - (r / h).powi(2)).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}

/// Perform additive decomposition
///
/// Trend is the centered moving average of `period` (`NaN` at the edges);
/// the seasonal figure is the per-position mean of the detrended series,
/// centered to sum to zero.
pub fn decompose_additive(data: &[f64], period: usize) -> Result<DecompositionResult> {
    if period < 2 {
        return Err(TsError::InvalidParameter {
            name: "period".to_string(),
            reason: "must be at least 2".to_string(),
        });
    }
    if data.len() < 2 * period {
        return Err(TsError::InsufficientData {
            required: 2 * period,
            actual: data.len(),
        });
    }

    let trend = centered_moving_average(data, period)?;

    // Detrend
    let detrended: Vec<f64> = data.iter().zip(trend.iter()).map(|(d, t)| d - t).collect();

    // Seasonal component (average by period position)
    let mut figure: Vec<f64> = (0..period)
        .map(|pos| {
            let values: Vec<f64> = detrended
                .iter()
                .skip(pos)
                .step_by(period)
                .copied()
                .filter(|v| !v.is_nan())
                .collect();
            values.iter().sum::<f64>() / values.len() as f64
        })
        .collect();
    let centre = figure.iter().sum::<f64>() / period as f64;
    for f in figure.iter_mut() {
        *f -= centre;
    }
    let seasonal: Vec<f64> = (0..data.len()).map(|i| figure[i % period]).collect();

    // Residual
    let residual = data
        .iter()
        .zip(trend.iter())
        .zip(seasonal.iter())
        .map(|((d, t), s)| d - t - s)
        .collect();

    Ok(DecompositionResult {
        trend,
        seasonal,
        residual,
    })
}

/// Remove the seasonal component from `data`
pub fn seasonally_adjust(data: &[f64], decomposition: &DecompositionResult) -> Result<Vec<f64>> {
    if data.len() != decomposition.seasonal.len() {
        return Err(TsError::InvalidData(format!(
            "series has {} values but the decomposition has {}",
            data.len(),
            decomposition.seasonal.len()
        )));
    }
    Ok(data
        .iter()
        .zip(&decomposition.seasonal)
        .map(|(y, s)| y - s)
        .collect())
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

/// Strength of seasonality `max(0, 1 - var(R) / var(S + R))`.
///
/// Positions where either component is `NaN` are skipped.
pub fn seasonal_strength(decomposition: &DecompositionResult) -> f64 {
    let (remainder, detrended): (Vec<f64>, Vec<f64>) = decomposition
        .residual
        .iter()
        .zip(&decomposition.seasonal)
        .filter(|(r, s)| r.is_finite() && s.is_finite())
        .map(|(r, s)| (*r, r + s))
        .unzip();
    if remainder.len() < 2 {
        return 0.0;
    }
    let total = variance(&detrended);
    if total <= 0.0 {
        return 0.0;
    }
    (1.0 - variance(&remainder) / total).max(0.0)
}
