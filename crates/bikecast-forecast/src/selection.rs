//! Automatic ARIMA order selection
//!
//! Chooses the differencing orders with unit-root and seasonal-strength
//! tests, then searches AR/MA orders by information criterion, either
//! stepwise from a few starting models or over the full grid.

use std::collections::HashSet;

use bikecast_core::algorithms::arima::{Arima, ArimaSpec, FitSummary, SeasonalOrder};
use bikecast_core::algorithms::Predictor;
use bikecast_core::diagnostics::ndiffs;
use bikecast_core::utils::preprocessing::seasonal_difference;
use bikecast_core::{Result, TsError};
use serde::{Deserialize, Serialize};

use crate::seasonality::{nsdiffs, SEASONAL_STRENGTH_THRESHOLD};

/// Information criterion minimized by the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InformationCriterion {
    Aic,
    Aicc,
    Bic,
}

impl InformationCriterion {
    pub fn score(&self, summary: &FitSummary) -> f64 {
        match self {
            InformationCriterion::Aic => summary.aic,
            InformationCriterion::Aicc => summary.aicc,
            InformationCriterion::Bic => summary.bic,
        }
    }
}

/// Search limits and switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoArimaConfig {
    pub max_p: usize,
    pub max_q: usize,
    pub max_seasonal_p: usize,
    pub max_seasonal_q: usize,
    /// Upper bound on `p + q + P + Q` in the full-grid search
    pub max_order: usize,
    pub max_d: usize,
    pub max_seasonal_d: usize,
    /// Fixed differencing order instead of the KPSS choice
    pub d: Option<usize>,
    /// Fixed seasonal differencing order instead of the strength heuristic
    pub seasonal_d: Option<usize>,
    pub seasonal: bool,
    pub period: usize,
    pub stepwise: bool,
    pub max_models: usize,
    pub criterion: InformationCriterion,
    /// Significance level of the unit-root tests
    pub alpha: f64,
}

impl Default for AutoArimaConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_q: 5,
            max_seasonal_p: 2,
            max_seasonal_q: 2,
            max_order: 5,
            max_d: 2,
            max_seasonal_d: 1,
            d: None,
            seasonal_d: None,
            seasonal: true,
            period: 1,
            stepwise: true,
            max_models: 94,
            criterion: InformationCriterion::Aicc,
            alpha: 0.05,
        }
    }
}

impl AutoArimaConfig {
    /// Non-seasonal search
    pub fn non_seasonal() -> Self {
        Self {
            seasonal: false,
            ..Self::default()
        }
    }

    /// Seasonal search at `period`
    pub fn seasonal(period: usize) -> Self {
        Self {
            seasonal: true,
            period,
            ..Self::default()
        }
    }

    fn is_seasonal(&self) -> bool {
        self.seasonal && self.period >= 2
    }
}

/// A model tried during the search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub spec: ArimaSpec,
    pub score: f64,
}

/// Outcome of [`auto_arima`]
#[derive(Debug, Clone)]
pub struct Selection {
    /// Winning model refitted on the full sample
    pub model: Arima,
    pub spec: ArimaSpec,
    /// Every model that fitted, in the order tried
    pub candidates: Vec<Candidate>,
}

struct Search<'a> {
    data: &'a [f64],
    config: &'a AutoArimaConfig,
    conditioning: usize,
    visited: HashSet<ArimaSpec>,
    candidates: Vec<Candidate>,
    last_error: Option<TsError>,
}

impl<'a> Search<'a> {
    fn within_limits(&self, spec: &ArimaSpec) -> bool {
        let (sp, sq) = spec.seasonal.map(|s| (s.p, s.q)).unwrap_or((0, 0));
        spec.order.p <= self.config.max_p
            && spec.order.q <= self.config.max_q
            && sp <= self.config.max_seasonal_p
            && sq <= self.config.max_seasonal_q
            && (self.config.stepwise
                || spec.order.p + spec.order.q + sp + sq <= self.config.max_order)
    }

    fn exhausted(&self) -> bool {
        self.visited.len() >= self.config.max_models
    }

    /// Fit `spec` once; `None` when skipped or failed
    fn try_spec(&mut self, spec: ArimaSpec) -> Option<f64> {
        if !self.within_limits(&spec) || self.exhausted() || !self.visited.insert(spec) {
            return None;
        }

        let fitted = Arima::with_spec(spec).and_then(|model| {
            let mut model = model.with_conditioning(self.conditioning);
            model.fit(self.data)?;
            Ok(model)
        });
        match fitted {
            Ok(model) => {
                let summary = model.summary()?;
                let score = self.config.criterion.score(summary);
                tracing::debug!(spec = %spec, score, "candidate model");
                self.candidates.push(Candidate { spec, score });
                score.is_finite().then_some(score)
            }
            Err(err) => {
                tracing::warn!(spec = %spec, error = %err, "skipping candidate model");
                self.last_error = Some(err);
                None
            }
        }
    }
}

/// Fit `spec` and keep it when it beats `best`
fn consider(search: &mut Search<'_>, spec: ArimaSpec, best: &mut Option<(ArimaSpec, f64)>) -> bool {
    match search.try_spec(spec) {
        Some(score) if best.map_or(true, |(_, b)| score < b) => {
            *best = Some((spec, score));
            true
        }
        _ => false,
    }
}

fn make_spec(
    (p, d, q): (usize, usize, usize),
    (sp, sd, sq): (usize, usize, usize),
    period: Option<usize>,
    include_mean: bool,
) -> ArimaSpec {
    let spec = ArimaSpec::new(p, d, q).with_mean(include_mean);
    match period {
        Some(s) => spec.with_seasonal(sp, sd, sq, s),
        None => spec,
    }
}

/// Select and fit an ARIMA model for `data`
pub fn auto_arima(data: &[f64], config: &AutoArimaConfig) -> Result<Selection> {
    if data.iter().any(|x| !x.is_finite()) {
        return Err(TsError::InvalidData(
            "Data contains NaN or infinite values".to_string(),
        ));
    }
    if config.max_models == 0 {
        return Err(TsError::InvalidParameter {
            name: "max_models".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let period = config.is_seasonal().then_some(config.period);
    let seasonal_d = match period {
        Some(s) => match config.seasonal_d {
            Some(fixed) => fixed,
            None => nsdiffs(data, s, SEASONAL_STRENGTH_THRESHOLD)?,
        }
        .min(config.max_seasonal_d),
        None => 0,
    };
    let mut adjusted = data.to_vec();
    if let Some(s) = period {
        for _ in 0..seasonal_d {
            adjusted = seasonal_difference(&adjusted, s);
        }
    }
    let d = match config.d {
        Some(d) => d.min(config.max_d),
        None => ndiffs(&adjusted, config.alpha, config.max_d)?,
    };
    let allow_mean = d + seasonal_d == 0;
    tracing::info!(d, seasonal_d, ?period, "selected differencing orders");

    let differenced_len = adjusted.len().saturating_sub(d);
    let conditioning = (config.max_p + period.unwrap_or(0) * config.max_seasonal_p)
        .min(differenced_len / 4);

    let mut search = Search {
        data,
        config,
        conditioning,
        visited: HashSet::new(),
        candidates: Vec::new(),
        last_error: None,
    };

    let seasonal_start = |sp: usize, sq: usize| {
        if period.is_some() {
            (sp.min(config.max_seasonal_p), seasonal_d, sq.min(config.max_seasonal_q))
        } else {
            (0, 0, 0)
        }
    };

    let mut best: Option<(ArimaSpec, f64)> = None;

    if config.stepwise {
        let starts = [
            ((2, 2), (1, 1)),
            ((0, 0), (0, 0)),
            ((1, 0), (1, 0)),
            ((0, 1), (0, 1)),
        ];
        for ((p, q), (sp, sq)) in starts {
            let spec = make_spec(
                (p.min(config.max_p), d, q.min(config.max_q)),
                seasonal_start(sp, sq),
                period,
                allow_mean,
            );
            consider(&mut search, spec, &mut best);
        }

        while let Some((current, _)) = best {
            if search.exhausted() {
                break;
            }
            let mut improved = false;
            for neighbour in neighbours(&current, allow_mean) {
                if consider(&mut search, neighbour, &mut best) {
                    improved = true;
                    break;
                }
            }
            if !improved {
                break;
            }
        }
    } else {
        let (sp_max, sq_max) = if period.is_some() {
            (config.max_seasonal_p, config.max_seasonal_q)
        } else {
            (0, 0)
        };
        for p in 0..=config.max_p {
            for q in 0..=config.max_q {
                for sp in 0..=sp_max {
                    for sq in 0..=sq_max {
                        let spec =
                            make_spec((p, d, q), (sp, seasonal_d, sq), period, allow_mean);
                        consider(&mut search, spec, &mut best);
                    }
                }
            }
        }
    }

    let Some((spec, score)) = best else {
        return Err(search.last_error.unwrap_or(TsError::InsufficientData {
            required: ArimaSpec::new(0, d, 0).min_observations(),
            actual: data.len(),
        }));
    };

    let mut model = Arima::with_spec(spec)?;
    model.fit(data)?;
    tracing::info!(
        spec = %spec,
        score,
        models = search.candidates.len(),
        "selected ARIMA model"
    );

    Ok(Selection {
        model,
        spec,
        candidates: search.candidates,
    })
}

/// Models one step away from `spec`, seasonal moves first
fn neighbours(spec: &ArimaSpec, allow_mean: bool) -> Vec<ArimaSpec> {
    let step = |v: usize, delta: i32| -> Option<usize> {
        let moved = v as i32 + delta;
        (moved >= 0).then_some(moved as usize)
    };
    let moves: [(i32, i32); 8] = [
        (-1, 0),
        (1, 0),
        (0, -1),
        (0, 1),
        (-1, -1),
        (1, 1),
        (-1, 1),
        (1, -1),
    ];

    let mut out = Vec::new();
    if let Some(seasonal) = spec.seasonal {
        for (dp, dq) in moves {
            if let (Some(sp), Some(sq)) = (step(seasonal.p, dp), step(seasonal.q, dq)) {
                let mut next = *spec;
                next.seasonal = Some(SeasonalOrder {
                    p: sp,
                    q: sq,
                    ..seasonal
                });
                out.push(next);
            }
        }
    }
    for (dp, dq) in moves {
        if let (Some(p), Some(q)) = (step(spec.order.p, dp), step(spec.order.q, dq)) {
            let mut next = *spec;
            next.order.p = p;
            next.order.q = q;
            out.push(next);
        }
    }
    if allow_mean {
        out.push(spec.with_mean(!spec.include_mean));
    }
    out
}
