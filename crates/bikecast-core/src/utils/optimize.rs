//! Derivative-free minimization

/// Nelder-Mead settings
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadConfig {
    pub max_iterations: usize,
    /// Relative tolerance on the spread of simplex values
    pub tolerance: f64,
    /// Relative tolerance on the distance of every vertex from the best one
    pub x_tolerance: f64,
    /// Offset used to build the initial simplex around the start point
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 1e-8,
            x_tolerance: 1e-6,
            initial_step: 0.1,
        }
    }
}

/// Best point found by the optimizer
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimize `f` starting at `x0`.
///
/// Non-finite objective values are treated as `+inf`, so the simplex
/// walks away from regions where the objective is undefined.
pub fn nelder_mead<F>(mut f: F, x0: &[f64], config: &NelderMeadConfig) -> Minimum
where
    F: FnMut(&[f64]) -> f64,
{
    let n = x0.len();
    let mut eval = |x: &[f64]| {
        let v = f(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    if n == 0 {
        let value = eval(x0);
        return Minimum {
            x: Vec::new(),
            value,
            iterations: 0,
            converged: true,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for i in 0..n {
        let mut point = x0.to_vec();
        point[i] += if point[i].abs() > 1e-8 {
            config.initial_step * point[i].abs().max(1.0)
        } else {
            config.initial_step
        };
        simplex.push(point);
    }
    let mut values: Vec<f64> = simplex.iter().map(|p| eval(p.as_slice())).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let best = values[0];
        let worst = values[n];
        let flat = (worst - best).abs() <= config.tolerance * (best.abs() + config.tolerance);
        // equal values on a wide simplex can straddle the minimum
        if best.is_finite() && flat && simplex_size(&simplex) <= config.x_tolerance {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|p| p[j]).sum::<f64>() / n as f64)
            .collect();
        let along = |t: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&simplex[n])
                .map(|(c, w)| c + t * (w - c))
                .collect()
        };

        let reflected = along(-1.0);
        let f_reflected = eval(reflected.as_slice());

        if f_reflected < values[0] {
            let expanded = along(-2.0);
            let f_expanded = eval(expanded.as_slice());
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
            continue;
        }

        if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
            continue;
        }

        let (contracted, f_contracted) = if f_reflected < values[n] {
            let c = along(-0.5);
            let fc = eval(c.as_slice());
            (c, fc)
        } else {
            let c = along(0.5);
            let fc = eval(c.as_slice());
            (c, fc)
        };

        if f_contracted < values[n].min(f_reflected) {
            simplex[n] = contracted;
            values[n] = f_contracted;
            continue;
        }

        let anchor = simplex[0].clone();
        for i in 1..=n {
            let shrunk: Vec<f64> = anchor
                .iter()
                .zip(&simplex[i])
                .map(|(a, p)| a + 0.5 * (p - a))
                .collect();
            values[i] = eval(shrunk.as_slice());
            simplex[i] = shrunk;
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    Minimum {
        x: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

/// Largest coordinate distance of any vertex from `simplex[0]`, relative to its magnitude
fn simplex_size(simplex: &[Vec<f64>]) -> f64 {
    let anchor = &simplex[0];
    simplex[1..]
        .iter()
        .flat_map(|p| p.iter().zip(anchor).map(|(x, a)| (x - a).abs() / (1.0 + a.abs())))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_bowl() {
        let f = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2);
        let min = nelder_mead(f, &[0.0, 0.0], &NelderMeadConfig::default());

        assert!(min.converged);
        assert!((min.x[0] - 3.0).abs() < 1e-3);
        assert!((min.x[1] + 1.0).abs() < 1e-3);
        assert!(min.value < 1e-6);
    }

    #[test]
    fn test_rosenbrock() {
        let f = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let config = NelderMeadConfig {
            max_iterations: 5000,
            ..NelderMeadConfig::default()
        };
        let min = nelder_mead(f, &[-1.2, 1.0], &config);

        assert!((min.x[0] - 1.0).abs() < 1e-2);
        assert!((min.x[1] - 1.0).abs() < 2e-2);
    }

    #[test]
    fn test_non_finite_region_avoided() {
        let f = |x: &[f64]| {
            if x[0] < 0.0 {
                f64::NAN
            } else {
                (x[0] - 0.5).powi(2)
            }
        };
        let min = nelder_mead(f, &[0.05], &NelderMeadConfig::default());
        assert!((min.x[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_equal_values_on_wide_simplex_keep_searching() {
        // the simplex passes through {0.45, 0.55}, where both values match
        let f = |x: &[f64]| (x[0] - 0.5).powi(2) + 1.0;
        let min = nelder_mead(f, &[0.05], &NelderMeadConfig::default());

        assert!(min.converged);
        assert!((min.x[0] - 0.5).abs() < 1e-4, "stopped at {}", min.x[0]);
        assert!(min.value - 1.0 < 1e-8);
    }

    #[test]
    fn test_simplex_size() {
        let simplex = vec![vec![1.0, 0.0], vec![1.5, 0.0], vec![1.0, -0.25]];
        assert!((simplex_size(&simplex) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_zero_dimensional() {
        let min = nelder_mead(|_| 4.0, &[], &NelderMeadConfig::default());
        assert_eq!(min.value, 4.0);
        assert!(min.x.is_empty());
    }
}
