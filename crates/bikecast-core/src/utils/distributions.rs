//! Distribution functions used by the statistical tests

use std::f64::consts::{PI, SQRT_2};

/// Error function (Abramowitz & Stegun 7.1.26, |error| < 1.5e-7)
pub fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }
    0.5 * (1.0 + erf(x / SQRT_2))
}

/// Standard normal quantile (Acklam's rational approximation)
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383_577_518_672_69e2,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -normal_quantile(1.0 - p)
    }
}

/// Two-sided critical value for a confidence level in (0, 1)
pub fn z_critical(level: f64) -> f64 {
    normal_quantile(0.5 + level / 2.0)
}

/// Natural log of the gamma function (Lanczos, g = 7)
pub fn ln_gamma(x: f64) -> f64 {
    const COEF: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.5203681218851,
        -1259.1392167224028,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507343278686905,
        -0.13857109526572012,
        9.984_369_578_019_572e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let mut a = COEF[0];
    let t = x + 7.5;
    for (i, c) in COEF.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    0.5 * (2.0 * PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

/// Regularized upper incomplete gamma Q(a, x)
pub fn gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        1.0 - gamma_p_series(a, x)
    } else {
        gamma_q_continued_fraction(a, x)
    }
}

fn gamma_p_series(a: f64, x: f64) -> f64 {
    let mut sum = 1.0 / a;
    let mut term = sum;
    let mut ap = a;
    for _ in 0..500 {
        ap += 1.0;
        term *= x / ap;
        sum += term;
        if term.abs() < sum.abs() * 1e-15 {
            break;
        }
    }
    sum * (-x + a * x.ln() - ln_gamma(a)).exp()
}

fn gamma_q_continued_fraction(a: f64, x: f64) -> f64 {
    const TINY: f64 = 1e-300;
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / TINY;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..500 {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < TINY {
            d = TINY;
        }
        c = b + an / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < 1e-15 {
            break;
        }
    }
    (-x + a * x.ln() - ln_gamma(a)).exp() * h
}

/// Upper tail probability of the chi-squared distribution
pub fn chi_squared_sf(x: f64, df: f64) -> f64 {
    if df <= 0.0 {
        return f64::NAN;
    }
    gamma_q(df / 2.0, x / 2.0).clamp(0.0, 1.0)
}

/// Linear interpolation in a table sorted by `xs`, clamped at both ends
pub fn interpolate_clamped(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let ascending = xs[0] <= xs[xs.len() - 1];
    let (first, last) = if ascending {
        (0, xs.len() - 1)
    } else {
        (xs.len() - 1, 0)
    };
    if x <= xs[first] {
        return ys[first];
    }
    if x >= xs[last] {
        return ys[last];
    }
    for i in 0..xs.len() - 1 {
        let (x0, x1) = (xs[i], xs[i + 1]);
        let inside = if x0 <= x1 {
            x >= x0 && x <= x1
        } else {
            x <= x0 && x >= x1
        };
        if inside {
            if (x1 - x0).abs() < f64::EPSILON {
                return ys[i];
            }
            return ys[i] + (x - x0) / (x1 - x0) * (ys[i + 1] - ys[i]);
        }
    }
    ys[last]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_cdf_symmetry() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-9);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-4);
        assert!((normal_cdf(-1.0) + normal_cdf(1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normal_quantile_known_values() {
        assert!((normal_quantile(0.975) - 1.959964).abs() < 1e-5);
        assert!((normal_quantile(0.9) - 1.281552).abs() < 1e-5);
        assert!((normal_quantile(0.01) + 2.326348).abs() < 1e-5);
        assert!(normal_quantile(0.5).abs() < 1e-12);
    }

    #[test]
    fn test_z_critical() {
        assert!((z_critical(0.95) - 1.959964).abs() < 1e-5);
        assert!((z_critical(0.80) - 1.281552).abs() < 1e-5);
    }

    #[test]
    fn test_ln_gamma_factorials() {
        assert!(ln_gamma(1.0).abs() < 1e-10);
        assert!((ln_gamma(5.0) - 24.0f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn test_chi_squared_sf_known_values() {
        // 95th percentiles of chi-squared with 1 and 10 degrees of freedom
        assert!((chi_squared_sf(3.841459, 1.0) - 0.05).abs() < 1e-5);
        assert!((chi_squared_sf(18.307038, 10.0) - 0.05).abs() < 1e-5);
        assert!((chi_squared_sf(0.0, 3.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate_clamped_both_orders() {
        let xs = [1.0, 2.0, 4.0];
        let ys = [10.0, 20.0, 40.0];
        assert_eq!(interpolate_clamped(&xs, &ys, 3.0), 30.0);
        assert_eq!(interpolate_clamped(&xs, &ys, 0.0), 10.0);
        assert_eq!(interpolate_clamped(&xs, &ys, 9.0), 40.0);

        let stats = [-4.0, -3.0, -1.0];
        let p = [0.01, 0.05, 0.9];
        assert!((interpolate_clamped(&stats, &p, -3.5) - 0.03).abs() < 1e-12);

        let shrinking = [500.0, 100.0, 25.0];
        assert_eq!(interpolate_clamped(&shrinking, &ys, 50.0), 20.0 + (50.0 - 100.0) / (25.0 - 100.0) * 20.0);
    }
}
