//! Small dense linear algebra for regression-based tests

use crate::error::{Result, TsError};

const PIVOT_EPS: f64 = 1e-12;

/// Solve `a x = b` by Gaussian elimination with partial pivoting
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = b.len();
    check_square(a, n)?;

    let mut m: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &rhs)| {
            let mut r = row.clone();
            r.push(rhs);
            r
        })
        .collect();

    let scale = max_abs(a).max(1.0);
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() < PIVOT_EPS * scale {
            return Err(TsError::NumericalError("matrix is singular".to_string()));
        }
        m.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = m[row][col] / m[col][col];
            if factor != 0.0 {
                for k in col..=n {
                    let v = m[col][k];
                    m[row][k] -= factor * v;
                }
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = ((i + 1)..n).map(|j| m[i][j] * x[j]).sum();
        x[i] = (m[i][n] - tail) / m[i][i];
    }
    Ok(x)
}

/// Invert a square matrix by Gauss-Jordan elimination
pub fn invert(a: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = a.len();
    check_square(a, n)?;

    let mut m: Vec<Vec<f64>> = a
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            r
        })
        .collect();

    let scale = max_abs(a).max(1.0);
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() < PIVOT_EPS * scale {
            return Err(TsError::NumericalError("matrix is singular".to_string()));
        }
        m.swap(col, pivot);

        let p = m[col][col];
        for v in m[col].iter_mut() {
            *v /= p;
        }
        for row in 0..n {
            if row != col {
                let factor = m[row][col];
                if factor != 0.0 {
                    for k in 0..(2 * n) {
                        let v = m[col][k];
                        m[row][k] -= factor * v;
                    }
                }
            }
        }
    }

    Ok(m.into_iter().map(|row| row[n..].to_vec()).collect())
}

fn check_square(a: &[Vec<f64>], n: usize) -> Result<()> {
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(TsError::InvalidData(format!(
            "expected a {}x{} matrix",
            n, n
        )));
    }
    Ok(())
}

fn max_abs(a: &[Vec<f64>]) -> f64 {
    a.iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |acc, v| acc.max(v.abs()))
}

/// Ordinary least squares fit
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Residual variance with `n - k` degrees of freedom
    pub sigma2: f64,
}

impl OlsFit {
    /// t-ratio of coefficient `i`
    pub fn t_stat(&self, i: usize) -> f64 {
        self.coefficients[i] / self.std_errors[i]
    }
}

/// Fit `y = X b` by least squares; `rows` holds one regressor vector per observation
pub fn ols(rows: &[Vec<f64>], y: &[f64]) -> Result<OlsFit> {
    let n = y.len();
    if rows.len() != n {
        return Err(TsError::InvalidData(format!(
            "{} regressor rows for {} observations",
            rows.len(),
            n
        )));
    }
    let k = rows.first().map(|r| r.len()).unwrap_or(0);
    if k == 0 || n <= k {
        return Err(TsError::InsufficientData {
            required: k + 1,
            actual: n,
        });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &yi) in rows.iter().zip(y) {
        for i in 0..k {
            xty[i] += row[i] * yi;
            for j in i..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    let xtx_inv = invert(&xtx)?;
    let coefficients: Vec<f64> = (0..k)
        .map(|i| (0..k).map(|j| xtx_inv[i][j] * xty[j]).sum())
        .collect();

    let residuals: Vec<f64> = rows
        .iter()
        .zip(y)
        .map(|(row, &yi)| yi - row.iter().zip(&coefficients).map(|(x, b)| x * b).sum::<f64>())
        .collect();
    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let sigma2 = sse / (n - k) as f64;
    let std_errors = (0..k).map(|i| (sigma2 * xtx_inv[i][i]).sqrt()).collect();

    Ok(OlsFit {
        coefficients,
        std_errors,
        residuals,
        sigma2,
    })
}
