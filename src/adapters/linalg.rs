//! Dense normal-equation solves for the reference adapters.

use crate::error::{CvError, Result};

/// Row-major design matrix.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Design {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Design {
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// `X^T X` as a row-major `cols x cols` matrix.
    pub fn gram(&self) -> Vec<f64> {
        let p = self.cols;
        let mut g = vec![0.0; p * p];
        for i in 0..self.rows {
            let r = self.row(i);
            for a in 0..p {
                for b in 0..=a {
                    g[a * p + b] += r[a] * r[b];
                }
            }
        }
        for a in 0..p {
            for b in 0..a {
                g[b * p + a] = g[a * p + b];
            }
        }
        g
    }

    /// `X^T y`.
    pub fn cross(&self, y: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.cols];
        for (i, &yi) in y.iter().enumerate().take(self.rows) {
            for (o, x) in out.iter_mut().zip(self.row(i)) {
                *o += x * yi;
            }
        }
        out
    }

    /// `X beta`.
    pub fn apply(&self, beta: &[f64]) -> Vec<f64> {
        (0..self.rows)
            .map(|i| self.row(i).iter().zip(beta).map(|(x, b)| x * b).sum())
            .collect()
    }
}

/// Solve `A x = b` for symmetric positive definite `A` (row-major, `n x n`)
/// by Cholesky decomposition.
pub(crate) fn cholesky_solve(a: &[f64], b: &[f64]) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n * n {
        return Err(CvError::dimension_mismatch("normal equations", n * n, a.len()));
    }

    // A = L L^T
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[i * n + k] * l[j * n + k]).sum();
            if i == j {
                let diag = a[j * n + j] - sum;
                if diag <= 1e-12 * a[j * n + j].abs().max(1.0) {
                    return Err(CvError::InvalidData(
                        "design matrix is rank deficient".into(),
                    ));
                }
                l[j * n + j] = diag.sqrt();
            } else {
                l[i * n + j] = (a[i * n + j] - sum) / l[j * n + j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[i * n + j] * y[j]).sum();
        y[i] = (b[i] - sum) / l[i * n + i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = ((i + 1)..n).map(|j| l[j * n + i] * x[j]).sum();
        x[i] = (y[i] - sum) / l[i * n + i];
    }
    Ok(x)
}
