//! Numerical helpers shared by the HMM trainer.
//!
//! Numerical notes:
//! - Densities and probabilities are combined in log space; `log_sum_exp`
//!   shifts by the maximum term so the largest `exp` is exactly 1.
//! - Variances are floored at `min_covar` everywhere to keep the diagonal
//!   covariance invertible.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector, RowDVector};

/// Log density of a diagonal-covariance Gaussian at `x`.
///
/// `mean` and `var` are rows of the per-state parameter matrices.
pub fn log_gaussian_diag<'a>(
    x: impl IntoIterator<Item = &'a f64>,
    mean: impl IntoIterator<Item = &'a f64>,
    var: impl IntoIterator<Item = &'a f64>,
) -> f64 {
    let ln_2pi = (2.0 * PI).ln();
    x.into_iter()
        .zip(mean)
        .zip(var)
        .map(|((&xi, &mi), &vi)| {
            let d = xi - mi;
            -0.5 * (ln_2pi + vi.ln() + d * d / vi)
        })
        .sum()
}

/// `ln(Σ exp(v))`, stable for large negative terms.
///
/// An empty slice, or one holding only `-inf`, gives `-inf`.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// Per-column variance (population), floored at `min_covar`.
pub fn column_variances(data: &DMatrix<f64>, min_covar: f64) -> RowDVector<f64> {
    let n = data.nrows().max(1) as f64;
    let mut out = RowDVector::zeros(data.ncols());
    for (j, col) in data.column_iter().enumerate() {
        let mean = col.sum() / n;
        let var = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        out[j] = var.max(0.0) + min_covar;
    }
    out
}

/// Scale `v` so it sums to one and return the original sum.
///
/// Returns `None` (leaving `v` untouched) when the sum is not a positive
/// finite number.
pub fn normalize(v: &mut DVector<f64>) -> Option<f64> {
    let sum = v.sum();
    if !(sum.is_finite() && sum > 0.0) {
        return None;
    }
    *v /= sum;
    Some(sum)
}

/// Squared Euclidean distance between two rows.
pub fn sq_dist<'a>(a: impl IntoIterator<Item = &'a f64>, b: impl IntoIterator<Item = &'a f64>) -> f64 {
    a.into_iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
