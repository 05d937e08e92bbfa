use nalgebra::{DMatrix, DVector};

use crate::error::{FlpzError, Result};

/// Singular values below this (relative to the largest) are treated as zero.
const SVD_EPS: f64 = 1e-12;

/// Solve min ||A c - b|| where A's columns are given as slices of equal length.
pub fn solve_columns(columns: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>> {
    let n = rhs.len();
    let k = columns.len();

    if k == 0 {
        return Ok(Vec::new());
    }
    if n < k {
        return Err(FlpzError::Fit(format!(
            "need at least {} data points for {} parameters, got {}",
            k, k, n
        )));
    }
    if columns.iter().any(|c| c.len() != n) {
        return Err(FlpzError::Fit("design columns differ in length".to_string()));
    }

    let a = DMatrix::from_fn(n, k, |i, j| columns[j][i]);
    let b = DVector::from_column_slice(rhs);

    let svd = a.svd(true, true);
    let max_sv = svd.singular_values.max();
    let coeffs = svd
        .solve(&b, SVD_EPS * max_sv.max(1.0))
        .map_err(|e| FlpzError::Fit(e.to_string()))?;

    if coeffs.iter().any(|c| !c.is_finite()) {
        return Err(FlpzError::Fit("least squares produced non-finite coefficients".to_string()));
    }
    Ok(coeffs.iter().copied().collect())
}

/// Mean squared error and coefficient of determination.
pub fn metrics(observed: &[f64], predicted: &[f64]) -> (f64, f64) {
    let n = observed.len().max(1) as f64;
    let mean = observed.iter().sum::<f64>() / n;

    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(o, p)| (o - p).powi(2))
        .sum();
    let ss_tot: f64 = observed.iter().map(|o| (o - mean).powi(2)).sum();

    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };
    (ss_res / n, r2)
}
