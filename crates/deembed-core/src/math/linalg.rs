//! Linear algebra operations
//!
//! Small fixed-size solves used per frequency point. `nalgebra` is the
//! backend; callers only see `Complex64` values and `Option` results.

use nalgebra::{Matrix3, Vector3};
use num_complex::Complex64;

use crate::constants::NEAR_ZERO;

/// Ratio `|det A| / prod(||row_i||)`
///
/// Scale-free measure of how close a 3x3 matrix is to singular
/// (Hadamard's inequality bounds it by 1). Zero rows give 0.
pub fn hadamard_ratio(a: &Matrix3<Complex64>) -> f64 {
    let scale: f64 = a
        .row_iter()
        .map(|row| row.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt())
        .product();
    if scale == 0.0 {
        return 0.0;
    }
    a.determinant().norm() / scale
}

/// Solve a 3x3 complex system `a * x = b`
///
/// Returns None if the matrix is singular relative to its row scale.
pub fn solve3(a: &Matrix3<Complex64>, b: &Vector3<Complex64>) -> Option<Vector3<Complex64>> {
    if hadamard_ratio(a) <= NEAR_ZERO {
        return None;
    }
    a.lu().solve(b)
}

/// Solve a tridiagonal system in place (Thomas algorithm)
///
/// `lower[i]` multiplies `x[i - 1]` in row `i` (`lower[0]` is unused),
/// `upper[i]` multiplies `x[i + 1]` (`upper[n - 1]` is unused).
/// Returns None on a zero pivot.
pub fn solve_tridiagonal(
    lower: &[f64],
    diag: &[f64],
    upper: &[f64],
    rhs: &[f64],
) -> Option<Vec<f64>> {
    let n = diag.len();
    if n == 0 || lower.len() != n || upper.len() != n || rhs.len() != n {
        return None;
    }

    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    if diag[0].abs() < NEAR_ZERO {
        return None;
    }
    c[0] = upper[0] / diag[0];
    d[0] = rhs[0] / diag[0];

    for i in 1..n {
        let pivot = diag[i] - lower[i] * c[i - 1];
        if pivot.abs() < NEAR_ZERO {
            return None;
        }
        c[i] = if i + 1 < n { upper[i] / pivot } else { 0.0 };
        d[i] = (rhs[i] - lower[i] * d[i - 1]) / pivot;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d[i] - c[i] * x[i + 1];
    }
    Some(x)
}
