//! Cubic spline resampling
//!
//! Calibration standards are often characterized on a grid other than the
//! measurement sweep. [`CubicSpline`] is a C2 piecewise cubic with not-a-knot
//! end conditions (a parabola for three nodes, a line for two); points outside
//! the node range are extrapolated with the end polynomials.

use nalgebra::{Matrix3, Vector3};

use super::linalg::solve_tridiagonal;
use crate::error::{DeembedError, Result};

/// Resampling service mapping samples on one grid onto another.
pub trait SweepInterpolator {
    /// Values of the interpolant through `(x, y)` at every point of `x_new`
    fn resample(&self, x: &[f64], y: &[f64], x_new: &[f64]) -> Result<Vec<f64>>;
}

/// Not-a-knot cubic spline resampler
#[derive(Debug, Clone, Copy, Default)]
pub struct CubicSplineInterpolator;

impl SweepInterpolator for CubicSplineInterpolator {
    fn resample(&self, x: &[f64], y: &[f64], x_new: &[f64]) -> Result<Vec<f64>> {
        let spline = CubicSpline::new(x, y)?;
        Ok(x_new.iter().map(|&xq| spline.eval(xq)).collect())
    }
}

/// Piecewise cubic Hermite form of a spline
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// First derivative at each node
    slopes: Vec<f64>,
}

impl CubicSpline {
    /// Build the spline through `(x, y)`; `x` must be strictly increasing.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(DeembedError::InvalidInput(format!(
                "spline needs equal lengths (got {} and {})",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(DeembedError::InvalidInput(
                "spline needs at least two nodes".to_string(),
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(DeembedError::InvalidInput(
                "spline nodes must be strictly increasing".to_string(),
            ));
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(DeembedError::InvalidInput(
                "spline nodes must be finite".to_string(),
            ));
        }

        let n = x.len();
        let dx: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let secant: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / dx[i]).collect();

        let slopes = match n {
            2 => vec![secant[0], secant[0]],
            3 => parabola_slopes(&dx, &secant)?,
            _ => not_a_knot_slopes(x, &dx, &secant)?,
        };

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            slopes,
        })
    }

    /// Evaluate at `xq`
    pub fn eval(&self, xq: f64) -> f64 {
        let n = self.x.len();
        let i = match self.x.partition_point(|&v| v <= xq) {
            0 => 0,
            k if k >= n => n - 2,
            k => k - 1,
        };

        let h = self.x[i + 1] - self.x[i];
        let m = (self.y[i + 1] - self.y[i]) / h;
        let s0 = self.slopes[i];
        let s1 = self.slopes[i + 1];

        let c2 = (3.0 * m - 2.0 * s0 - s1) / h;
        let c3 = (s0 + s1 - 2.0 * m) / (h * h);
        let t = xq - self.x[i];

        self.y[i] + t * (s0 + t * (c2 + t * c3))
    }
}

/// Slopes of the single parabola through three nodes
fn parabola_slopes(dx: &[f64], secant: &[f64]) -> Result<Vec<f64>> {
    let a = Matrix3::new(
        1.0,
        1.0,
        0.0,
        dx[1],
        2.0 * (dx[0] + dx[1]),
        dx[0],
        0.0,
        1.0,
        1.0,
    );
    let b = Vector3::new(
        2.0 * secant[0],
        3.0 * (dx[0] * secant[1] + dx[1] * secant[0]),
        2.0 * secant[1],
    );
    a.lu()
        .solve(&b)
        .map(|s| vec![s[0], s[1], s[2]])
        .ok_or_else(|| DeembedError::InvalidInput("spline system is singular".to_string()))
}

/// Slopes of the not-a-knot spline (n >= 4)
fn not_a_knot_slopes(x: &[f64], dx: &[f64], secant: &[f64]) -> Result<Vec<f64>> {
    let n = x.len();
    let mut lower = vec![0.0; n];
    let mut diag = vec![0.0; n];
    let mut upper = vec![0.0; n];
    let mut rhs = vec![0.0; n];

    // Third derivative continuous across x[1]
    let d = x[2] - x[0];
    diag[0] = dx[1];
    upper[0] = d;
    rhs[0] = ((dx[0] + 2.0 * d) * dx[1] * secant[0] + dx[0] * dx[0] * secant[1]) / d;

    // C2 continuity at interior nodes
    for i in 1..n - 1 {
        lower[i] = dx[i];
        diag[i] = 2.0 * (dx[i - 1] + dx[i]);
        upper[i] = dx[i - 1];
        rhs[i] = 3.0 * (dx[i] * secant[i - 1] + dx[i - 1] * secant[i]);
    }

    // Third derivative continuous across x[n - 2]
    let d = x[n - 1] - x[n - 3];
    lower[n - 1] = d;
    diag[n - 1] = dx[n - 3];
    rhs[n - 1] = (dx[n - 2] * dx[n - 2] * secant[n - 3]
        + (2.0 * d + dx[n - 2]) * dx[n - 3] * secant[n - 2])
        / d;

    solve_tridiagonal(&lower, &diag, &upper, &rhs)
        .ok_or_else(|| DeembedError::InvalidInput("spline system is singular".to_string()))
}
