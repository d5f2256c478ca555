//! Least-squares line fits used for phase slopes

use crate::error::{DeembedError, Result};

/// Straight line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Evaluate the line at `x`
    #[inline]
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least-squares fit with intercept
///
/// Needs at least two points with distinct abscissas.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    if x.len() != y.len() {
        return Err(DeembedError::InvalidInput(format!(
            "regression needs equal lengths (got {} and {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(DeembedError::InvalidInput(
            "regression needs at least two points".to_string(),
        ));
    }

    let n = x.len() as f64;
    let x_mean = x.iter().sum::<f64>() / n;
    let y_mean = y.iter().sum::<f64>() / n;

    let (ssxm, ssxym) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(sxx, sxy), (&xi, &yi)| {
            let dx = xi - x_mean;
            (sxx + dx * dx, sxy + dx * (yi - y_mean))
        });

    if ssxm == 0.0 {
        return Err(DeembedError::InvalidInput(
            "degenerate regression: all abscissas are equal".to_string(),
        ));
    }

    let slope = ssxym / ssxm;
    Ok(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

/// Intercept-free least-squares slope `sum(x*y) / sum(x^2)`
pub fn slope_through_origin(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() || x.is_empty() {
        return Err(DeembedError::InvalidInput(format!(
            "regression needs equal non-zero lengths (got {} and {})",
            x.len(),
            y.len()
        )));
    }
    let (num, den) = x
        .iter()
        .zip(y)
        .fold((0.0, 0.0), |(num, den), (&xi, &yi)| (num + xi * yi, den + xi * xi));
    if den == 0.0 {
        return Err(DeembedError::InvalidInput(
            "degenerate regression: sum of squared abscissas is zero".to_string(),
        ));
    }
    Ok(num / den)
}
