//! Delay-time refinement
//!
//! A trace `S(f) = |S| exp(-i*2*pi*f*dt)` is real after rotating it by
//! `exp(+i*2*pi*f*dt)`; the refined delay minimizes the summed magnitude of
//! the rotated imaginary part.

use std::f64::consts::PI;

use super::nelder_mead::{NelderMead, NelderMeadOptions, ScalarMinimizer};
use crate::error::{DeembedError, Result};

/// `J(dt) = sum_i |Re_i * sin(2 pi f_i dt) + Im_i * cos(2 pi f_i dt)|`
pub fn delay_objective(f: &[f64], re: &[f64], im: &[f64], dt: f64) -> f64 {
    f.iter()
        .zip(re.iter().zip(im))
        .map(|(&fi, (&r, &i))| {
            let theta = 2.0 * PI * fi * dt;
            (r * theta.sin() + i * theta.cos()).abs()
        })
        .sum()
}

/// Refined delay time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRefinement {
    /// Delay time (s)
    pub dt: f64,
    /// Objective at `dt`
    pub objective: f64,
    pub iterations: usize,
}

/// Coarse and refined delay time of a trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayTimeEstimate {
    /// From the slope of the unwrapped phase (s)
    pub coarse: f64,
    /// After refinement, or the best point found if it did not converge (s)
    pub refined: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// Refines a coarse delay estimate with a scalar minimizer
pub struct DelayTimeRefiner {
    minimizer: Box<dyn ScalarMinimizer + Send + Sync>,
}

impl std::fmt::Debug for DelayTimeRefiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayTimeRefiner").finish_non_exhaustive()
    }
}

impl Default for DelayTimeRefiner {
    fn default() -> Self {
        Self::new(NelderMeadOptions::default())
    }
}

impl DelayTimeRefiner {
    /// Nelder-Mead refiner with the given options
    pub fn new(options: NelderMeadOptions) -> Self {
        Self::with_minimizer(NelderMead::new(options))
    }

    pub fn with_minimizer<M: ScalarMinimizer + Send + Sync + 'static>(minimizer: M) -> Self {
        Self {
            minimizer: Box::new(minimizer),
        }
    }

    /// Minimize [`delay_objective`] starting at `dt0`
    ///
    /// Fails with `OptimizationNonConvergence` (carrying the best point) when
    /// the minimizer runs out of iterations.
    pub fn refine(&self, f: &[f64], re: &[f64], im: &[f64], dt0: f64) -> Result<DelayRefinement> {
        if f.len() != re.len() || f.len() != im.len() {
            return Err(DeembedError::InvalidInput(format!(
                "refinement needs equal lengths (f: {}, re: {}, im: {})",
                f.len(),
                re.len(),
                im.len()
            )));
        }
        if f.is_empty() {
            return Err(DeembedError::InvalidInput(
                "refinement needs at least one point".to_string(),
            ));
        }
        if !dt0.is_finite() {
            return Err(DeembedError::InvalidInput(format!(
                "initial delay time must be finite, got {}",
                dt0
            )));
        }

        let mut objective = |dt: f64| delay_objective(f, re, im, dt);
        let min = self.minimizer.minimize(&mut objective, dt0);

        tracing::debug!(
            dt0,
            dt = min.x,
            objective = min.fmin,
            iterations = min.iterations,
            "delay time refined"
        );

        if !min.converged {
            return Err(DeembedError::OptimizationNonConvergence {
                best_dt: min.x,
                best_value: min.fmin,
                iterations: min.iterations,
            });
        }

        Ok(DelayRefinement {
            dt: min.x,
            objective: min.fmin,
            iterations: min.iterations,
        })
    }

    /// Refine `coarse`, keeping the best point when the search does not converge
    pub fn estimate(
        &self,
        f: &[f64],
        re: &[f64],
        im: &[f64],
        coarse: f64,
    ) -> Result<DelayTimeEstimate> {
        match self.refine(f, re, im, coarse) {
            Ok(r) => Ok(DelayTimeEstimate {
                coarse,
                refined: r.dt,
                converged: true,
                iterations: r.iterations,
            }),
            Err(DeembedError::OptimizationNonConvergence {
                best_dt,
                best_value,
                iterations,
            }) => {
                tracing::warn!(
                    coarse,
                    best_dt,
                    best_value,
                    iterations,
                    "delay-time refinement did not converge, keeping best point"
                );
                Ok(DelayTimeEstimate {
                    coarse,
                    refined: best_dt,
                    converged: false,
                    iterations,
                })
            }
            Err(e) => Err(e),
        }
    }
}
