//! Derivative-free scalar minimization (Nelder-Mead simplex in one dimension)

use serde::{Deserialize, Serialize};

use crate::constants::{
    REFINE_F_TOL, REFINE_INITIAL_STEP, REFINE_MAX_ITERATIONS, REFINE_X_TOL, REFINE_ZERO_STEP,
};
use crate::error::{DeembedError, Result};

/// Outcome of a scalar minimization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarMinimum {
    pub x: f64,
    pub fmin: f64,
    pub iterations: usize,
    pub fn_evals: usize,
    pub converged: bool,
}

/// A minimizer of real functions of one real variable
pub trait ScalarMinimizer {
    /// Minimize `objective` starting from `x0`
    ///
    /// Always returns the best point found; `converged` tells whether the
    /// stopping tolerances were met within the budget.
    fn minimize(&self, objective: &mut dyn FnMut(f64) -> f64, x0: f64) -> ScalarMinimum;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadOptions {
    /// Absolute tolerance on the simplex width
    pub x_tolerance: f64,
    /// Absolute tolerance on the spread of objective values
    pub f_tolerance: f64,
    pub max_iterations: usize,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub beta: f64,
    /// Shrink coefficient
    pub sigma: f64,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            x_tolerance: REFINE_X_TOL,
            f_tolerance: REFINE_F_TOL,
            max_iterations: REFINE_MAX_ITERATIONS,
            alpha: 1.0,
            gamma: 2.0,
            beta: 0.5,
            sigma: 0.5,
        }
    }
}

impl NelderMeadOptions {
    pub fn validate(&self) -> Result<()> {
        let positive = [self.x_tolerance, self.f_tolerance, self.alpha, self.gamma];
        if positive.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(DeembedError::InvalidInput(
                "simplex tolerances and coefficients must be positive".to_string(),
            ));
        }
        if !(self.beta > 0.0 && self.beta < 1.0 && self.sigma > 0.0 && self.sigma < 1.0) {
            return Err(DeembedError::InvalidInput(
                "contraction and shrink coefficients must lie in (0, 1)".to_string(),
            ));
        }
        if self.gamma <= 1.0 {
            return Err(DeembedError::InvalidInput(
                "expansion coefficient must exceed 1".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(DeembedError::InvalidInput(
                "iteration budget must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Simplex vertex
#[derive(Debug, Clone, Copy)]
struct Vertex {
    x: f64,
    f: f64,
}

/// One-dimensional Nelder-Mead
#[derive(Debug, Clone, Copy, Default)]
pub struct NelderMead {
    pub options: NelderMeadOptions,
}

impl NelderMead {
    pub fn new(options: NelderMeadOptions) -> Self {
        Self { options }
    }

    fn converged(&self, best: Vertex, worst: Vertex) -> bool {
        let x_tol = self
            .options
            .x_tolerance
            .max(4.0 * f64::EPSILON * best.x.abs());
        (worst.x - best.x).abs() <= x_tol && (worst.f - best.f).abs() <= self.options.f_tolerance
    }
}

/// Second vertex of the starting simplex
fn initial_step(x0: f64) -> f64 {
    if x0 == 0.0 {
        REFINE_ZERO_STEP
    } else {
        x0 * (1.0 + REFINE_INITIAL_STEP)
    }
}

impl ScalarMinimizer for NelderMead {
    fn minimize(&self, objective: &mut dyn FnMut(f64) -> f64, x0: f64) -> ScalarMinimum {
        let opts = &self.options;
        let mut fn_evals = 0;
        let mut eval = |x: f64| {
            fn_evals += 1;
            let f = objective(x);
            // A NaN never wins a comparison
            Vertex {
                x,
                f: if f.is_nan() { f64::INFINITY } else { f },
            }
        };

        let a = eval(x0);
        let b = eval(initial_step(x0));
        let (mut best, mut worst) = if b.f < a.f { (b, a) } else { (a, b) };

        let mut iterations = 0;
        let mut converged = self.converged(best, worst);

        while !converged && iterations < opts.max_iterations {
            iterations += 1;

            // The centroid of all vertices but the worst is the best vertex
            let c = best.x;
            let r = eval(c + opts.alpha * (c - worst.x));

            if r.f < best.f {
                let e = eval(c + opts.gamma * (r.x - c));
                worst = if e.f < r.f { e } else { r };
            } else {
                let contracted = if r.f < worst.f {
                    let oc = eval(c + opts.beta * (r.x - c));
                    (oc.f <= r.f).then_some(oc)
                } else {
                    let ic = eval(c + opts.beta * (worst.x - c));
                    (ic.f < worst.f).then_some(ic)
                };
                worst = match contracted {
                    Some(v) => v,
                    None => eval(best.x + opts.sigma * (worst.x - best.x)),
                };
            }

            if worst.f < best.f {
                std::mem::swap(&mut best, &mut worst);
            }
            converged = self.converged(best, worst);
        }

        tracing::trace!(iterations, fn_evals, converged, x = best.x, "simplex search finished");

        ScalarMinimum {
            x: best.x,
            fmin: best.f,
            iterations,
            fn_evals,
            converged,
        }
    }
}
