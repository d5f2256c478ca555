//! Numerical constants for de-embedding calculations
//!
//! Provides standardized tolerance values, reference impedances and the
//! default settings of the delay-time refinement.

/// Tolerance for detecting near-zero values in division and singularity checks.
/// Used to prevent division by zero and detect ill-conditioned matrices.
pub const NEAR_ZERO: f64 = 1e-15;

/// Reference impedance of the analyzer ports (ohms).
pub const Z0_OHMS: f64 = 50.0;

/// Effective reference of a series two-port (ohms), `2 * Z0`.
pub const SERIES_Z0_OHMS: f64 = 2.0 * Z0_OHMS;

/// Minimum number of sweep points needed for the 3-point jump window.
pub const MIN_SWEEP_POINTS: usize = 3;

/// Absolute tolerance on the delay time (seconds) for the simplex search.
pub const REFINE_X_TOL: f64 = 1e-20;

/// Absolute tolerance on the objective spread for the simplex search.
pub const REFINE_F_TOL: f64 = 1e-4;

/// Iteration budget of the simplex search.
pub const REFINE_MAX_ITERATIONS: usize = 500;

/// Relative size of the initial simplex step.
pub const REFINE_INITIAL_STEP: f64 = 0.05;

/// Initial simplex step used when the start point is exactly zero.
pub const REFINE_ZERO_STEP: f64 = 2.5e-4;
