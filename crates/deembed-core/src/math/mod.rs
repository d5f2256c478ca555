//! Mathematical functions module
//!
//! Per-point linear solves, least-squares line fits, impedance conversions
//! and the cubic spline used to resample calibration standards onto the
//! measurement sweep.

pub mod conversions;
pub mod linalg;
pub mod regression;
pub mod spline;

pub use conversions::{reflection_2_impedance, remove_delay, transmission_2_series_impedance};
pub use linalg::solve3;
pub use regression::{linear_fit, slope_through_origin, LinearFit};
pub use spline::{CubicSpline, CubicSplineInterpolator, SweepInterpolator};
