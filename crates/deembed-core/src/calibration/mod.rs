//! Calibration module - probe characterization from reflection standards
//!
//! SHORT, OPEN and LOAD are measured through the probe; with their known
//! reflections the per-frequency 3-term model of the probe follows from a
//! 3x3 linear solve.

mod standards;
mod three_term;

pub use standards::{CalibrationStandard, StandardSet, Termination};
pub use three_term::{ErrorModelSolution, ErrorModelSolver, ErrorTerms, ProbeReflections};
