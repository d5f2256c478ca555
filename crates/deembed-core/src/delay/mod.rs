//! Delay module - delay-time refinement and correction
//!
//! The slope of an unwrapped phase trace gives a coarse delay time. It is
//! refined by minimizing [`delay_objective`] with a derivative-free scalar
//! minimizer, then used to de-rotate measured traces.

mod correction;
mod nelder_mead;
mod refine;

pub use correction::{
    correct_delay, delay_corrected_impedance, extract_delay, DelayCorrected, DelayExtraction,
    ImpedanceSource,
};
pub use nelder_mead::{NelderMead, NelderMeadOptions, ScalarMinimizer, ScalarMinimum};
pub use refine::{delay_objective, DelayRefinement, DelayTimeEstimate, DelayTimeRefiner};
