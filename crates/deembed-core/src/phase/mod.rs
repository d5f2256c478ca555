//! Phase module - jump detection and unwrapping of swept phase traces
//!
//! A trace obtained with `atan2` lives in (-pi, pi] and jumps whenever the
//! true phase crosses the branch cut. [`PhaseUnwrapper`] removes those jumps
//! and estimates the delay time from the slope of the corrected trace.

mod jumps;
mod unwrap;

pub use jumps::{count_jumps, detect_jumps, wrapped_phase, PhaseJump};
pub use unwrap::{PhaseUnwrapper, SlopeFit, UnwrapMode, UnwrappedPhase};
