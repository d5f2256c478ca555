//! Phase jump detection

use crate::error::{DeembedError, Result};

/// A discontinuity between two adjacent samples of opposite sign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseJump {
    /// Last sample before the jump
    pub left: usize,
    /// First sample after the jump, always `left + 1`
    pub right: usize,
}

/// Wrapped phase `atan2(im, re)` of a sampled complex trace
pub fn wrapped_phase(re: &[f64], im: &[f64]) -> Result<Vec<f64>> {
    if re.len() != im.len() {
        return Err(DeembedError::InvalidInput(format!(
            "real and imaginary parts differ in length ({} vs {})",
            re.len(),
            im.len()
        )));
    }
    Ok(re.iter().zip(im).map(|(&r, &i)| i.atan2(r)).collect())
}

/// Find the jumps of a wrapped phase trace
///
/// A jump is declared at `(i, i + 1)` when the two samples have opposite
/// signs and `|phase[i + 2]| <= |phase[i + 1]|`, i.e. the trace keeps moving
/// away from the branch cut after crossing it. Zero crossings fail the second
/// test. Jumps are reported in ascending order and never share a sample.
pub fn detect_jumps(phase: &[f64]) -> Vec<PhaseJump> {
    let mut jumps: Vec<PhaseJump> = Vec::new();
    if phase.len() < 3 {
        return jumps;
    }

    for i in 0..phase.len() - 2 {
        let opposite = phase[i] * phase[i + 1] < 0.0;
        if !opposite || phase[i + 2].abs() > phase[i + 1].abs() {
            continue;
        }
        if jumps.last().is_some_and(|prev| prev.right >= i) {
            continue;
        }
        jumps.push(PhaseJump {
            left: i,
            right: i + 1,
        });
    }

    jumps
}

/// Number of jumps in the phase of `(re, im)`
pub fn count_jumps(re: &[f64], im: &[f64]) -> Result<usize> {
    Ok(detect_jumps(&wrapped_phase(re, im)?).len())
}
