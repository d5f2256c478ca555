//! Phase unwrapping and slope-derived delay time

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::jumps::{detect_jumps, wrapped_phase, PhaseJump};
use crate::constants::MIN_SWEEP_POINTS;
use crate::error::{DeembedError, Result};
use crate::math::{linear_fit, slope_through_origin};

/// Strategy used to remove detected jumps
///
/// Configuration files select it through `config::UnwrapConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnwrapMode {
    /// Shift each piece so that it continues the fitted line of the piece
    /// before it. Needs no knowledge of the jump size.
    #[default]
    GradientShift,
    /// Subtract `phase_factor * pi` after every jump (1 for pi jumps,
    /// 2 for 2*pi jumps).
    FixedMultiple { phase_factor: u8 },
}

impl UnwrapMode {
    fn validate(&self) -> Result<()> {
        match self {
            UnwrapMode::FixedMultiple { phase_factor } if !matches!(phase_factor, 1 | 2) => {
                Err(DeembedError::InvalidInput(format!(
                    "phase factor must be 1 or 2, got {}",
                    phase_factor
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Regression used for the slope of the unwrapped trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopeFit {
    /// Least-squares line with intercept
    #[default]
    Intercept,
    /// Least-squares line through the origin, `sum(f*phase) / sum(f^2)`
    ThroughOrigin,
}

/// Result of unwrapping a phase trace
#[derive(Debug, Clone)]
pub struct UnwrappedPhase {
    /// Wrapped phase as measured, in (-pi, pi]
    pub initial: Vec<f64>,
    /// Phase with the jumps removed
    pub unwrapped: Vec<f64>,
    /// Jumps found in the initial trace
    pub jumps: Vec<PhaseJump>,
    /// Slope of the unwrapped phase (rad/Hz)
    pub slope: f64,
    /// Sign of the slope: -1, 0 or +1
    pub slope_sign: i8,
    /// `|slope| / (2 pi)` in seconds
    pub delay_time: f64,
}

/// Jump detector and corrector for frequency-swept phase traces
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseUnwrapper {
    mode: UnwrapMode,
    slope_fit: SlopeFit,
}

impl PhaseUnwrapper {
    pub fn new(mode: UnwrapMode) -> Self {
        Self {
            mode,
            slope_fit: SlopeFit::default(),
        }
    }

    pub fn with_slope_fit(mut self, slope_fit: SlopeFit) -> Self {
        self.slope_fit = slope_fit;
        self
    }

    pub fn mode(&self) -> UnwrapMode {
        self.mode
    }

    /// Unwrap the phase of the complex trace `(re, im)` sampled at `f` (Hz)
    pub fn unwrap(&self, f: &[f64], re: &[f64], im: &[f64]) -> Result<UnwrappedPhase> {
        if re.len() != f.len() {
            return Err(DeembedError::InvalidInput(format!(
                "{} samples for {} frequencies",
                re.len(),
                f.len()
            )));
        }
        let phase = wrapped_phase(re, im)?;
        self.unwrap_phase(f, &phase)
    }

    /// Unwrap an already computed wrapped phase trace
    pub fn unwrap_phase(&self, f: &[f64], phase: &[f64]) -> Result<UnwrappedPhase> {
        self.mode.validate()?;
        validate_trace(f, phase)?;

        let jumps = detect_jumps(phase);
        let shifts = match self.mode {
            _ if jumps.is_empty() => Vec::new(),
            UnwrapMode::GradientShift => gradient_shifts(f, phase, &jumps)?,
            UnwrapMode::FixedMultiple { phase_factor } => {
                vec![phase_factor as f64 * PI; jumps.len()]
            }
        };

        let mut unwrapped = phase.to_vec();
        let mut offset = 0.0;
        let mut next = jumps.iter().zip(&shifts).peekable();
        for (j, value) in unwrapped.iter_mut().enumerate() {
            while let Some((_, shift)) = next.next_if(|(jump, _)| jump.right == j) {
                offset += *shift;
            }
            *value -= offset;
        }

        let slope = match self.slope_fit {
            SlopeFit::Intercept => linear_fit(f, &unwrapped)?.slope,
            SlopeFit::ThroughOrigin => slope_through_origin(f, &unwrapped)?,
        };

        tracing::debug!(
            jumps = jumps.len(),
            mode = ?self.mode,
            slope,
            "phase trace unwrapped"
        );

        Ok(UnwrappedPhase {
            initial: phase.to_vec(),
            unwrapped,
            jumps,
            slope,
            slope_sign: sign(slope),
            delay_time: slope.abs() / (2.0 * PI),
        })
    }
}

fn validate_trace(f: &[f64], phase: &[f64]) -> Result<()> {
    if f.len() != phase.len() {
        return Err(DeembedError::InvalidInput(format!(
            "{} phase samples for {} frequencies",
            phase.len(),
            f.len()
        )));
    }
    if f.len() < MIN_SWEEP_POINTS {
        return Err(DeembedError::InvalidInput(format!(
            "phase unwrapping needs at least {} points, got {}",
            MIN_SWEEP_POINTS,
            f.len()
        )));
    }
    if f.iter().chain(phase).any(|v| !v.is_finite()) {
        return Err(DeembedError::InvalidInput(
            "phase trace contains non-finite values".to_string(),
        ));
    }
    if f.windows(2).any(|w| w[1] <= w[0]) {
        return Err(DeembedError::InvalidInput(
            "frequencies must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

/// Vertical shift removing each jump
///
/// The continuous piece before a jump is fitted with a line and extrapolated
/// to the jump's right sample; the shift moves that sample onto the line.
/// When the trace starts with a jump there is no piece before it, so the slope
/// comes from the piece after it and the line is anchored at sample 0.
fn gradient_shifts(f: &[f64], phase: &[f64], jumps: &[PhaseJump]) -> Result<Vec<f64>> {
    let n = phase.len();
    let mut shifts = Vec::with_capacity(jumps.len());

    for (k, jump) in jumps.iter().enumerate() {
        let predicted = if k == 0 && jump.left == 0 {
            let end = jumps.get(1).map_or(n - 1, |next| next.left);
            let fit = linear_fit(&f[jump.right..=end], &phase[jump.right..=end])?;
            phase[jump.left] + fit.slope * (f[jump.right] - f[jump.left])
        } else {
            let start = if k == 0 { 0 } else { jumps[k - 1].right };
            let fit = linear_fit(&f[start..=jump.left], &phase[start..=jump.left])?;
            fit.at(f[jump.right])
        };
        shifts.push(phase[jump.right] - predicted);
    }

    Ok(shifts)
}

fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}
