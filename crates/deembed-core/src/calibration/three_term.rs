//! 3-term one-port error model of a probe
//!
//! A probe is a two-port between the analyzer and the standard. Terminated by
//! a load with reflection `G` it reads
//!
//! ```text
//! Gm = S11 + S21*S12*G / (1 - S22*G)
//!    = x + y*G*Gm + z*G        with x = S11, y = S22, z = S21*S12 - S11*S22
//! ```
//!
//! which is linear in `(x, y, z)`. Three standards give a 3x3 system per
//! frequency point.

use nalgebra::{Matrix3, Vector3};
use ndarray::Array1;
use num_complex::Complex64;

use super::standards::StandardSet;
use crate::constants::NEAR_ZERO;
use crate::dispersion::Dispersion;
use crate::error::{DeembedError, Result, Stage};
use crate::frequency::Frequency;
use crate::math::{solve3, SweepInterpolator};
use crate::sweep::{map_points, FailurePolicy};

/// Error terms at one frequency point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorTerms {
    /// Probe S11 (directivity)
    pub x: Complex64,
    /// Probe S22 (source match)
    pub y: Complex64,
    /// `S21*S12 - S11*S22`
    pub z: Complex64,
}

impl ErrorTerms {
    /// Error terms of a probe with the given S-parameters
    pub fn from_s(s11: Complex64, s21: Complex64, s12: Complex64, s22: Complex64) -> Self {
        Self {
            x: s11,
            y: s22,
            z: s21 * s12 - s11 * s22,
        }
    }

    /// Transmission product `S21*S12 = z + x*y`
    #[inline]
    pub fn transmission_product(&self) -> Complex64 {
        self.z + self.x * self.y
    }

    /// Reflection seen through the probe when its far end sees `gamma`
    pub fn measured(&self, gamma: Complex64) -> Complex64 {
        (self.x + self.z * gamma) / (Complex64::new(1.0, 0.0) - self.y * gamma)
    }

    /// Reflection at the far end given the reading `gamma_m`
    pub fn actual(&self, gamma_m: Complex64) -> Result<Complex64> {
        let den = self.z + self.y * gamma_m;
        if den.norm() <= NEAR_ZERO {
            return Err(DeembedError::singular(Stage::OnePort));
        }
        Ok((gamma_m - self.x) / den)
    }
}

/// Probe readings through SHORT, OPEN and LOAD on a common sweep
#[derive(Debug, Clone)]
pub struct ProbeReflections {
    pub short: Dispersion,
    pub open: Dispersion,
    pub load: Dispersion,
}

impl ProbeReflections {
    pub fn new(short: Dispersion, open: Dispersion, load: Dispersion) -> Result<Self> {
        short.frequency.ensure_matches(&open.frequency, "OPEN reading")?;
        short.frequency.ensure_matches(&load.frequency, "LOAD reading")?;
        Ok(Self { short, open, load })
    }

    pub fn frequency(&self) -> &Frequency {
        &self.short.frequency
    }
}

/// Error terms over a sweep, as parallel arrays
#[derive(Debug, Clone)]
pub struct ErrorModelSolution {
    pub frequency: Frequency,
    pub x: Array1<Complex64>,
    pub y: Array1<Complex64>,
    pub z: Array1<Complex64>,
}

impl ErrorModelSolution {
    fn from_terms(frequency: Frequency, terms: &[ErrorTerms]) -> Self {
        Self {
            frequency,
            x: terms.iter().map(|t| t.x).collect(),
            y: terms.iter().map(|t| t.y).collect(),
            z: terms.iter().map(|t| t.z).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn terms(&self, index: usize) -> ErrorTerms {
        ErrorTerms {
            x: self.x[index],
            y: self.y[index],
            z: self.z[index],
        }
    }

    /// `S21*S12` at every point
    pub fn transmission_product(&self) -> Array1<Complex64> {
        &self.z + &(&self.x * &self.y)
    }
}

/// Per-frequency solver of the 3-term model
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorModelSolver {
    policy: FailurePolicy,
}

impl ErrorModelSolver {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    /// Solve one frequency point
    ///
    /// `known` and `measured` hold the SHORT, OPEN and LOAD values in that
    /// order.
    pub fn solve_point(known: [Complex64; 3], measured: [Complex64; 3]) -> Result<ErrorTerms> {
        let one = Complex64::new(1.0, 0.0);
        let [a_s, a_o, a_l] = known;
        let [m_s, m_o, m_l] = measured;

        // [ 1  As*Ams  As ] [x]   [Ams]
        // [ 1  Ao*Amo  Ao ] [y] = [Amo]
        // [ 1  Al*Aml  Al ] [z]   [Aml]
        let a = Matrix3::new(
            one,
            a_s * m_s,
            a_s,
            one,
            a_o * m_o,
            a_o,
            one,
            a_l * m_l,
            a_l,
        );
        let b = Vector3::new(m_s, m_o, m_l);

        let v = solve3(&a, &b).ok_or_else(|| DeembedError::singular(Stage::ErrorModel))?;
        if v.iter().any(|c| !c.re.is_finite() || !c.im.is_finite()) {
            return Err(DeembedError::singular(Stage::ErrorModel));
        }
        Ok(ErrorTerms {
            x: v[0],
            y: v[1],
            z: v[2],
        })
    }

    /// Solve every point of pre-aligned arrays
    pub fn solve_arrays(
        &self,
        frequency: &Frequency,
        known: &[Array1<Complex64>; 3],
        measured: &[Array1<Complex64>; 3],
    ) -> Result<ErrorModelSolution> {
        let n = frequency.npoints();
        if known.iter().chain(measured).any(|a| a.len() != n) {
            return Err(DeembedError::InvalidInput(format!(
                "calibration arrays must all have {} points",
                n
            )));
        }

        let terms = map_points(n, self.policy, |i| {
            Self::solve_point(
                [known[0][i], known[1][i], known[2][i]],
                [measured[0][i], measured[1][i], measured[2][i]],
            )
            .map_err(|e| e.at(i))
        })?;

        tracing::debug!(points = n, "3-term error model solved");
        Ok(ErrorModelSolution::from_terms(frequency.clone(), &terms))
    }

    /// Characterize a probe from its readings through the three standards
    pub fn solve<I: SweepInterpolator + ?Sized>(
        &self,
        readings: &ProbeReflections,
        standards: &StandardSet,
        interpolator: &I,
    ) -> Result<ErrorModelSolution> {
        let sweep = readings.frequency();
        let known = standards.resolve(sweep, interpolator)?;
        let measured = [
            readings.short.values.clone(),
            readings.open.values.clone(),
            readings.load.values.clone(),
        ];
        self.solve_arrays(sweep, &known, &measured)
    }
}
