//! Chain (cascade) matrices of 2-port networks
//!
//! `M(S)` maps the port-1 waves `(a1, b1)` to the port-2 waves `(b2, a2)`:
//!
//! ```text
//! M(S) = 1/S12 * [[S12*S21 - S11*S22, S22], [-S11, 1]]
//! ```
//!
//! Connecting A then B gives `M(B) * M(A)`.

use nalgebra::Matrix2;
use num_complex::Complex64;
use std::ops::Mul;

use crate::constants::NEAR_ZERO;
use crate::error::{DeembedError, Result, Stage};

/// S-parameters of a 2-port at one frequency
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPortPoint {
    pub s11: Complex64,
    pub s21: Complex64,
    pub s12: Complex64,
    pub s22: Complex64,
}

impl TwoPortPoint {
    pub fn new(s11: Complex64, s21: Complex64, s12: Complex64, s22: Complex64) -> Self {
        Self { s11, s21, s12, s22 }
    }

    /// Same network seen from the other side
    pub fn flipped(&self) -> Self {
        Self {
            s11: self.s22,
            s21: self.s12,
            s12: self.s21,
            s22: self.s11,
        }
    }

    /// `S12*S21 - S11*S22`
    fn cross(&self) -> Complex64 {
        self.s12 * self.s21 - self.s11 * self.s22
    }
}

/// 2x2 chain matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeMatrix(pub Matrix2<Complex64>);

fn nonzero(v: Complex64) -> Result<Complex64> {
    if v.norm() <= NEAR_ZERO || !v.is_finite() {
        return Err(DeembedError::singular(Stage::Cascade));
    }
    Ok(v)
}

impl CascadeMatrix {
    /// Chain matrix of a 2-port; needs `S12 != 0`
    pub fn from_s(p: &TwoPortPoint) -> Result<Self> {
        let k = Complex64::new(1.0, 0.0) / nonzero(p.s12)?;
        let one = Complex64::new(1.0, 0.0);
        Ok(Self(
            Matrix2::new(p.cross(), p.s22, -p.s11, one).map(|v| v * k),
        ))
    }

    /// Closed-form inverse of `M(S)`; needs `S21 != 0`
    ///
    /// `M(S)^-1 = 1/S21 * [[1, -S22], [S11, S12*S21 - S11*S22]]`
    pub fn inverse_from_s(p: &TwoPortPoint) -> Result<Self> {
        let k = Complex64::new(1.0, 0.0) / nonzero(p.s21)?;
        let one = Complex64::new(1.0, 0.0);
        Ok(Self(
            Matrix2::new(one, -p.s22, p.s11, p.cross()).map(|v| v * k),
        ))
    }

    /// General inverse
    pub fn inverse(&self) -> Result<Self> {
        let m = &self.0;
        let det = nonzero(m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)])?;
        Ok(Self(
            Matrix2::new(m[(1, 1)], -m[(0, 1)], -m[(1, 0)], m[(0, 0)]).map(|v| v / det),
        ))
    }

    /// S-parameters of the network this matrix describes; needs `M11 != 0`
    pub fn to_s(&self) -> Result<TwoPortPoint> {
        let m = &self.0;
        let pa11 = nonzero(m[(1, 1)])?;
        Ok(TwoPortPoint {
            s11: -m[(1, 0)] / pa11,
            s21: m[(0, 0)] - m[(0, 1)] * m[(1, 0)] / pa11,
            s12: Complex64::new(1.0, 0.0) / pa11,
            s22: m[(0, 1)] / pa11,
        })
    }
}

impl Mul for CascadeMatrix {
    type Output = CascadeMatrix;

    fn mul(self, rhs: CascadeMatrix) -> CascadeMatrix {
        CascadeMatrix(self.0 * rhs.0)
    }
}
