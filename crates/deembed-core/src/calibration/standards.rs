//! Calibration standards and their known reflection coefficients

use ndarray::Array1;
use num_complex::Complex64;

use crate::dispersion::Dispersion;
use crate::error::Result;
use crate::frequency::Frequency;
use crate::math::SweepInterpolator;

/// One of the three reflection standards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStandard {
    Short,
    Open,
    Load,
}

impl CalibrationStandard {
    pub const ALL: [CalibrationStandard; 3] = [
        CalibrationStandard::Short,
        CalibrationStandard::Open,
        CalibrationStandard::Load,
    ];

    /// Reflection coefficient of the ideal standard
    pub fn ideal_reflection(&self) -> Complex64 {
        match self {
            CalibrationStandard::Short => Complex64::new(-1.0, 0.0),
            CalibrationStandard::Open => Complex64::new(1.0, 0.0),
            CalibrationStandard::Load => Complex64::new(0.0, 0.0),
        }
    }

    /// Single-letter tag used in record file names (`S`, `O`, `L`)
    pub fn tag(&self) -> &'static str {
        match self {
            CalibrationStandard::Short => "S",
            CalibrationStandard::Open => "O",
            CalibrationStandard::Load => "L",
        }
    }
}

impl std::fmt::Display for CalibrationStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalibrationStandard::Short => write!(f, "SHORT"),
            CalibrationStandard::Open => write!(f, "OPEN"),
            CalibrationStandard::Load => write!(f, "LOAD"),
        }
    }
}

/// Known reflection of a standard
#[derive(Debug, Clone)]
pub enum Termination {
    /// Textbook value (-1, +1, 0)
    Ideal,
    /// Characterized separately, possibly on another sweep
    Measured(Dispersion),
}

impl Termination {
    /// Reflection of `standard` at every point of `sweep`
    ///
    /// Measured terminations on a different grid are resampled with
    /// `interpolator`.
    pub fn resolve<I: SweepInterpolator + ?Sized>(
        &self,
        standard: CalibrationStandard,
        sweep: &Frequency,
        interpolator: &I,
    ) -> Result<Array1<Complex64>> {
        match self {
            Termination::Ideal => Ok(Array1::from_elem(
                sweep.npoints(),
                standard.ideal_reflection(),
            )),
            Termination::Measured(d) if d.frequency.f() == sweep.f() => Ok(d.values.clone()),
            Termination::Measured(d) => {
                tracing::debug!(
                    %standard,
                    from = d.len(),
                    to = sweep.npoints(),
                    "resampling measured termination"
                );
                Ok(d.resample(sweep, interpolator)?.values)
            }
        }
    }
}

/// Known reflections of SHORT, OPEN and LOAD
#[derive(Debug, Clone)]
pub struct StandardSet {
    pub short: Termination,
    pub open: Termination,
    pub load: Termination,
}

impl Default for StandardSet {
    fn default() -> Self {
        Self::ideal()
    }
}

impl StandardSet {
    pub fn ideal() -> Self {
        Self {
            short: Termination::Ideal,
            open: Termination::Ideal,
            load: Termination::Ideal,
        }
    }

    pub fn measured(short: Dispersion, open: Dispersion, load: Dispersion) -> Self {
        Self {
            short: Termination::Measured(short),
            open: Termination::Measured(open),
            load: Termination::Measured(load),
        }
    }

    pub fn get(&self, standard: CalibrationStandard) -> &Termination {
        match standard {
            CalibrationStandard::Short => &self.short,
            CalibrationStandard::Open => &self.open,
            CalibrationStandard::Load => &self.load,
        }
    }

    /// Known reflections resolved on `sweep`, in SHORT, OPEN, LOAD order
    pub fn resolve<I: SweepInterpolator + ?Sized>(
        &self,
        sweep: &Frequency,
        interpolator: &I,
    ) -> Result<[Array1<Complex64>; 3]> {
        Ok([
            self.short
                .resolve(CalibrationStandard::Short, sweep, interpolator)?,
            self.open
                .resolve(CalibrationStandard::Open, sweep, interpolator)?,
            self.load
                .resolve(CalibrationStandard::Load, sweep, interpolator)?,
        ])
    }
}
