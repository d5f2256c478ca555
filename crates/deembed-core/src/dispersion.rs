//! Complex dispersion - one complex value per sweep point

use ndarray::Array1;
use num_complex::Complex64;

use crate::error::{DeembedError, Result};
use crate::frequency::Frequency;
use crate::math::SweepInterpolator;

/// A reflection or transmission coefficient sampled over a sweep
#[derive(Debug, Clone)]
pub struct Dispersion {
    /// Sweep the values are indexed against
    pub frequency: Frequency,
    /// Complex value per frequency point
    pub values: Array1<Complex64>,
}

impl Dispersion {
    /// Pair a sweep with its values; lengths must agree.
    pub fn new(frequency: Frequency, values: Array1<Complex64>) -> Result<Self> {
        if frequency.npoints() != values.len() {
            return Err(DeembedError::InvalidInput(format!(
                "dispersion has {} values for {} frequency points",
                values.len(),
                frequency.npoints()
            )));
        }
        Ok(Self { frequency, values })
    }

    /// Same value at every point of the sweep
    pub fn constant(frequency: Frequency, value: Complex64) -> Self {
        let values = Array1::from_elem(frequency.npoints(), value);
        Self { frequency, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Frequencies in Hz
    pub fn f(&self) -> &[f64] {
        self.frequency.f()
    }

    pub fn re(&self) -> Vec<f64> {
        self.values.iter().map(|c| c.re).collect()
    }

    pub fn im(&self) -> Vec<f64> {
        self.values.iter().map(|c| c.im).collect()
    }

    /// Wrapped phase in (-pi, pi]
    pub fn phase(&self) -> Vec<f64> {
        self.values.iter().map(|c| c.im.atan2(c.re)).collect()
    }

    /// Resample onto another sweep, real and imaginary parts separately
    pub fn resample<I: SweepInterpolator + ?Sized>(
        &self,
        target: &Frequency,
        interpolator: &I,
    ) -> Result<Dispersion> {
        let re = interpolator.resample(self.f(), &self.re(), target.f())?;
        let im = interpolator.resample(self.f(), &self.im(), target.f())?;
        let values = re
            .into_iter()
            .zip(im)
            .map(|(r, i)| Complex64::new(r, i))
            .collect::<Array1<_>>();
        Dispersion::new(target.clone(), values)
    }

    /// Points inside the inclusive range `[f_start, f_stop]` (Hz)
    pub fn cropped(&self, f_start: f64, f_stop: f64) -> Result<Dispersion> {
        let indices = self.frequency.range_indices(f_start, f_stop)?;
        let f: Vec<f64> = indices.iter().map(|&i| self.f()[i]).collect();
        let values: Array1<Complex64> = indices.iter().map(|&i| self.values[i]).collect();
        let frequency = Frequency::try_from_hz(f)?.with_unit(self.frequency.unit());
        Dispersion::new(frequency, values)
    }
}
