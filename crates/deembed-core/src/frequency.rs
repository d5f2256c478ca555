//! Frequency module - represents a measurement sweep
//!
//! All dispersion arrays are indexed 1:1 against a [`Frequency`]. Sweeps built
//! from measured data are validated to be finite and strictly increasing.

use crate::error::{DeembedError, Result};

/// Frequency unit enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyUnit {
    #[default]
    Hz,
    KHz,
    MHz,
    GHz,
    THz,
}

impl FrequencyUnit {
    /// Get the multiplier to convert to Hz
    pub fn multiplier(&self) -> f64 {
        match self {
            FrequencyUnit::Hz => 1.0,
            FrequencyUnit::KHz => 1e3,
            FrequencyUnit::MHz => 1e6,
            FrequencyUnit::GHz => 1e9,
            FrequencyUnit::THz => 1e12,
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "hz" => Some(FrequencyUnit::Hz),
            "khz" => Some(FrequencyUnit::KHz),
            "mhz" => Some(FrequencyUnit::MHz),
            "ghz" => Some(FrequencyUnit::GHz),
            "thz" => Some(FrequencyUnit::THz),
            _ => None,
        }
    }

    /// Touchstone option-line spelling
    pub fn as_touchstone(&self) -> &'static str {
        match self {
            FrequencyUnit::Hz => "Hz",
            FrequencyUnit::KHz => "kHz",
            FrequencyUnit::MHz => "MHz",
            FrequencyUnit::GHz => "GHz",
            FrequencyUnit::THz => "THz",
        }
    }
}

/// A frequency sweep
#[derive(Debug, Clone, PartialEq)]
pub struct Frequency {
    /// Frequency vector in Hz
    f: Vec<f64>,
    /// Display unit
    unit: FrequencyUnit,
}

impl Frequency {
    /// Create a linear sweep from start/stop/npoints given in `unit`
    ///
    /// # Example
    /// ```
    /// use deembed_core::frequency::{Frequency, FrequencyUnit};
    /// let freq = Frequency::new(1.0, 2.0, 11, FrequencyUnit::GHz);
    /// assert_eq!(freq.npoints(), 11);
    /// ```
    pub fn new(start: f64, stop: f64, npoints: usize, unit: FrequencyUnit) -> Self {
        let mult = unit.multiplier();
        let start_hz = start * mult;
        let stop_hz = stop * mult;

        let f = if npoints == 1 {
            vec![start_hz]
        } else {
            let step = (stop_hz - start_hz) / (npoints - 1) as f64;
            (0..npoints).map(|i| start_hz + i as f64 * step).collect()
        };

        Self { f, unit }
    }

    /// Create from a frequency vector given in `unit`, without validation
    pub fn from_f(f: Vec<f64>, unit: FrequencyUnit) -> Self {
        let mult = unit.multiplier();
        Self {
            f: f.iter().map(|&x| x * mult).collect(),
            unit,
        }
    }

    /// Create from measured frequencies in Hz
    ///
    /// Fails with `InvalidInput` if any value is non-finite or the sequence
    /// is not strictly increasing.
    pub fn try_from_hz(f: Vec<f64>) -> Result<Self> {
        if let Some(i) = f.iter().position(|x| !x.is_finite()) {
            return Err(DeembedError::InvalidInput(format!(
                "non-finite frequency at index {}",
                i
            )));
        }
        if let Some(i) = f.windows(2).position(|w| w[1] <= w[0]) {
            return Err(DeembedError::InvalidInput(format!(
                "frequencies must be strictly increasing (index {}: {} Hz -> {} Hz)",
                i + 1,
                f[i],
                f[i + 1]
            )));
        }
        Ok(Self {
            f,
            unit: FrequencyUnit::Hz,
        })
    }

    /// Get frequency vector in Hz
    #[inline]
    pub fn f(&self) -> &[f64] {
        &self.f
    }

    /// Get frequency vector in the current unit
    pub fn f_scaled(&self) -> Vec<f64> {
        let mult = self.unit.multiplier();
        self.f.iter().map(|&x| x / mult).collect()
    }

    /// Get the number of frequency points
    #[inline]
    pub fn npoints(&self) -> usize {
        self.f.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.f.is_empty()
    }

    /// Get the start frequency in Hz
    #[inline]
    pub fn start(&self) -> f64 {
        *self.f.first().unwrap_or(&0.0)
    }

    /// Get the stop frequency in Hz
    #[inline]
    pub fn stop(&self) -> f64 {
        *self.f.last().unwrap_or(&0.0)
    }

    /// Get the current unit
    #[inline]
    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    /// Same points displayed in another unit
    pub fn with_unit(&self, unit: FrequencyUnit) -> Self {
        Self {
            f: self.f.clone(),
            unit,
        }
    }

    /// Indices of the points inside the inclusive range `[f_start, f_stop]` (Hz)
    ///
    /// The range must satisfy `start <= f_start <= f_stop <= stop`.
    pub fn range_indices(&self, f_start: f64, f_stop: f64) -> Result<Vec<usize>> {
        if !(self.start() <= f_start && f_start <= f_stop && f_stop <= self.stop()) {
            return Err(DeembedError::InvalidInput(format!(
                "sub-sweep must satisfy {} <= f_start <= f_stop <= {} (got {} .. {})",
                self.start(),
                self.stop(),
                f_start,
                f_stop
            )));
        }
        Ok(self
            .f
            .iter()
            .enumerate()
            .filter(|(_, &freq)| freq >= f_start && freq <= f_stop)
            .map(|(i, _)| i)
            .collect())
    }

    /// Check that another sweep carries the same points
    pub fn ensure_matches(&self, other: &Frequency, what: &str) -> Result<()> {
        if self.npoints() != other.npoints() {
            return Err(DeembedError::InvalidInput(format!(
                "{} has {} frequency points, expected {}",
                what,
                other.npoints(),
                self.npoints()
            )));
        }
        let tol = 1e-9 * self.stop().abs().max(1.0);
        if let Some(i) = self
            .f
            .iter()
            .zip(other.f())
            .position(|(a, b)| (a - b).abs() > tol)
        {
            return Err(DeembedError::InvalidInput(format!(
                "{} frequency grid differs at index {} ({} Hz vs {} Hz)",
                what,
                i,
                other.f()[i],
                self.f[i]
            )));
        }
        Ok(())
    }
}
