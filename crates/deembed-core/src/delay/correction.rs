//! Delay extraction over a sub-sweep and delay-corrected impedance

use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use super::refine::{DelayTimeEstimate, DelayTimeRefiner};
use crate::dispersion::Dispersion;
use crate::error::{DeembedError, Result};
use crate::math::{reflection_2_impedance, remove_delay, transmission_2_series_impedance};
use crate::phase::{PhaseUnwrapper, UnwrappedPhase};

/// Which S-parameter an impedance is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpedanceSource {
    /// One-port reflection, `Z = 50 (1 + S) / (1 - S)`
    S11,
    /// Series two-port transmission, `Z = 100 (1 - S) / S`
    S21,
}

impl ImpedanceSource {
    /// Impedance of every point of `s`
    pub fn impedance(&self, s: &Dispersion) -> Result<Dispersion> {
        let values = s
            .values
            .iter()
            .enumerate()
            .map(|(i, &v)| self.convert(v).map_err(|e| e.at(i)))
            .collect::<Result<Array1<Complex64>>>()?;
        Dispersion::new(s.frequency.clone(), values)
    }

    fn convert(&self, s: Complex64) -> Result<Complex64> {
        match self {
            ImpedanceSource::S11 => reflection_2_impedance(s),
            ImpedanceSource::S21 => transmission_2_series_impedance(s),
        }
    }
}

impl std::str::FromStr for ImpedanceSource {
    type Err = DeembedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "s11" => Ok(ImpedanceSource::S11),
            "s21" => Ok(ImpedanceSource::S21),
            other => Err(DeembedError::InvalidInput(format!(
                "impedance source must be s11 or s21, got '{}'",
                other
            ))),
        }
    }
}

/// `S * exp(+i*2*pi*f*dt)` at every point
pub fn correct_delay(s: &Dispersion, dt: f64) -> Dispersion {
    let values = s
        .f()
        .iter()
        .zip(s.values.iter())
        .map(|(&f, &v)| remove_delay(v, f, dt))
        .collect();
    Dispersion {
        frequency: s.frequency.clone(),
        values,
    }
}

/// Delay-corrected trace and its impedance
#[derive(Debug, Clone)]
pub struct DelayCorrected {
    pub s: Dispersion,
    pub z: Dispersion,
}

/// Remove a delay of `dt` seconds from `s`, then convert to impedance
pub fn delay_corrected_impedance(
    s: &Dispersion,
    dt: f64,
    source: ImpedanceSource,
) -> Result<DelayCorrected> {
    if !dt.is_finite() {
        return Err(DeembedError::InvalidInput(format!(
            "delay time must be finite, got {}",
            dt
        )));
    }
    let s = correct_delay(s, dt);
    let z = source.impedance(&s)?;
    Ok(DelayCorrected { s, z })
}

/// Phase and delay time of a measured trace over `[f_start, f_stop]`
#[derive(Debug, Clone)]
pub struct DelayExtraction {
    /// The trace restricted to the sub-sweep
    pub trace: Dispersion,
    pub phase: UnwrappedPhase,
    pub delay: DelayTimeEstimate,
}

/// Crop `s` to `[f_start, f_stop]` (Hz), unwrap its phase and refine the delay
pub fn extract_delay(
    s: &Dispersion,
    f_start: f64,
    f_stop: f64,
    unwrapper: &PhaseUnwrapper,
    refiner: &DelayTimeRefiner,
) -> Result<DelayExtraction> {
    let trace = s.cropped(f_start, f_stop)?;
    let (re, im) = (trace.re(), trace.im());

    let phase = unwrapper.unwrap(trace.f(), &re, &im)?;
    let delay = refiner.estimate(trace.f(), &re, &im, phase.delay_time)?;

    tracing::info!(
        points = trace.len(),
        jumps = phase.jumps.len(),
        coarse = delay.coarse,
        refined = delay.refined,
        "delay time extracted"
    );

    Ok(DelayExtraction {
        trace,
        phase,
        delay,
    })
}
