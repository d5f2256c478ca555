//! Probe two-port reconstruction
//!
//! The 3-term error model only yields the product `S21 * S12` of a probe.
//! Since a probe is reciprocal, its transmission is the square root of that
//! product; the branch of the root is chosen from the unwrapped phase.

use ndarray::Array1;
use num_complex::Complex64;
use std::path::Path;

use crate::calibration::ErrorModelSolution;
use crate::delay::{DelayTimeEstimate, DelayTimeRefiner};
use crate::error::{DeembedError, Result};
use crate::frequency::{Frequency, FrequencyUnit};
use crate::network::Network;
use crate::phase::{PhaseUnwrapper, UnwrappedPhase};
use crate::records::Delimiter;

/// Characterized probe: a reciprocal two-port plus the phase analysis
/// of its transmission product
#[derive(Debug, Clone)]
pub struct ProbeNetworkModel {
    pub frequency: Frequency,
    pub s11: Array1<Complex64>,
    /// `S21 = S12`
    pub s21: Array1<Complex64>,
    pub s22: Array1<Complex64>,
    /// Phase of `S21 * S12`, wrapped and unwrapped
    pub phase: UnwrappedPhase,
    /// Delay time of `S21 * S12`, i.e. of the round trip through the probe
    pub delay: DelayTimeEstimate,
}

impl ProbeNetworkModel {
    pub fn s12(&self) -> &Array1<Complex64> {
        &self.s21
    }

    pub fn len(&self) -> usize {
        self.s11.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s11.is_empty()
    }

    /// The probe as a 2-port network
    pub fn to_network(&self) -> Result<Network> {
        Network::from_two_port(
            self.frequency.clone(),
            &self.s11,
            &self.s21,
            &self.s21,
            &self.s22,
        )
    }

    /// Save the probe as an S2P record (`# Hz S RI R 50.00`)
    pub fn write_s2p<P: AsRef<Path>>(&self, path: P, delimiter: Delimiter) -> Result<()> {
        let mut ntwk = self.to_network()?;
        ntwk.frequency = ntwk.frequency.with_unit(FrequencyUnit::Hz);
        ntwk.comments.push(format!(
            "probe model, delay time {:e} s (coarse {:e} s)",
            self.delay.refined, self.delay.coarse
        ));
        ntwk.write_touchstone(path, delimiter)?;
        Ok(())
    }
}

/// Recovers a probe's transmission coefficient from its error terms
#[derive(Debug, Default)]
pub struct TransmissionReconstructor {
    pub unwrapper: PhaseUnwrapper,
    pub refiner: DelayTimeRefiner,
}

impl TransmissionReconstructor {
    pub fn new(unwrapper: PhaseUnwrapper, refiner: DelayTimeRefiner) -> Self {
        Self { unwrapper, refiner }
    }

    /// Build the probe model from a solved error model
    pub fn reconstruct(&self, solution: &ErrorModelSolution) -> Result<ProbeNetworkModel> {
        let transvar = solution.transmission_product();
        let f = solution.frequency.f();
        let re: Vec<f64> = transvar.iter().map(|c| c.re).collect();
        let im: Vec<f64> = transvar.iter().map(|c| c.im).collect();

        let mut phase = self.unwrapper.unwrap(f, &re, &im)?;

        if phase.jumps.is_empty() {
            // Without jumps the raw trace is kept; the branch follows the
            // sign of the mid-sweep sample.
            phase.slope_sign = sign(phase.initial[phase.initial.len() / 2]);
        } else if phase.slope == 0.0 || !phase.slope.is_finite() {
            return Err(DeembedError::PhaseUnwrapAmbiguity(format!(
                "{} jump(s) found but the unwrapped slope is {}",
                phase.jumps.len(),
                phase.slope
            )));
        }

        let branch = if phase.slope_sign >= 0 { -1.0 } else { 1.0 };
        let s21: Array1<Complex64> = transvar
            .iter()
            .zip(&phase.unwrapped)
            .map(|(tv, &p)| Complex64::from_polar(tv.norm().sqrt(), branch * p / 2.0))
            .collect();

        let delay = self.refiner.estimate(f, &re, &im, phase.delay_time)?;

        tracing::info!(
            points = f.len(),
            jumps = phase.jumps.len(),
            slope_sign = phase.slope_sign,
            delay = delay.refined,
            converged = delay.converged,
            "probe transmission reconstructed"
        );

        Ok(ProbeNetworkModel {
            frequency: solution.frequency.clone(),
            s11: solution.x.clone(),
            s21,
            s22: solution.y.clone(),
            phase,
            delay,
        })
    }
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}
