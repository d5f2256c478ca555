//! Two-probe de-embedding of a 2-port

use ndarray::Array1;
use num_complex::Complex64;

use super::cascade::{CascadeMatrix, TwoPortPoint};
use super::{ensure_two_port, point, NetworkCascadeDeembedder};
use crate::dispersion::Dispersion;
use crate::error::Result;
use crate::math::transmission_2_series_impedance;
use crate::network::Network;
use crate::sweep::map_points;

/// Device 2-port between two probes
#[derive(Debug, Clone)]
pub struct TwoPortDeembedding {
    /// Full S-matrix at the device planes
    pub network: Network,
    /// `S21` at the device planes
    pub s21: Dispersion,
    /// Series impedance `100 (1 - S21) / S21`
    pub z: Dispersion,
}

impl NetworkCascadeDeembedder {
    /// Remove `probe1` (on analyzer port 1) and `probe2` (on analyzer port 2)
    /// from the 2-port `measured`
    ///
    /// Both probe models have their port 1 on the analyzer side.
    pub fn two_port(
        &self,
        measured: &Network,
        probe1: &Network,
        probe2: &Network,
    ) -> Result<TwoPortDeembedding> {
        ensure_two_port(measured, "measured network")?;
        ensure_two_port(probe1, "probe 1")?;
        ensure_two_port(probe2, "probe 2")?;
        measured
            .frequency
            .ensure_matches(&probe1.frequency, "probe 1 model")?;
        measured
            .frequency
            .ensure_matches(&probe2.frequency, "probe 2 model")?;

        let points = map_points(measured.nfreq(), self.policy, |i| {
            deembed_point(&point(measured, i), &point(probe1, i), &point(probe2, i))
                .map_err(|e| e.at(i))
        })?;

        let frequency = measured.frequency.clone();
        let column = |pick: fn(&TwoPortPoint) -> Complex64| -> Array1<Complex64> {
            points.iter().map(pick).collect()
        };
        let (s11, s21, s12, s22) = (
            column(|p| p.s11),
            column(|p| p.s21),
            column(|p| p.s12),
            column(|p| p.s22),
        );

        let z = s21
            .iter()
            .enumerate()
            .map(|(i, &v)| transmission_2_series_impedance(v).map_err(|e| e.at(i)))
            .collect::<Result<Array1<Complex64>>>()?;

        tracing::debug!(points = points.len(), "two-port de-embedding done");

        let mut network = Network::from_two_port(frequency.clone(), &s11, &s21, &s12, &s22)?;
        network.name = measured.name.clone();

        Ok(TwoPortDeembedding {
            network,
            s21: Dispersion::new(frequency.clone(), s21)?,
            z: Dispersion::new(frequency, z)?,
        })
    }
}

/// `PA = M(P2')^-1 * M(measured) * M(P1)^-1`, then back to S-parameters
fn deembed_point(
    measured: &TwoPortPoint,
    probe1: &TwoPortPoint,
    probe2: &TwoPortPoint,
) -> Result<TwoPortPoint> {
    let inv_p1 = CascadeMatrix::inverse_from_s(probe1)?;
    let inv_p2 = CascadeMatrix::inverse_from_s(&probe2.flipped())?;
    let pm = CascadeMatrix::from_s(measured)?;
    (inv_p2 * (pm * inv_p1)).to_s()
}
