//! One-probe reflection de-embedding

use num_complex::Complex64;

use super::{ensure_two_port, point, NetworkCascadeDeembedder};
use crate::calibration::ErrorTerms;
use crate::dispersion::Dispersion;
use crate::error::Result;
use crate::math::reflection_2_impedance;
use crate::network::Network;
use crate::sweep::map_points;

/// Device reflection and impedance behind one probe
#[derive(Debug, Clone)]
pub struct OnePortDeembedding {
    /// `S11` at the device plane
    pub s11: Dispersion,
    /// `50 (1 + S11) / (1 - S11)`
    pub z: Dispersion,
}

impl NetworkCascadeDeembedder {
    /// Remove `probe` from the reflection `measured` read through it
    ///
    /// `S11 = (Sm - x) / (z + x*y + y*(Sm - x))` with the probe's error terms.
    pub fn one_port(&self, measured: &Dispersion, probe: &Network) -> Result<OnePortDeembedding> {
        ensure_two_port(probe, "probe")?;
        measured
            .frequency
            .ensure_matches(&probe.frequency, "probe model")?;

        let values: Vec<(Complex64, Complex64)> = map_points(measured.len(), self.policy, |i| {
            let p = point(probe, i);
            let terms = ErrorTerms::from_s(p.s11, p.s21, p.s12, p.s22);
            let s11 = terms.actual(measured.values[i]).map_err(|e| e.at(i))?;
            let z = reflection_2_impedance(s11).map_err(|e| e.at(i))?;
            Ok((s11, z))
        })?;

        tracing::debug!(points = values.len(), "one-port de-embedding done");

        let frequency = measured.frequency.clone();
        Ok(OnePortDeembedding {
            s11: Dispersion::new(frequency.clone(), values.iter().map(|v| v.0).collect())?,
            z: Dispersion::new(frequency, values.iter().map(|v| v.1).collect())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DeembedError, Stage};
    use crate::frequency::{Frequency, FrequencyUnit};
    use crate::sweep::FailurePolicy;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn probe(n: usize) -> Network {
        let freq = Frequency::new(1.0, 2.0, n, FrequencyUnit::GHz);
        let s11 = Array1::from_elem(n, c(0.1, -0.05));
        let s21 = Array1::from_elem(n, c(0.3, -0.9));
        let s22 = Array1::from_elem(n, c(-0.05, 0.02));
        Network::from_two_port(freq, &s11, &s21, &s21, &s22).unwrap()
    }

    #[test]
    fn test_recovers_load_behind_probe() {
        let p = probe(4);
        let gamma = c(0.2, 0.3);
        let p0 = point(&p, 0);
        let reading = ErrorTerms::from_s(p0.s11, p0.s21, p0.s12, p0.s22).measured(gamma);
        let measured = Dispersion::constant(p.frequency.clone(), reading);

        let out = NetworkCascadeDeembedder::default()
            .one_port(&measured, &p)
            .unwrap();
        assert_relative_eq!(out.s11.values[2].re, 0.2, epsilon = 1e-12);
        assert_relative_eq!(out.s11.values[2].im, 0.3, epsilon = 1e-12);

        let z = 50.0 * (c(1.0, 0.0) + gamma) / (c(1.0, 0.0) - gamma);
        assert_relative_eq!(out.z.values[3].re, z.re, epsilon = 1e-9);
        assert_relative_eq!(out.z.values[3].im, z.im, epsilon = 1e-9);
    }

    #[test]
    fn test_disconnected_probe_is_singular() {
        let freq = Frequency::new(1.0, 2.0, 3, FrequencyUnit::GHz);
        let s11 = Array1::from_elem(3, c(0.1, 0.0));
        let zero = Array1::from_elem(3, c(0.0, 0.0));
        let p = Network::from_two_port(freq.clone(), &s11, &zero, &zero, &zero).unwrap();
        let measured = Dispersion::constant(freq, c(0.3, 0.1));

        let err = NetworkCascadeDeembedder::new(FailurePolicy::FailFast)
            .one_port(&measured, &p)
            .unwrap_err();
        assert!(matches!(
            err,
            DeembedError::SingularSystem {
                stage: Stage::OnePort,
                index: Some(0)
            }
        ));
    }

    #[test]
    fn test_mismatched_grid_rejected() {
        let p = probe(3);
        let other = Frequency::new(1.0, 3.0, 3, FrequencyUnit::GHz);
        let measured = Dispersion::constant(other, c(0.1, 0.0));
        assert!(matches!(
            NetworkCascadeDeembedder::default().one_port(&measured, &p),
            Err(DeembedError::InvalidInput(_))
        ));
    }
}
