//! Network module - one- and two-port S-parameter data
//!
//! Probe models and de-embedded devices are exchanged as [`Network`]s so they
//! can be cascaded, flipped and stored as Touchstone files.

use ndarray::{Array1, Array3};
use num_complex::Complex64;
use std::path::Path;

use crate::constants::{NEAR_ZERO, Z0_OHMS};
use crate::dispersion::Dispersion;
use crate::error::{DeembedError, Result, Stage};
use crate::frequency::Frequency;
use crate::records::Delimiter;
use crate::touchstone::{SParamFormat, Touchstone, TouchstoneError};

/// An N-port electrical network (N = 1 or 2)
#[derive(Debug, Clone)]
pub struct Network {
    /// Frequency data
    pub frequency: Frequency,
    /// S-parameter data [nfreq, nports, nports]
    pub s: Array3<Complex64>,
    /// Reference impedance (per port)
    pub z0: Array1<Complex64>,
    /// Network name
    pub name: Option<String>,
    /// Comments
    pub comments: Vec<String>,
}

impl Network {
    /// Create a new Network from S-parameters
    pub fn new(frequency: Frequency, s: Array3<Complex64>, z0: Array1<Complex64>) -> Self {
        Self {
            frequency,
            s,
            z0,
            name: None,
            comments: Vec::new(),
        }
    }

    /// Two-port from its four S-parameter traces, referenced to 50 ohms
    pub fn from_two_port(
        frequency: Frequency,
        s11: &Array1<Complex64>,
        s21: &Array1<Complex64>,
        s12: &Array1<Complex64>,
        s22: &Array1<Complex64>,
    ) -> Result<Self> {
        let n = frequency.npoints();
        if [s11, s21, s12, s22].iter().any(|a| a.len() != n) {
            return Err(DeembedError::InvalidInput(format!(
                "two-port traces must all have {} points",
                n
            )));
        }
        let s = Array3::from_shape_fn((n, 2, 2), |(f, i, j)| match (i, j) {
            (0, 0) => s11[f],
            (1, 0) => s21[f],
            (0, 1) => s12[f],
            _ => s22[f],
        });
        let z0 = Array1::from_elem(2, Complex64::new(Z0_OHMS, 0.0));
        Ok(Self::new(frequency, s, z0))
    }

    /// Create from a Touchstone file
    pub fn from_touchstone<P: AsRef<Path>>(path: P) -> std::result::Result<Self, TouchstoneError> {
        let ts = Touchstone::from_file(path)?;
        Ok(Self::from_touchstone_data(ts))
    }

    /// Create from Touchstone content string
    pub fn from_touchstone_content(
        content: &str,
        nports: usize,
    ) -> std::result::Result<Self, TouchstoneError> {
        let ts = Touchstone::from_str(content, nports)?;
        Ok(Self::from_touchstone_data(ts))
    }

    fn from_touchstone_data(ts: Touchstone) -> Self {
        let z0 = Array1::from_elem(ts.nports, Complex64::new(ts.z0, 0.0));
        Self {
            frequency: ts.frequency,
            s: ts.s,
            z0,
            name: None,
            comments: ts.comments,
        }
    }

    /// Touchstone representation in real/imaginary format
    pub fn to_touchstone(&self) -> Touchstone {
        Touchstone {
            nports: self.nports(),
            frequency: self.frequency.clone(),
            s: self.s.clone(),
            z0: self.z0.first().map_or(Z0_OHMS, |z| z.re),
            comments: self.comments.clone(),
            format: SParamFormat::RI,
        }
    }

    /// Write the network to a Touchstone file
    pub fn write_touchstone<P: AsRef<Path>>(
        &self,
        path: P,
        delimiter: Delimiter,
    ) -> std::result::Result<(), TouchstoneError> {
        self.to_touchstone().write(path, delimiter)
    }

    /// Get the number of ports
    pub fn nports(&self) -> usize {
        self.s.shape()[1]
    }

    /// Get the number of frequency points
    pub fn nfreq(&self) -> usize {
        self.s.shape()[0]
    }

    /// Trace of S(i+1, j+1) over the sweep
    pub fn s_param(&self, i: usize, j: usize) -> Result<Dispersion> {
        let n = self.nports();
        if i >= n || j >= n {
            return Err(DeembedError::InvalidInput(format!(
                "S{}{} does not exist in a {}-port",
                i + 1,
                j + 1,
                n
            )));
        }
        let values = (0..self.nfreq()).map(|f| self.s[[f, i, j]]).collect();
        Dispersion::new(self.frequency.clone(), values)
    }

    fn ensure_two_port(&self) -> Result<()> {
        if self.nports() != 2 {
            return Err(DeembedError::InvalidInput(format!(
                "operation needs a 2-port, got {} ports",
                self.nports()
            )));
        }
        Ok(())
    }

    /// Cascade with another network (self ** other)
    ///
    /// Connects port 2 of self to port 1 of other.
    pub fn cascade(&self, other: &Network) -> Result<Network> {
        self.ensure_two_port()?;
        other.ensure_two_port()?;
        self.frequency
            .ensure_matches(&other.frequency, "cascaded network")?;

        let nfreq = self.nfreq();
        let mut s_result = Array3::<Complex64>::zeros((nfreq, 2, 2));

        for f in 0..nfreq {
            let a = |i, j| self.s[[f, i, j]];
            let b = |i, j| other.s[[f, i, j]];

            let denom = Complex64::new(1.0, 0.0) - a(1, 1) * b(0, 0);
            if denom.norm() <= NEAR_ZERO {
                return Err(DeembedError::singular(Stage::Cascade).at(f));
            }

            s_result[[f, 0, 0]] = a(0, 0) + a(0, 1) * a(1, 0) * b(0, 0) / denom;
            s_result[[f, 0, 1]] = a(0, 1) * b(0, 1) / denom;
            s_result[[f, 1, 0]] = a(1, 0) * b(1, 0) / denom;
            s_result[[f, 1, 1]] = b(1, 1) + b(0, 1) * b(1, 0) * a(1, 1) / denom;
        }

        Ok(Network::new(
            self.frequency.clone(),
            s_result,
            self.z0.clone(),
        ))
    }

    /// Swap port 1 and port 2
    pub fn flipped(&self) -> Result<Network> {
        self.ensure_two_port()?;
        let s = Array3::from_shape_fn(self.s.raw_dim(), |(f, i, j)| self.s[[f, 1 - i, 1 - j]]);
        let z0 = Array1::from_vec(vec![self.z0[1], self.z0[0]]);
        Ok(Network::new(self.frequency.clone(), s, z0))
    }
}
