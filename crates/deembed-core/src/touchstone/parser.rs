//! Touchstone file parser
//!
//! Reads version 1 S-parameter files with one or two ports. Data lines may be
//! separated by whitespace, commas, semicolons or tabs, so probe models saved
//! with any record delimiter can be read back.

use ndarray::Array3;
use num_complex::Complex64;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use crate::frequency::{Frequency, FrequencyUnit};

/// Touchstone parsing errors
#[derive(Error, Debug)]
pub enum TouchstoneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid option line: {0}")]
    InvalidOption(String),

    #[error("Invalid file extension: expected .s1p or .s2p")]
    InvalidExtension,
}

/// S-parameter data format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SParamFormat {
    #[default]
    RI, // Real-Imaginary
    MA, // Magnitude-Angle (degrees)
    DB, // dB-Angle (degrees)
}

impl SParamFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RI" => Some(SParamFormat::RI),
            "MA" => Some(SParamFormat::MA),
            "DB" => Some(SParamFormat::DB),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SParamFormat::RI => "RI",
            SParamFormat::MA => "MA",
            SParamFormat::DB => "DB",
        }
    }

    /// Complex value from the two numbers of a data pair
    pub fn to_complex(&self, v1: f64, v2: f64) -> Complex64 {
        match self {
            SParamFormat::RI => Complex64::new(v1, v2),
            SParamFormat::MA => Complex64::from_polar(v1, v2.to_radians()),
            SParamFormat::DB => Complex64::from_polar(10.0_f64.powf(v1 / 20.0), v2.to_radians()),
        }
    }

    /// The two numbers of a data pair for a complex value
    pub fn from_complex(&self, c: Complex64) -> (f64, f64) {
        match self {
            SParamFormat::RI => (c.re, c.im),
            SParamFormat::MA => (c.norm(), c.arg().to_degrees()),
            SParamFormat::DB => (20.0 * c.norm().log10(), c.arg().to_degrees()),
        }
    }
}

/// Contents of the `#` option line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionLine {
    pub unit: FrequencyUnit,
    pub format: SParamFormat,
    pub z0: f64,
}

impl Default for OptionLine {
    /// Touchstone v1 defaults: `# GHz S MA R 50`
    fn default() -> Self {
        Self {
            unit: FrequencyUnit::GHz,
            format: SParamFormat::MA,
            z0: 50.0,
        }
    }
}

/// Touchstone file data
#[derive(Debug, Clone)]
pub struct Touchstone {
    /// Number of ports (1 or 2)
    pub nports: usize,
    /// Frequency data
    pub frequency: Frequency,
    /// S-parameters [nfreq, nports, nports]
    pub s: Array3<Complex64>,
    /// Reference impedance
    pub z0: f64,
    /// Comments from the file
    pub comments: Vec<String>,
    /// Data format
    pub format: SParamFormat,
}

impl Touchstone {
    /// Parse a Touchstone file, taking the port count from its extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TouchstoneError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or(TouchstoneError::InvalidExtension)?;
        let nports = Self::parse_extension(ext)?;

        let file = File::open(path)?;
        Self::parse(BufReader::new(file), nports)
    }

    /// Port count from an `.sNp` extension
    fn parse_extension(ext: &str) -> Result<usize, TouchstoneError> {
        match ext.to_lowercase().as_str() {
            "s1p" => Ok(1),
            "s2p" => Ok(2),
            _ => Err(TouchstoneError::InvalidExtension),
        }
    }

    /// Parse from string content
    pub fn from_str(content: &str, nports: usize) -> Result<Self, TouchstoneError> {
        if !matches!(nports, 1 | 2) {
            return Err(TouchstoneError::InvalidOption(format!(
                "{} ports not supported",
                nports
            )));
        }
        Self::parse(std::io::Cursor::new(content), nports)
    }

    fn parse<R: BufRead>(reader: R, nports: usize) -> Result<Self, TouchstoneError> {
        let per_point = 1 + 2 * nports * nports;
        let mut options: Option<OptionLine> = None;
        let mut comments = Vec::new();
        let mut buffer: Vec<f64> = Vec::with_capacity(per_point);
        let mut points: Vec<Vec<f64>> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;

            // Strip trailing comments
            let (data, comment) = match line.find('!') {
                Some(i) => (&line[..i], Some(line[i + 1..].trim())),
                None => (line.as_str(), None),
            };
            if let Some(c) = comment.filter(|c| !c.is_empty()) {
                comments.push(c.to_string());
            }

            let data = data.trim();
            if data.is_empty() {
                continue;
            }
            if data.starts_with('#') {
                if options.is_none() {
                    options = Some(Self::parse_option_line(data)?);
                }
                continue;
            }

            for token in data
                .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
                .filter(|t| !t.is_empty())
            {
                let value = token.parse::<f64>().map_err(|_| TouchstoneError::Parse {
                    line: line_no,
                    message: format!("'{}' is not a number", token),
                })?;
                buffer.push(value);
                if buffer.len() == per_point {
                    if let Some(prev) = points.last() {
                        if buffer[0] <= prev[0] {
                            return Err(TouchstoneError::Parse {
                                line: line_no,
                                message: "frequencies must be strictly increasing".to_string(),
                            });
                        }
                    }
                    points.push(std::mem::take(&mut buffer));
                }
            }
        }

        if !buffer.is_empty() {
            return Err(TouchstoneError::Parse {
                line: 0,
                message: format!(
                    "{} trailing values do not form a complete {}-port data point",
                    buffer.len(),
                    nports
                ),
            });
        }

        let options = options.unwrap_or_default();
        let nfreq = points.len();
        let frequency = Frequency::from_f(points.iter().map(|p| p[0]).collect(), options.unit);

        // Two-port data order is S11 S21 S12 S22
        let s = Array3::from_shape_fn((nfreq, nports, nports), |(k, i, j)| {
            let pair = 1 + 2 * (j * nports + i);
            options
                .format
                .to_complex(points[k][pair], points[k][pair + 1])
        });

        Ok(Touchstone {
            nports,
            frequency,
            s,
            z0: options.z0,
            comments,
            format: options.format,
        })
    }

    /// Parse the option line (`# Hz S RI R 50`)
    pub fn parse_option_line(line: &str) -> Result<OptionLine, TouchstoneError> {
        let body = line.trim_start_matches('#');
        let parts: Vec<&str> = body.split_whitespace().collect();
        let mut options = OptionLine::default();

        let mut i = 0;
        while i < parts.len() {
            let part = parts[i];
            if let Some(unit) = FrequencyUnit::from_str(part) {
                options.unit = unit;
            } else if let Some(fmt) = SParamFormat::from_str(part) {
                options.format = fmt;
            } else if part.eq_ignore_ascii_case("S") {
                // Only scattering parameters are read
            } else if part.eq_ignore_ascii_case("R") {
                let z0 = parts
                    .get(i + 1)
                    .and_then(|v| v.parse::<f64>().ok())
                    .ok_or_else(|| {
                        TouchstoneError::InvalidOption(format!("missing resistance in '{}'", line))
                    })?;
                options.z0 = z0;
                i += 1;
            } else {
                return Err(TouchstoneError::InvalidOption(format!(
                    "unsupported option '{}' in '{}'",
                    part, line
                )));
            }
            i += 1;
        }

        Ok(options)
    }

    /// Get the number of frequency points
    pub fn nfreq(&self) -> usize {
        self.s.shape()[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_extension() {
        assert_eq!(Touchstone::parse_extension("s1p").unwrap(), 1);
        assert_eq!(Touchstone::parse_extension("S2P").unwrap(), 2);
        assert!(Touchstone::parse_extension("s4p").is_err());
    }

    #[test]
    fn test_parse_option_line() {
        let opts = Touchstone::parse_option_line("# Hz S RI R 50.00").unwrap();
        assert_eq!(opts.unit, FrequencyUnit::Hz);
        assert_eq!(opts.format, SParamFormat::RI);
        assert_eq!(opts.z0, 50.0);

        let opts = Touchstone::parse_option_line("# MHz S DB R 75").unwrap();
        assert_eq!(opts.unit, FrequencyUnit::MHz);
        assert_eq!(opts.format, SParamFormat::DB);
        assert_eq!(opts.z0, 75.0);

        assert!(Touchstone::parse_option_line("# GHz Z RI R 50").is_err());
    }

    #[test]
    fn test_two_port_order_and_delimiters() {
        let content = "! probe model\n# GHz S RI R 50\n\
                       1.0,0.1,0.0,0.9,0.1,0.8,0.2,0.3,0.0\n\
                       2.0\t0.2\t0.0\t0.7\t0.1\t0.6\t0.2\t0.4\t0.0\n";
        let ts = Touchstone::from_str(content, 2).unwrap();
        assert_eq!(ts.nfreq(), 2);
        assert_eq!(ts.comments, vec!["probe model".to_string()]);
        assert_relative_eq!(ts.frequency.f()[1], 2e9);
        assert_eq!(ts.s[[0, 1, 0]], Complex64::new(0.9, 0.1)); // S21
        assert_eq!(ts.s[[0, 0, 1]], Complex64::new(0.8, 0.2)); // S12
        assert_eq!(ts.s[[1, 1, 1]], Complex64::new(0.4, 0.0)); // S22
    }

    #[test]
    fn test_ma_format() {
        let ts = Touchstone::from_str("# Hz S MA R 50\n1e9 0.5 90\n", 1).unwrap();
        assert_relative_eq!(ts.s[[0, 0, 0]].re, 0.0, epsilon = 1e-15);
        assert_relative_eq!(ts.s[[0, 0, 0]].im, 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_incomplete_point() {
        let err = Touchstone::from_str("# Hz S RI R 50\n1e9 0.5 0.1 0.2\n", 2);
        assert!(matches!(err, Err(TouchstoneError::Parse { .. })));
    }

    #[test]
    fn test_bad_token_line_number() {
        match Touchstone::from_str("# Hz S RI R 50\n1e9 abc 0.1\n", 1) {
            Err(TouchstoneError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
