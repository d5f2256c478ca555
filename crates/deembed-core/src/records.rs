//! Delimited record I/O
//!
//! Measurements come as three-column `(Hz, Re, Im)` records; results are
//! written as fixed-layout numeric records. Lines starting with `#` or `!`
//! are treated as comments on input.

use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use crate::dispersion::Dispersion;
use crate::error::{DeembedError, Result};
use crate::frequency::Frequency;

/// Field delimiter of a record file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
    Space,
}

impl Delimiter {
    pub fn as_byte(&self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Space => b' ',
        }
    }

    pub fn as_char(&self) -> char {
        self.as_byte() as char
    }
}

impl std::str::FromStr for Delimiter {
    type Err = DeembedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "," | "comma" => Ok(Delimiter::Comma),
            ";" | "semicolon" => Ok(Delimiter::Semicolon),
            "\t" | "tab" => Ok(Delimiter::Tab),
            " " | "space" => Ok(Delimiter::Space),
            other => Err(DeembedError::InvalidInput(format!(
                "unknown delimiter '{}' (use comma, semicolon, tab or space)",
                other
            ))),
        }
    }
}

fn csv_error(e: csv::Error) -> DeembedError {
    let line = e.position().map_or(0, |p| p.line() as usize);
    match e.into_kind() {
        csv::ErrorKind::Io(io) => DeembedError::Io(io),
        kind => DeembedError::Parse {
            line,
            message: format!("{:?}", kind),
        },
    }
}

/// Parse a three-column `(Hz, Re, Im)` record
///
/// Extra columns are ignored. The frequencies must be strictly increasing.
pub fn parse_dispersion(content: &str, delimiter: Delimiter) -> Result<Dispersion> {
    // Blank out comment lines so record positions keep their line numbers
    let cleaned: String = content
        .lines()
        .map(|l| {
            let t = l.trim_start();
            if t.starts_with('#') || t.starts_with('!') {
                ""
            } else {
                l
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(cleaned.as_bytes());

    let mut f = Vec::new();
    let mut values = Vec::new();

    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map_or(0, |p| p.line() as usize);

        // Runs of spaces produce empty fields
        let fields: Vec<&str> = record.iter().filter(|s| !s.is_empty()).collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 3 {
            return Err(DeembedError::Parse {
                line,
                message: format!("expected 3 columns (Hz, Re, Im), found {}", fields.len()),
            });
        }

        let mut row = [0.0; 3];
        for (slot, field) in row.iter_mut().zip(&fields) {
            *slot = field.parse::<f64>().map_err(|_| DeembedError::Parse {
                line,
                message: format!("'{}' is not a number", field),
            })?;
        }
        f.push(row[0]);
        values.push(Complex64::new(row[1], row[2]));
    }

    let frequency = Frequency::try_from_hz(f)?;
    Dispersion::new(frequency, Array1::from(values))
}

/// Read a three-column `(Hz, Re, Im)` record file
pub fn read_dispersion<P: AsRef<Path>>(path: P, delimiter: Delimiter) -> Result<Dispersion> {
    let mut content = String::new();
    File::open(path.as_ref())?.read_to_string(&mut content)?;
    parse_dispersion(&content, delimiter).map_err(|e| match e {
        DeembedError::Parse { line, message } => DeembedError::Parse {
            line,
            message: format!("{}: {}", path.as_ref().display(), message),
        },
        other => other,
    })
}

/// Column layout of a complex-valued output record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `Hz, Re, Im`
    Complex,
    /// `Hz, Re[S], Im[S], |S|, log10|S|`
    SParameter,
    /// `Hz, Re[Z], Im[Z], |Z|, log10(Hz), log10|Z|`
    Impedance,
    /// `Hz, Re[S], Im[S], arg(S)`
    CorrectedS,
    /// `Hz, Re[Z], Im[Z], |Z|`
    CorrectedZ,
}

impl Layout {
    /// Whether rows carry `log10|value|`
    fn logs_magnitude(&self) -> bool {
        matches!(self, Layout::SParameter | Layout::Impedance)
    }

    fn row(&self, f: f64, v: Complex64) -> Vec<f64> {
        match self {
            Layout::Complex => vec![f, v.re, v.im],
            Layout::SParameter => vec![f, v.re, v.im, v.norm(), v.norm().log10()],
            Layout::Impedance => vec![f, v.re, v.im, v.norm(), f.log10(), v.norm().log10()],
            Layout::CorrectedS => vec![f, v.re, v.im, v.arg()],
            Layout::CorrectedZ => vec![f, v.re, v.im, v.norm()],
        }
    }
}

fn write_rows<W, I>(writer: W, delimiter: Delimiter, rows: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = Vec<f64>>,
{
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .from_writer(writer);
    for row in rows {
        out.write_record(row.iter().map(|v| format!("{:e}", v)))
            .map_err(csv_error)?;
    }
    out.flush()?;
    Ok(())
}

fn create<P: AsRef<Path>>(path: P) -> io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Write a dispersion with the given layout
///
/// Layouts with logarithmic columns reject zero-magnitude samples (and
/// non-positive frequencies for `Impedance`) before anything is written.
pub fn write_dispersion<W: Write>(
    writer: W,
    delimiter: Delimiter,
    layout: Layout,
    d: &Dispersion,
) -> Result<()> {
    if layout.logs_magnitude() {
        if let Some(i) = d.values.iter().position(|v| v.norm() == 0.0) {
            return Err(DeembedError::InvalidInput(format!(
                "zero magnitude at frequency index {} has no {:?} log10 column",
                i, layout
            )));
        }
    }
    if layout == Layout::Impedance {
        if let Some(i) = d.f().iter().position(|&f| f <= 0.0) {
            return Err(DeembedError::InvalidInput(format!(
                "non-positive frequency at index {} has no log10 column",
                i
            )));
        }
    }

    let rows = d
        .f()
        .iter()
        .zip(d.values.iter())
        .map(|(&f, &v)| layout.row(f, v));
    write_rows(writer, delimiter, rows)
}

/// Save a dispersion to `path` with the given layout
pub fn save_dispersion<P: AsRef<Path>>(
    path: P,
    delimiter: Delimiter,
    layout: Layout,
    d: &Dispersion,
) -> Result<()> {
    write_dispersion(create(path)?, delimiter, layout, d)
}

/// Write a `(Hz, phase)` record
pub fn write_phase<W: Write>(
    writer: W,
    delimiter: Delimiter,
    f: &[f64],
    phase: &[f64],
) -> Result<()> {
    if f.len() != phase.len() {
        return Err(DeembedError::InvalidInput(format!(
            "{} phase values for {} frequencies",
            phase.len(),
            f.len()
        )));
    }
    let rows = f.iter().zip(phase).map(|(&f, &p)| vec![f, p]);
    write_rows(writer, delimiter, rows)
}

/// Save a `(Hz, phase)` record to `path`
pub fn save_phase<P: AsRef<Path>>(
    path: P,
    delimiter: Delimiter,
    f: &[f64],
    phase: &[f64],
) -> Result<()> {
    write_phase(create(path)?, delimiter, f, phase)
}
