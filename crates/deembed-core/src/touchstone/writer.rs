//! Touchstone file writer
//!
//! Writes S-parameter data in Touchstone v1 layout. The value delimiter is
//! configurable because some analyzers only import tab-separated files.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use super::parser::{Touchstone, TouchstoneError};
use crate::records::Delimiter;

impl fmt::Display for Touchstone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        let mut writer = Cursor::new(&mut buf);
        if self.write_to(&mut writer, Delimiter::Space).is_err() {
            return Err(fmt::Error);
        }
        write!(f, "{}", String::from_utf8_lossy(&buf))
    }
}

impl Touchstone {
    /// Write to a Touchstone file
    pub fn write<P: AsRef<Path>>(
        &self,
        path: P,
        delimiter: Delimiter,
    ) -> Result<(), TouchstoneError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, delimiter)?;
        writer.flush()?;
        Ok(())
    }

    /// Write to a writer
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        delimiter: Delimiter,
    ) -> Result<(), TouchstoneError> {
        for comment in &self.comments {
            writeln!(writer, "! {}", comment)?;
        }

        writeln!(
            writer,
            "# {} S {} R {:.2}",
            self.frequency.unit().as_touchstone(),
            self.format.as_str(),
            self.z0
        )?;

        let sep = delimiter.as_char();
        let f_scaled = self.frequency.f_scaled();

        // Two-port data order is S11 S21 S12 S22
        let order: &[(usize, usize)] = match self.nports {
            1 => &[(0, 0)],
            _ => &[(0, 0), (1, 0), (0, 1), (1, 1)],
        };

        for (k, freq) in f_scaled.iter().enumerate() {
            write!(writer, "{:e}", freq)?;
            for &(i, j) in order {
                let (v1, v2) = self.format.from_complex(self.s[[k, i, j]]);
                write!(writer, "{}{:e}{}{:e}", sep, v1, sep, v2)?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }
}
