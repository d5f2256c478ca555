//! Touchstone file I/O module
//!
//! Provides reading and writing of one- and two-port Touchstone (.s1p/.s2p)
//! files, used to store probe models between runs.

pub mod parser;
pub mod writer;

pub use parser::{OptionLine, SParamFormat, Touchstone, TouchstoneError};
