//! deembed-core: Probe characterization and S-parameter de-embedding
//!
//! Recovers the true reflection, transmission and impedance of a device from
//! vector network analyzer readings taken through measurement probes.
//!
//! ## Modules
//!
//! - `frequency` - Frequency sweep representation
//! - `dispersion` - Complex values over a sweep
//! - `phase` - Phase jump detection and unwrapping
//! - `calibration` - SHORT/OPEN/LOAD standards and the 3-term error model
//! - `probe` - Probe two-port reconstruction
//! - `deembed` - One- and two-probe de-embedding with chain matrices
//! - `delay` - Delay-time refinement and correction
//! - `network` - 1- and 2-port S-parameter networks
//! - `touchstone` - Touchstone (S1P/S2P) file I/O
//! - `records` - Delimited record I/O
//! - `config` - Run configuration
//! - `pipeline` - Stage composition over record files
//! - `math` - Linear solves, regression, conversions and splines

pub mod calibration;
pub mod config;
pub mod constants;
pub mod deembed;
pub mod delay;
pub mod dispersion;
pub mod error;
pub mod frequency;
pub mod math;
pub mod network;
pub mod phase;
pub mod pipeline;
pub mod probe;
pub mod records;
pub mod sweep;
pub mod touchstone;

pub use calibration::{ErrorModelSolution, ErrorModelSolver, StandardSet};
pub use config::{load_config, DeembedConfig};
pub use deembed::NetworkCascadeDeembedder;
pub use delay::{DelayTimeEstimate, DelayTimeRefiner};
pub use dispersion::Dispersion;
pub use error::{DeembedError, Result};
pub use frequency::Frequency;
pub use network::Network;
pub use phase::{PhaseUnwrapper, UnwrapMode};
pub use probe::{ProbeNetworkModel, TransmissionReconstructor};
pub use sweep::FailurePolicy;
