//! De-embedding module - removing characterized probes from measurements
//!
//! A single probe is removed from a reflection reading by inverting its
//! bilinear 3-term model. Two probes around a 2-port are removed with chain
//! matrices:
//!
//! ```text
//! M(DUT) = M(P2')^-1 * M(measured) * M(P1)^-1
//! ```
//!
//! where `P2'` is probe 2 with its ports swapped, since its port 1 faces the
//! analyzer.

mod cascade;
mod one_port;
mod two_port;

pub use cascade::{CascadeMatrix, TwoPortPoint};
pub use one_port::OnePortDeembedding;
pub use two_port::TwoPortDeembedding;

use crate::network::Network;
use crate::error::{DeembedError, Result};
use crate::sweep::FailurePolicy;

/// Removes one or two probe models from measured data
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkCascadeDeembedder {
    policy: FailurePolicy,
}

impl NetworkCascadeDeembedder {
    pub fn new(policy: FailurePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }
}

fn ensure_two_port(ntwk: &Network, what: &str) -> Result<()> {
    if ntwk.nports() != 2 {
        return Err(DeembedError::InvalidInput(format!(
            "{} must be a 2-port, got {} ports",
            what,
            ntwk.nports()
        )));
    }
    Ok(())
}

fn point(ntwk: &Network, index: usize) -> TwoPortPoint {
    TwoPortPoint::new(
        ntwk.s[[index, 0, 0]],
        ntwk.s[[index, 1, 0]],
        ntwk.s[[index, 0, 1]],
        ntwk.s[[index, 1, 1]],
    )
}
