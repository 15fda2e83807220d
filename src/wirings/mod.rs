//! # Wirings
//!
//! Sparse connectivity patterns for wired recurrent cells. A wiring owns two
//! polarity matrices (`+1` excitatory, `-1` inhibitory, `0` no synapse):
//!
//! - `adjacency_matrix`: `[units, units]`, neuron to neuron
//! - `sensory_adjacency_matrix`: `[input_dim, units]`, input feature to neuron,
//!   only available after [`Wiring::build`]
//!
//! Wired cells read the matrices as masks, one cell per wiring layer.

use thiserror::Error;

mod base;
mod ncp;

pub use base::{FullyConnected, NeuronType, Wiring};
pub use ncp::{AutoNCP, NCP};

/// Errors raised while constructing or mutating a wiring.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WiringError {
    #[error("conflicting input dimensions: wiring was built for {existing}, got {requested}")]
    ConflictingInputDim { existing: usize, requested: usize },

    #[error("synapse {src} -> {dest} is outside the wiring ({sources} sources, {units} units)")]
    SynapseOutOfRange {
        src: usize,
        dest: usize,
        sources: usize,
        units: usize,
    },

    #[error("polarity must be -1 or 1, got {0}")]
    InvalidPolarity(i32),

    #[error("wiring has not been built; call build(input_dim) first")]
    NotBuilt,

    #[error("invalid wiring parameters: {0}")]
    InvalidParameters(String),
}

pub(crate) fn check_polarity(polarity: i32) -> Result<(), WiringError> {
    if polarity == 1 || polarity == -1 {
        Ok(())
    } else {
        Err(WiringError::InvalidPolarity(polarity))
    }
}
