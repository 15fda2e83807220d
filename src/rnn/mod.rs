//! # Sequence Layers
//!
//! Layers that unroll a cell over `[batch, seq, features]` input and return
//! every step's output together with the final recurrent state.
//!
//! ```ignore
//! use ncps_experiments::prelude::*;
//!
//! let wiring = AutoNCP::new(16, 1, 0.5, 22222)?;
//! let cfc = CfC::<Backend>::with_wiring(2, wiring, &device)?;
//!
//! let (output, state) = cfc.forward(input, None);   // [1, 48, 1], [1, 16]
//! let (next, state) = cfc.forward(more, Some(state));
//! ```
//!
//! Passing the returned state back in continues the sequence; passing `None`
//! starts from zeros.

pub mod cfc;
pub mod lstm;

pub use cfc::CfC;
pub use lstm::Lstm;
