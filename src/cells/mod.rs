//! # RNN Cells
//!
//! Single-timestep cells. The sequence layers in [`crate::rnn`] unroll them
//! over time and own the state handling.
//!
//! | Cell | State | Used by |
//! |------|-------|---------|
//! | [`CfCCell`] | `[batch, hidden]` | [`CfC`](crate::rnn::CfC) without wiring |
//! | [`WiredCfCCell`] | `[batch, units]`, layer states concatenated | [`CfC`](crate::rnn::CfC) with NCP wiring |
//! | [`LSTMCell`] | [`LstmState`] | [`Lstm`](crate::rnn::Lstm), the cloning policy |
//!
//! ## CfC modes
//!
//! ```text
//! Default: h = tanh(ff1) × (1 - σ(t)) + tanh(ff2) × σ(t)
//! Pure:    h = A - A × exp(-t × (|w_τ| + |ff1|)) × ff1
//! NoGate:  h = tanh(ff1) + tanh(ff2) × σ(t)
//! ```
//! with `σ(t) = sigmoid(time_a(x) × t + time_b(x))` and `x = [input, h]`.

pub mod cfc_cell;
pub mod lstm_cell;
pub mod wired_cfc_cell;

pub use cfc_cell::{CfCCell, CfcMode};
pub use lstm_cell::{LSTMCell, LstmState};
pub use wired_cfc_cell::WiredCfCCell;
