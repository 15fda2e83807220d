//! # Image Policy
//!
//! The behavior-cloning policy: a convolutional encoder applied to every
//! frame, followed by an LSTM across frames.

pub mod conv_block;
pub mod lstm_policy;

pub use conv_block::ConvBlock;
pub use lstm_policy::LstmPolicy;
