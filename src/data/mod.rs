//! # Datasets
//!
//! - [`sine`]: the sine/cosine to double-frequency sine regression pair.
//! - [`cloning`]: fixed-length frame/action sequences recorded from an
//!   expert, for behavior cloning.

pub mod cloning;
pub mod sine;

pub use cloning::{CloningDataset, Demonstration};
pub use sine::{generate_sine_data, SineData};
