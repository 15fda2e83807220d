//! # Training
//!
//! Supervised loops for the two experiments, both with Adam on an autodiff
//! backend:
//!
//! | Loop | Model | Loss |
//! |------|-------|------|
//! | [`SequenceLearner`] | [`CfC`](crate::rnn::CfC) | MSE, norm-clipped gradients |
//! | [`CloningTrainer`] | [`LstmPolicy`](crate::policy::LstmPolicy) | cross-entropy |
//!
//! Scalars go to a [`TrainingHistory`], which mirrors them to `tracing` and
//! can be written out as JSON.

pub mod cloning;
pub mod history;
pub mod sequence;

pub use cloning::{CloningTrainer, Evaluation};
pub use history::{save_checkpoint, RunTimer, TrainingHistory};
pub use sequence::SequenceLearner;

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};

pub(crate) fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> f32 {
    tensor.into_scalar().elem::<f32>()
}
