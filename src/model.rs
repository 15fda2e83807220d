//! The sequence-model capability shared by both experiments.
//!
//! A [`SequenceModel`] maps an input with batch and time axes plus an optional
//! recurrent state to per-step outputs `[batch, time, features]` and the state
//! after the last step. `None` means "start of a sequence".

use crate::policy::LstmPolicy;
use crate::rnn::CfC;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("model input has shape {actual:?}, expected {expected}")]
    InputShape {
        actual: Vec<usize>,
        expected: String,
    },

    #[error("prediction has shape {actual:?}, expected [1, 1, {actions}]")]
    PredictionShape { actual: Vec<usize>, actions: usize },

    #[error("tensor data: {0}")]
    TensorData(String),

    #[error("inference error: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub trait SequenceModel<B: Backend, const D: usize> {
    /// Opaque recurrent memory.
    type State;

    fn predict(
        &self,
        input: Tensor<B, D>,
        state: Option<Self::State>,
    ) -> Result<(Tensor<B, 3>, Self::State), InferenceError>;
}

impl<B: Backend> SequenceModel<B, 3> for CfC<B> {
    type State = Tensor<B, 2>;

    fn predict(
        &self,
        input: Tensor<B, 3>,
        state: Option<Self::State>,
    ) -> Result<(Tensor<B, 3>, Self::State), InferenceError> {
        let dims = input.dims();
        if dims[2] != self.input_size() {
            return Err(InferenceError::InputShape {
                actual: dims.to_vec(),
                expected: format!("[batch, time, {}]", self.input_size()),
            });
        }
        Ok(self.forward(input, state))
    }
}

impl<B: Backend> SequenceModel<B, 5> for LstmPolicy<B> {
    type State = crate::cells::LstmState<B>;

    fn predict(
        &self,
        input: Tensor<B, 5>,
        state: Option<Self::State>,
    ) -> Result<(Tensor<B, 3>, Self::State), InferenceError> {
        let dims = input.dims();
        if dims[2] != self.in_channels() {
            return Err(InferenceError::InputShape {
                actual: dims.to_vec(),
                expected: format!("[batch, time, {}, height, width]", self.in_channels()),
            });
        }
        Ok(self.forward(input, state))
    }
}
