//! Batch-first LSTM layer.

use crate::cells::{LSTMCell, LstmState};
use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

#[derive(Module, Debug)]
pub struct Lstm<B: Backend> {
    cell: LSTMCell<B>,
}

impl<B: Backend> Lstm<B> {
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            cell: LSTMCell::new(input_size, hidden_size, device),
        }
    }

    pub fn input_size(&self) -> usize {
        self.cell.input_size()
    }

    pub fn hidden_size(&self) -> usize {
        self.cell.hidden_size()
    }

    /// `input` is `[batch, seq, features]`; returns the hidden state of every
    /// step `[batch, seq, hidden]` and the final state.
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        state: Option<LstmState<B>>,
    ) -> (Tensor<B, 3>, LstmState<B>) {
        let [batch_size, seq_len, _] = input.dims();
        let mut state = state
            .unwrap_or_else(|| LstmState::zeros(batch_size, self.hidden_size(), &input.device()));

        let mut outputs = Vec::with_capacity(seq_len);
        for t in 0..seq_len {
            let step_input = input.clone().narrow(1, t, 1).squeeze(1);
            state = self.cell.forward(step_input, state);
            outputs.push(state.hidden.clone());
        }

        (Tensor::stack(outputs, 1), state)
    }
}
