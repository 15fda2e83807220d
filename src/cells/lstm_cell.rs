use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Hidden and cell state of an LSTM, each `[batch, hidden_size]`.
#[derive(Debug, Clone)]
pub struct LstmState<B: Backend> {
    pub hidden: Tensor<B, 2>,
    pub cell: Tensor<B, 2>,
}

impl<B: Backend> LstmState<B> {
    pub fn zeros(batch_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            hidden: Tensor::zeros([batch_size, hidden_size], device),
            cell: Tensor::zeros([batch_size, hidden_size], device),
        }
    }
}

/// Standard LSTM cell.
///
/// Gates are computed in one fused projection and split in `i, f, g, o` order:
/// - `c' = σ(f) * c + σ(i) * tanh(g)`
/// - `h' = σ(o) * tanh(c')`
#[derive(Module, Debug)]
pub struct LSTMCell<B: Backend> {
    /// input -> 4 * hidden, with bias
    input_map: Linear<B>,
    /// hidden -> 4 * hidden, no bias
    recurrent_map: Linear<B>,
    input_size: usize,
    hidden_size: usize,
}

impl<B: Backend> LSTMCell<B> {
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            input_map: LinearConfig::new(input_size, 4 * hidden_size)
                .with_bias(true)
                .init(device),
            recurrent_map: LinearConfig::new(hidden_size, 4 * hidden_size)
                .with_bias(false)
                .init(device),
            input_size,
            hidden_size,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// One step: `input` is `[batch, input_size]`.
    pub fn forward(&self, input: Tensor<B, 2>, state: LstmState<B>) -> LstmState<B> {
        let z = self.input_map.forward(input) + self.recurrent_map.forward(state.hidden);
        let width = self.hidden_size;
        let gate = |k: usize| z.clone().narrow(1, k * width, width);
        let (i, f, g, o) = (gate(0), gate(1), gate(2), gate(3));

        let cell = activation::sigmoid(f) * state.cell + activation::sigmoid(i) * g.tanh();
        let hidden = activation::sigmoid(o) * cell.clone().tanh();
        LstmState { hidden, cell }
    }
}
