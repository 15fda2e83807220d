use super::conv_block::{ConvBlock, CONV_FEATURES};
use crate::cells::LstmState;
use crate::rnn::Lstm;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Hidden units of the policy's LSTM.
pub const POLICY_HIDDEN: usize = 64;

/// Recurrent image policy: per-frame [`ConvBlock`] features, an LSTM over
/// time, and a linear head producing one logit per action.
#[derive(Module, Debug)]
pub struct LstmPolicy<B: Backend> {
    conv_block: ConvBlock<B>,
    lstm: Lstm<B>,
    output_layer: Linear<B>,
    in_channels: usize,
    n_actions: usize,
}

impl<B: Backend> LstmPolicy<B> {
    pub fn new(in_channels: usize, n_actions: usize, device: &B::Device) -> Self {
        Self {
            conv_block: ConvBlock::new(in_channels, device),
            lstm: Lstm::new(CONV_FEATURES, POLICY_HIDDEN, device),
            output_layer: LinearConfig::new(POLICY_HIDDEN, n_actions).init(device),
            in_channels,
            n_actions,
        }
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// `x` is `[batch, seq, channels, height, width]`; returns action logits
    /// `[batch, seq, n_actions]` and the LSTM state after the last frame.
    pub fn forward(
        &self,
        x: Tensor<B, 5>,
        state: Option<LstmState<B>>,
    ) -> (Tensor<B, 3>, LstmState<B>) {
        let [batch, seq, channels, height, width] = x.dims();

        let frames = x.reshape([batch * seq, channels, height, width]);
        let features = self
            .conv_block
            .forward(frames)
            .reshape([batch, seq, CONV_FEATURES]);

        let (hidden, state) = self.lstm.forward(features, state);
        (self.output_layer.forward(hidden), state)
    }
}
