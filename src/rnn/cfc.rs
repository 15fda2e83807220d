//! Closed-form Continuous-time (CfC) RNN Layer
//!
//! Unrolls a CfC cell (plain or wired) over a sequence.

use crate::cells::{CfCCell, CfcMode, WiredCfCCell};
use crate::wirings::{Wiring, WiringError};
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// CfC sequence layer.
///
/// Built either with a dense cell ([`CfC::new`]) or from a wiring
/// ([`CfC::with_wiring`]), in which case the output is the wiring's motor
/// neurons.
#[derive(Module, Debug)]
pub struct CfC<B: Backend> {
    cell: Option<CfCCell<B>>,
    wired: Option<WiredCfCCell<B>>,
    proj: Option<Linear<B>>,
    input_size: usize,
    state_size: usize,
    output_size: usize,
    batch_first: bool,
    return_sequences: bool,
}

impl<B: Backend> CfC<B> {
    /// Dense CfC with `hidden_size` units, output = full state.
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            cell: Some(CfCCell::new(input_size, hidden_size, device)),
            wired: None,
            proj: None,
            input_size,
            state_size: hidden_size,
            output_size: hidden_size,
            batch_first: true,
            return_sequences: true,
        }
    }

    /// Wired CfC. The wiring is built for `input_size` if it was not already.
    pub fn with_wiring(
        input_size: usize,
        mut wiring: impl Wiring,
        device: &B::Device,
    ) -> Result<Self, WiringError> {
        wiring.build(input_size)?;
        let wired = WiredCfCCell::new(&wiring, CfcMode::Default, device)?;
        Ok(Self {
            cell: None,
            input_size,
            state_size: wired.state_size(),
            output_size: wired.motor_size(),
            wired: Some(wired),
            proj: None,
            batch_first: true,
            return_sequences: true,
        })
    }

    pub fn with_mode(mut self, mode: CfcMode) -> Self {
        self.cell = self.cell.map(|cell| cell.with_mode(mode));
        self.wired = self.wired.map(|wired| wired.with_mode(mode));
        self
    }

    pub fn with_batch_first(mut self, batch_first: bool) -> Self {
        self.batch_first = batch_first;
        self
    }

    pub fn with_return_sequences(mut self, return_sequences: bool) -> Self {
        self.return_sequences = return_sequences;
        self
    }

    /// Project every output step to `proj_size` features.
    pub fn with_proj_size(mut self, proj_size: usize, device: &B::Device) -> Self {
        self.proj = Some(
            LinearConfig::new(self.output_size, proj_size)
                .with_bias(true)
                .init(device),
        );
        self.output_size = proj_size;
        self
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Size of the recurrent state.
    pub fn state_size(&self) -> usize {
        self.state_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    fn step(&self, input: Tensor<B, 2>, state: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        match (&self.cell, &self.wired) {
            (_, Some(wired)) => wired.forward(input, state, 1.0),
            (Some(cell), None) => cell.forward(input, state, 1.0),
            (None, None) => unreachable!("CfC is constructed with exactly one cell"),
        }
    }

    /// Run the layer over a sequence.
    ///
    /// * `input` - `[batch, seq, features]` (or `[seq, batch, features]` when
    ///   not batch-first)
    /// * `state` - `[batch, state_size]`, zeros when `None`
    ///
    /// Returns `[batch, seq, output_size]` (`[batch, 1, output_size]` without
    /// `return_sequences`) and the final state.
    pub fn forward(
        &self,
        input: Tensor<B, 3>,
        state: Option<Tensor<B, 2>>,
    ) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let input = if self.batch_first {
            input
        } else {
            input.swap_dims(0, 1)
        };
        let [batch_size, seq_len, _] = input.dims();

        let mut state = state
            .unwrap_or_else(|| Tensor::zeros([batch_size, self.state_size], &input.device()));
        let mut outputs = Vec::with_capacity(seq_len);

        for t in 0..seq_len {
            let step_input = input.clone().narrow(1, t, 1).squeeze(1);
            let (mut output, next) = self.step(step_input, state);
            state = next;

            if let Some(proj) = &self.proj {
                output = proj.forward(output);
            }
            if self.return_sequences || t + 1 == seq_len {
                outputs.push(output);
            }
        }

        (Tensor::stack(outputs, 1), state)
    }
}
