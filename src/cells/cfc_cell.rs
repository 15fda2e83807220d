//! Closed-form Continuous-time (CfC) Cell
//!
//! Closed-form approximation of liquid time-constant dynamics: one step is a
//! handful of dense layers and elementwise gates, no ODE solver.

use burn::module::{Ignored, Module, Param};
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// CfC cell operating modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CfcMode {
    /// `h = tanh(ff1) * (1 - σ) + tanh(ff2) * σ`
    #[default]
    Default,
    /// `h = A - A * exp(-t * (|w_τ| + |ff1|)) * ff1`
    Pure,
    /// `h = tanh(ff1) + tanh(ff2) * σ`
    NoGate,
}

/// A single-timestep CfC cell.
///
/// The input and the previous state are concatenated (`[batch, input + hidden]`)
/// and fed to every projection. When a sparsity mask is set, it multiplies the
/// weights of `ff1`/`ff2`, so masked synapses contribute nothing.
#[derive(Module, Debug)]
pub struct CfCCell<B: Backend> {
    ff1: Linear<B>,
    ff2: Option<Linear<B>>,
    time_a: Option<Linear<B>>,
    time_b: Option<Linear<B>>,
    w_tau: Option<Param<Tensor<B, 1>>>,
    a: Option<Param<Tensor<B, 1>>>,
    /// `[input + hidden, hidden]`, same layout as the linear weights
    sparsity_mask: Option<Tensor<B, 2>>,
    mode: Ignored<CfcMode>,
    input_size: usize,
    hidden_size: usize,
}

fn dense<B: Backend>(d_in: usize, d_out: usize, device: &B::Device) -> Linear<B> {
    LinearConfig::new(d_in, d_out).with_bias(true).init(device)
}

impl<B: Backend> CfCCell<B> {
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        let cat = input_size + hidden_size;
        Self {
            ff1: dense(cat, hidden_size, device),
            ff2: Some(dense(cat, hidden_size, device)),
            time_a: Some(dense(cat, hidden_size, device)),
            time_b: Some(dense(cat, hidden_size, device)),
            w_tau: None,
            a: None,
            sparsity_mask: None,
            mode: Ignored(CfcMode::Default),
            input_size,
            hidden_size,
        }
    }

    /// Switch operating mode, creating the parameters that mode needs and
    /// dropping the ones it does not.
    pub fn with_mode(mut self, mode: CfcMode) -> Self {
        let device = self.ff1.weight.device();
        let cat = self.input_size + self.hidden_size;

        match mode {
            CfcMode::Pure => {
                self.ff2 = None;
                self.time_a = None;
                self.time_b = None;
                let hidden = self.hidden_size;
                self.w_tau = Some(Param::from_tensor(Tensor::zeros([hidden], &device)));
                self.a = Some(Param::from_tensor(Tensor::ones([hidden], &device)));
            }
            CfcMode::Default | CfcMode::NoGate => {
                let hidden = self.hidden_size;
                self.ff2.get_or_insert_with(|| dense(cat, hidden, &device));
                self.time_a.get_or_insert_with(|| dense(cat, hidden, &device));
                self.time_b.get_or_insert_with(|| dense(cat, hidden, &device));
                self.w_tau = None;
                self.a = None;
            }
        }
        self.mode = Ignored(mode);
        self
    }

    /// Restrict `ff1`/`ff2` to the synapses present in `mask`.
    ///
    /// `mask` has shape `[input + hidden, hidden]`; only its magnitude is used,
    /// so polarity matrices can be passed directly.
    pub fn with_sparsity_mask(mut self, mask: &Array2<f32>, device: &B::Device) -> Self {
        let (rows, cols) = mask.dim();
        let values: Vec<f32> = mask.iter().map(|v| v.abs()).collect();
        let tensor = Tensor::<B, 1>::from_floats(values.as_slice(), device).reshape([rows, cols]);
        self.sparsity_mask = Some(tensor);
        self
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn mode(&self) -> CfcMode {
        *self.mode
    }

    pub fn has_sparsity_mask(&self) -> bool {
        self.sparsity_mask.is_some()
    }

    fn masked(&self, layer: &Linear<B>, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let Some(mask) = &self.sparsity_mask else {
            return layer.forward(x);
        };
        let out = x.matmul(layer.weight.val() * mask.clone());
        match &layer.bias {
            Some(bias) => out + bias.val().unsqueeze(),
            None => out,
        }
    }

    /// One step. Returns `(output, new_state)`; for CfC both are the new state.
    ///
    /// * `input` - `[batch, input_size]`
    /// * `hx` - `[batch, hidden_size]`
    /// * `ts` - elapsed time for this step
    pub fn forward(
        &self,
        input: Tensor<B, 2>,
        hx: Tensor<B, 2>,
        ts: f32,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let x = Tensor::cat(vec![input, hx], 1);
        let ff1 = self.masked(&self.ff1, x.clone());

        let params = (&self.w_tau, &self.a, &self.ff2, &self.time_a, &self.time_b);
        let new_hidden = match (*self.mode, params) {
            (CfcMode::Pure, (Some(w_tau), Some(a), _, _, _)) => {
                let w_tau = w_tau.val().unsqueeze::<2>();
                let a = a.val().unsqueeze::<2>();
                let decay = ((w_tau.abs() + ff1.clone().abs()) * ts).neg().exp();
                a.clone() - a * decay * ff1
            }
            (mode, (_, _, Some(ff2), Some(time_a), Some(time_b))) => {
                let ff1 = ff1.tanh();
                let ff2 = self.masked(ff2, x.clone()).tanh();
                let t_interp =
                    activation::sigmoid(time_a.forward(x.clone()) * ts + time_b.forward(x));
                if mode == CfcMode::NoGate {
                    ff1 + t_interp * ff2
                } else {
                    ff1 * (t_interp.clone().neg() + 1.0) + t_interp * ff2
                }
            }
            // with_mode keeps the parameter set consistent with the mode
            _ => unreachable!("CfC parameters do not match mode {:?}", *self.mode),
        };

        (new_hidden.clone(), new_hidden)
    }
}
