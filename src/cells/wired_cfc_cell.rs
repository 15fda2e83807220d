//! Wired CfC Cell
//!
//! One [`CfCCell`] per wiring layer. Each layer receives the previous layer's
//! output (the sensory input for the first one) and its own slice of the
//! state; its projections are masked by the wiring's adjacency.

use crate::cells::{CfCCell, CfcMode};
use crate::wirings::{Wiring, WiringError};
use burn::module::{Ignored, Module};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use ndarray::{s, Array2};

#[derive(Module, Debug)]
pub struct WiredCfCCell<B: Backend> {
    layers: Vec<CfCCell<B>>,
    layer_sizes: Ignored<Vec<usize>>,
    sensory_size: usize,
    motor_size: usize,
}

/// Mask of one layer: wiring synapses from the layer's inputs on top, all-to-all
/// recurrent block below, `[inputs + neurons, neurons]`.
fn layer_mask(wiring: &dyn Wiring, layer: usize) -> Result<Array2<f32>, WiringError> {
    let neurons = wiring.neurons_of_layer(layer);

    let input_mask: Array2<f32> = if layer == 0 {
        let sensory = wiring
            .sensory_adjacency_matrix()
            .ok_or(WiringError::NotBuilt)?;
        Array2::from_shape_fn((sensory.nrows(), neurons.len()), |(src, i)| {
            sensory[[src, neurons[i]]].abs() as f32
        })
    } else {
        let adjacency = wiring.adjacency_matrix();
        let sources = wiring.neurons_of_layer(layer - 1);
        Array2::from_shape_fn((sources.len(), neurons.len()), |(j, i)| {
            adjacency[[sources[j], neurons[i]]].abs() as f32
        })
    };

    let inputs = input_mask.nrows();
    let mut mask = Array2::ones((inputs + neurons.len(), neurons.len()));
    mask.slice_mut(s![..inputs, ..]).assign(&input_mask);
    Ok(mask)
}

impl<B: Backend> WiredCfCCell<B> {
    /// Build the layered cell from a built wiring.
    pub fn new(
        wiring: &dyn Wiring,
        mode: CfcMode,
        device: &B::Device,
    ) -> Result<Self, WiringError> {
        let sensory_size = wiring.input_dim().ok_or(WiringError::NotBuilt)?;

        let mut layers = Vec::with_capacity(wiring.num_layers());
        let mut layer_sizes = Vec::with_capacity(wiring.num_layers());
        let mut layer_input = sensory_size;
        for layer in 0..wiring.num_layers() {
            let neurons = wiring.neurons_of_layer(layer).len();
            let mask = layer_mask(wiring, layer)?;
            layers.push(
                CfCCell::new(layer_input, neurons, device)
                    .with_mode(mode)
                    .with_sparsity_mask(&mask, device),
            );
            layer_sizes.push(neurons);
            layer_input = neurons;
        }

        Ok(Self {
            layers,
            layer_sizes: Ignored(layer_sizes),
            sensory_size,
            motor_size: wiring.output_dim(),
        })
    }

    /// Switch every layer to `mode`; masks are kept.
    pub fn with_mode(mut self, mode: CfcMode) -> Self {
        self.layers = self
            .layers
            .into_iter()
            .map(|layer| layer.with_mode(mode))
            .collect();
        self
    }

    pub fn state_size(&self) -> usize {
        self.layer_sizes.iter().sum()
    }

    pub fn motor_size(&self) -> usize {
        self.motor_size
    }

    pub fn sensory_size(&self) -> usize {
        self.sensory_size
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    /// One step through every layer.
    ///
    /// `hx` is `[batch, state_size]` with layer states concatenated in layer
    /// order. Returns the motor readout `[batch, motor_size]` and the new state.
    pub fn forward(
        &self,
        input: Tensor<B, 2>,
        hx: Tensor<B, 2>,
        ts: f32,
    ) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let mut offset = 0;
        let mut layer_input = input;
        let mut new_states = Vec::with_capacity(self.layers.len());

        for (layer, &size) in self.layers.iter().zip(self.layer_sizes.iter()) {
            let state = hx.clone().narrow(1, offset, size);
            offset += size;
            let (out, new_state) = layer.forward(layer_input, state, ts);
            new_states.push(new_state);
            layer_input = out;
        }

        let width = layer_input.dims()[1];
        let output = if width > self.motor_size {
            layer_input.narrow(1, 0, self.motor_size)
        } else {
            layer_input
        };
        (output, Tensor::cat(new_states, 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wirings::{AutoNCP, FullyConnected};
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn mask_copies_layer_synapses() {
        let mut wiring = AutoNCP::new(12, 2, 0.5, 5).unwrap();
        wiring.build(3).unwrap();

        let mask = layer_mask(&wiring, 1).unwrap();
        let inter = wiring.neurons_of_layer(0);
        let command = wiring.neurons_of_layer(1);
        assert_eq!(mask.dim(), (inter.len() + command.len(), command.len()));
        for (j, &src) in inter.iter().enumerate() {
            for (i, &dest) in command.iter().enumerate() {
                let expected = wiring.adjacency_matrix()[[src, dest]].abs() as f32;
                assert_eq!(mask[[j, i]], expected);
            }
        }
        assert!(mask.slice(s![inter.len().., ..]).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn unbuilt_wiring_is_rejected() {
        let device = Default::default();
        let wiring = FullyConnected::new(8, Some(2), 1, true);
        let result = WiredCfCCell::<TestBackend>::new(&wiring, CfcMode::Default, &device);
        assert!(matches!(result, Err(WiringError::NotBuilt)));
    }
}
