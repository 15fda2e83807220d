use std::f32::consts::PI;

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use ndarray::{Array1, Array3};

/// One sequence: `x` is `[1, n, 2]` (sine, cosine), `y` is `[1, n, 1]`.
#[derive(Debug, Clone)]
pub struct SineData {
    pub x: Array3<f32>,
    pub y: Array3<f32>,
}

/// Input: sine and cosine of `linspace(0, 3π, n)`. Target: sine at twice
/// the frequency, `sin(linspace(0, 6π, n))`. Both linspaces include their
/// endpoints.
pub fn generate_sine_data(n: usize) -> SineData {
    let t = Array1::linspace(0.0, 3.0 * PI, n);
    let t2 = Array1::linspace(0.0, 6.0 * PI, n);

    let x = Array3::from_shape_fn((1, n, 2), |(_, i, feature)| match feature {
        0 => t[i].sin(),
        _ => t[i].cos(),
    });
    let y = Array3::from_shape_fn((1, n, 1), |(_, i, _)| t2[i].sin());

    SineData { x, y }
}

impl SineData {
    pub fn len(&self) -> usize {
        self.x.dim().1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> (Tensor<B, 3>, Tensor<B, 3>) {
        (array_to_tensor(&self.x, device), array_to_tensor(&self.y, device))
    }
}

pub(crate) fn array_to_tensor<B: Backend>(array: &Array3<f32>, device: &B::Device) -> Tensor<B, 3> {
    let (a, b, c) = array.dim();
    let values: Vec<f32> = array.iter().copied().collect();
    Tensor::from_data(TensorData::new(values, [a, b, c]), device)
}
