use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig, PaddingConfig2d};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Number of features produced per frame.
pub const CONV_FEATURES: usize = 256;

/// Convolutional frame encoder.
///
/// Four 5x5 stride-2 convolutions (`C -> 64 -> 128 -> 128 -> 256`), batch
/// norm after the second and fourth, then global average pooling. Works for
/// any frame size; each conv halves the resolution (rounded up).
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    bn2: BatchNorm<B, 2>,
    conv3: Conv2d<B>,
    conv4: Conv2d<B>,
    bn4: BatchNorm<B, 2>,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(in_channels: usize, device: &B::Device) -> Self {
        let conv = |from: usize, to: usize| -> Conv2d<B> {
            Conv2dConfig::new([from, to], [5, 5])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(2, 2))
                .init(device)
        };

        Self {
            conv1: conv(in_channels, 64),
            conv2: conv(64, 128),
            bn2: BatchNormConfig::new(128).init(device),
            conv3: conv(128, 128),
            conv4: conv(128, CONV_FEATURES),
            bn4: BatchNormConfig::new(CONV_FEATURES).init(device),
        }
    }

    /// `[batch, channels, height, width]` -> `[batch, 256]`
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.conv1.forward(x));
        let x = relu(self.bn2.forward(self.conv2.forward(x)));
        let x = relu(self.conv3.forward(x));
        let x = relu(self.bn4.forward(self.conv4.forward(x)));

        let [batch, channels, _, _] = x.dims();
        x.mean_dim(3).mean_dim(2).reshape([batch, channels])
    }
}
