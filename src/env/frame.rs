use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

/// An image observation, `[height, width, channels]`.
pub type Frame = Array3<u8>;

/// How raw pixel values are mapped to model inputs.
///
/// `Raw` feeds `0..=255` unchanged, for environments whose wrapper already
/// normalizes. `UnitInterval` divides by 255.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationScaling {
    Raw,
    #[default]
    UnitInterval,
}

impl ObservationScaling {
    pub fn apply(self, pixel: u8) -> f32 {
        match self {
            Self::Raw => pixel as f32,
            Self::UnitInterval => pixel as f32 / 255.0,
        }
    }
}

/// `[height, width, channels]` u8 -> `[channels, height, width]` f32.
///
/// The result is in standard (row-major) layout.
pub fn to_channels_first(frame: ArrayView3<'_, u8>, scaling: ObservationScaling) -> Array3<f32> {
    let (height, width, channels) = frame.dim();
    Array3::from_shape_fn((channels, height, width), |(c, y, x)| {
        scaling.apply(frame[[y, x, c]])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_move_to_front() {
        let mut frame = Frame::zeros((2, 3, 4));
        frame[[1, 2, 3]] = 255;
        frame[[0, 1, 0]] = 51;

        let chw = to_channels_first(frame.view(), ObservationScaling::UnitInterval);
        assert_eq!(chw.dim(), (4, 2, 3));
        assert_eq!(chw[[3, 1, 2]], 1.0);
        assert!((chw[[0, 0, 1]] - 0.2).abs() < 1e-6);

        let raw = to_channels_first(frame.view(), ObservationScaling::Raw);
        assert_eq!(raw[[3, 1, 2]], 255.0);
    }
}
