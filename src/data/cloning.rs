use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::env::{to_channels_first, Catch, Environment, Frame, ObservationScaling};
use crate::error::{Error, Result};

/// A fixed-length run of observations with the expert action taken at each.
#[derive(Debug, Clone)]
pub struct Demonstration {
    pub frames: Vec<Frame>,
    pub actions: Vec<usize>,
}

/// Expert demonstrations cut into equal-length sequences.
#[derive(Debug, Clone, Default)]
pub struct CloningDataset {
    sequences: Vec<Demonstration>,
}

impl CloningDataset {
    pub fn new(sequences: Vec<Demonstration>) -> Self {
        Self { sequences }
    }

    /// Play `episodes` episodes with [`Catch::expert_action`] and cut each
    /// one into sequences of `sequence_length` steps. Episode tails shorter
    /// than `sequence_length` are dropped.
    pub fn record(env: &mut Catch, episodes: usize, sequence_length: usize) -> Result<Self> {
        if sequence_length == 0 {
            return Err(Error::Dataset("sequence length must be at least 1".into()));
        }

        let mut sequences = Vec::new();
        for episode in 0..episodes {
            let mut frames = Vec::new();
            let mut actions = Vec::new();
            let mut observation = env.reset()?;
            loop {
                let action = env.expert_action() as usize;
                frames.push(observation);
                actions.push(action);

                let step = env.step(action)?;
                if step.done {
                    break;
                }
                observation = step.observation;
            }
            debug!(episode, steps = frames.len(), "recorded demonstration");

            let mut frames = frames.into_iter();
            for chunk in actions.chunks_exact(sequence_length) {
                sequences.push(Demonstration {
                    frames: frames.by_ref().take(sequence_length).collect(),
                    actions: chunk.to_vec(),
                });
            }
        }

        Ok(Self { sequences })
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Demonstration> {
        self.sequences.get(index)
    }

    /// First `train_fraction` of the sequences for training, the rest for
    /// validation.
    pub fn split(self, train_fraction: f64) -> Result<(Self, Self)> {
        if !(0.0..=1.0).contains(&train_fraction) {
            return Err(Error::Dataset(format!(
                "train fraction {train_fraction} is outside [0, 1]"
            )));
        }
        let mut train = self.sequences;
        let cut = (train.len() as f64 * train_fraction).round() as usize;
        let val = train.split_off(cut.min(train.len()));
        Ok((Self::new(train), Self::new(val)))
    }

    /// Index batches of at most `batch_size`, optionally shuffled.
    pub fn batches<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        shuffle: bool,
        rng: &mut R,
    ) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        if shuffle {
            indices.shuffle(rng);
        }
        indices
            .chunks(batch_size.max(1))
            .map(<[usize]>::to_vec)
            .collect()
    }

    /// Frames `[batch, time, channels, height, width]` and action labels
    /// `[batch, time]` for the sequences at `indices`.
    pub fn to_tensors<B: Backend>(
        &self,
        indices: &[usize],
        scaling: ObservationScaling,
        device: &B::Device,
    ) -> Result<(Tensor<B, 5>, Tensor<B, 2, Int>)> {
        let first = indices
            .first()
            .and_then(|&index| self.sequences.get(index))
            .ok_or_else(|| Error::Dataset("empty batch".into()))?;
        let time = first.actions.len();
        let (height, width, channels) = first
            .frames
            .first()
            .map(|frame| frame.dim())
            .ok_or_else(|| Error::Dataset("empty sequence".into()))?;

        let mut pixels = Vec::with_capacity(indices.len() * time * channels * height * width);
        let mut labels = Vec::with_capacity(indices.len() * time);
        for &index in indices {
            let sequence = self
                .sequences
                .get(index)
                .ok_or_else(|| Error::Dataset(format!("no sequence at index {index}")))?;
            if sequence.actions.len() != time {
                return Err(Error::Dataset(format!(
                    "sequence {index} has {} steps, expected {time}",
                    sequence.actions.len()
                )));
            }
            for frame in &sequence.frames {
                if frame.dim() != (height, width, channels) {
                    return Err(Error::Dataset(format!(
                        "sequence {index} mixes frame shapes {:?} and {:?}",
                        frame.dim(),
                        (height, width, channels)
                    )));
                }
                pixels.extend(to_channels_first(frame.view(), scaling).iter().copied());
            }
            labels.extend(sequence.actions.iter().map(|&action| action as i64));
        }

        let batch = indices.len();
        let frames = Tensor::from_data(
            TensorData::new(pixels, [batch, time, channels, height, width]),
            device,
        );
        let labels = Tensor::from_data(TensorData::new(labels, [batch, time]), device);
        Ok((frames, labels))
    }
}
