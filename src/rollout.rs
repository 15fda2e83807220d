//! # Closed-Loop Rollout
//!
//! Plays an [`Environment`] with live predictions from a recurrent image
//! policy. The driver owns the recurrent state: it is moved into the model
//! every step, replaced by the returned state, and dropped back to `None`
//! whenever an episode ends, so memory never leaks across episodes.

use std::num::NonZeroUsize;

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use tracing::{debug, info};

use crate::env::{to_channels_first, Environment, Frame, ObservationScaling, Step};
use crate::error::{Error, Result};
use crate::model::{InferenceError, SequenceModel};

/// How many episodes a rollout plays before returning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeBudget {
    /// Play forever; [`RolloutDriver::run`] only returns on error.
    Unbounded,
    Episodes(NonZeroUsize),
}

impl EpisodeBudget {
    pub fn episodes(count: usize) -> Result<Self> {
        NonZeroUsize::new(count)
            .map(Self::Episodes)
            .ok_or(Error::InvalidEpisodeBudget)
    }
}

/// Presentation hook called by the driver; both methods default to no-ops.
pub trait RolloutObserver<E: Environment> {
    /// Called after every environment step, before any reset.
    fn on_step(&mut self, _env: &E, _action: usize, _step: &Step<E::Observation>) {}

    fn on_episode_end(&mut self, _episode: usize, _episode_return: f32) {}
}

impl<E: Environment> RolloutObserver<E> for () {}

/// Index of the largest score, the lowest index on ties. `None` when empty.
///
/// NaN is never treated as the maximum: NaN scores are skipped unless every
/// score is NaN, in which case the first index is returned.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            Some(_) if score.is_nan() => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Pick the action for a single-step prediction shaped `[1, 1, actions]`.
pub fn select_action<B: Backend>(
    prediction: Tensor<B, 3>,
    actions: usize,
) -> std::result::Result<usize, InferenceError> {
    let dims = prediction.dims();
    if dims != [1, 1, actions] || actions == 0 {
        return Err(InferenceError::PredictionShape {
            actual: dims.to_vec(),
            actions,
        });
    }

    let scores = prediction
        .reshape([actions])
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|err| InferenceError::TensorData(format!("{err:?}")))?;

    argmax(&scores).ok_or(InferenceError::PredictionShape {
        actual: dims.to_vec(),
        actions,
    })
}

/// Drives a [`SequenceModel`] over an image [`Environment`] without tracking
/// gradients. Pass `model.valid()` for models trained on an autodiff backend.
#[derive(Debug, Clone)]
pub struct RolloutDriver<B: Backend> {
    device: B::Device,
    scaling: ObservationScaling,
}

impl<B: Backend> RolloutDriver<B> {
    pub fn new(device: B::Device) -> Self {
        Self {
            device,
            scaling: ObservationScaling::default(),
        }
    }

    pub fn with_scaling(mut self, scaling: ObservationScaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn scaling(&self) -> ObservationScaling {
        self.scaling
    }

    /// `[H, W, C]` frame to a `[1, 1, C, H, W]` model input.
    pub fn observation_to_input(&self, frame: &Frame) -> Tensor<B, 5> {
        let chw = to_channels_first(frame.view(), self.scaling);
        let (channels, height, width) = chw.dim();
        let values: Vec<f32> = chw.iter().copied().collect();
        Tensor::from_data(
            TensorData::new(values, [1, 1, channels, height, width]),
            &self.device,
        )
    }

    /// Play until `budget` episodes have finished and return their returns
    /// in completion order.
    ///
    /// Gradients are tracked whenever `B` is an autodiff backend, so a model
    /// trained on `Autodiff<B>` should be passed as `model.valid()` to a
    /// driver over the inner backend.
    pub fn run<M, E>(&self, model: &M, env: &mut E, budget: EpisodeBudget) -> Result<Vec<f32>>
    where
        M: SequenceModel<B, 5>,
        E: Environment<Observation = Frame>,
    {
        self.run_observed(model, env, budget, &mut ())
    }

    /// [`run`](Self::run), reporting every step and episode to `observer`.
    pub fn run_observed<M, E, O>(
        &self,
        model: &M,
        env: &mut E,
        budget: EpisodeBudget,
        observer: &mut O,
    ) -> Result<Vec<f32>>
    where
        M: SequenceModel<B, 5>,
        E: Environment<Observation = Frame>,
        O: RolloutObserver<E> + ?Sized,
    {
        let mut remaining = match budget {
            EpisodeBudget::Unbounded => None,
            EpisodeBudget::Episodes(count) => Some(count.get()),
        };
        let actions = env.action_space();

        let mut returns = Vec::new();
        let mut state: Option<M::State> = None;
        let mut episode_return = 0.0f32;
        let mut observation = env.reset()?;
        debug!(episode = 0, "episode started");

        loop {
            let input = self.observation_to_input(&observation);
            let (prediction, next_state) = model.predict(input, state.take())?;
            state = Some(next_state);

            let action = select_action(prediction, actions)?;
            let step = env.step(action)?;
            episode_return += step.reward;
            observer.on_step(env, action, &step);

            if !step.done {
                observation = step.observation;
                continue;
            }

            let episode = returns.len();
            returns.push(episode_return);
            info!(episode, episode_return, "episode finished");
            observer.on_episode_end(episode, episode_return);

            episode_return = 0.0;
            state = None;
            observation = env.reset()?;

            if let Some(left) = remaining.as_mut() {
                *left -= 1;
                if *left == 0 {
                    return Ok(returns);
                }
            }
            debug!(episode = episode + 1, "episode started");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn argmax_prefers_lowest_index_on_ties() {
        assert_eq!(argmax(&[0.2, 0.8]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), Some(0));
        assert_eq!(argmax(&[-1.0, 3.0, 3.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn argmax_skips_nan_scores() {
        assert_eq!(argmax(&[f32::NAN, 0.1, 0.3]), Some(2));
        assert_eq!(argmax(&[0.1, f32::NAN, 0.3]), Some(2));
        assert_eq!(argmax(&[0.4, f32::NAN, 0.3]), Some(0));
        assert_eq!(argmax(&[f32::NAN, f32::NAN]), Some(0));
    }

    #[test]
    fn zero_episode_budget_is_rejected() {
        assert!(matches!(
            EpisodeBudget::episodes(0),
            Err(Error::InvalidEpisodeBudget)
        ));
        assert!(EpisodeBudget::episodes(2).is_ok());
    }

    #[test]
    fn select_action_checks_shape() {
        let device = Default::default();
        let good = Tensor::<TestBackend, 3>::from_floats([[[0.1, 0.7, 0.2]]], &device);
        assert_eq!(select_action(good, 3).unwrap(), 1);

        let wrong = Tensor::<TestBackend, 3>::zeros([1, 2, 3], &device);
        assert!(matches!(
            select_action(wrong, 3),
            Err(InferenceError::PredictionShape { actions: 3, .. })
        ));
    }

    #[test]
    fn observation_gets_batch_and_time_axes() {
        let driver = RolloutDriver::<TestBackend>::new(Default::default());
        let mut frame = Frame::zeros((8, 6, 4));
        frame[[2, 3, 1]] = 255;

        let input = driver.observation_to_input(&frame);
        assert_eq!(input.dims(), [1, 1, 4, 8, 6]);

        let values = input.into_data().to_vec::<f32>().unwrap();
        // [c=1, y=2, x=3] in channels-first order
        assert_eq!(values[(8 * 6) + 2 * 6 + 3], 1.0);
        assert_eq!(values.iter().sum::<f32>(), 1.0);
    }
}
