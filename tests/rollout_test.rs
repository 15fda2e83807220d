//! Closed-loop rollout driver tests

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use burn::backend::NdArray;
use burn::tensor::{Tensor, TensorData};
use ncps_experiments::env::{Catch, CatchConfig, EnvError, Environment, Frame, Info, Step};
use ncps_experiments::error::Error;
use ncps_experiments::model::{InferenceError, SequenceModel};
use ncps_experiments::policy::LstmPolicy;
use ncps_experiments::rollout::{EpisodeBudget, RolloutDriver, RolloutObserver};

type Backend = NdArray<f32>;

/// Emits fixed scores and counts steps in its state.
struct StubModel {
    scores: Vec<f32>,
    seen_states: Arc<Mutex<Vec<Option<usize>>>>,
}

impl StubModel {
    fn new(scores: &[f32]) -> Self {
        Self {
            scores: scores.to_vec(),
            seen_states: Arc::default(),
        }
    }
}

impl SequenceModel<Backend, 5> for StubModel {
    type State = usize;

    fn predict(
        &self,
        input: Tensor<Backend, 5>,
        state: Option<usize>,
    ) -> Result<(Tensor<Backend, 3>, usize), InferenceError> {
        assert_eq!(&input.dims()[..2], &[1, 1]);
        self.seen_states.lock().unwrap().push(state);

        let prediction = Tensor::from_data(
            TensorData::new(self.scores.clone(), [1, 1, self.scores.len()]),
            &input.device(),
        );
        Ok((prediction, state.map_or(1, |steps| steps + 1)))
    }
}

/// Episodes of fixed length; the reward of every step is the episode index
/// plus `base_reward`.
struct StubEnv {
    episode_length: Option<usize>,
    base_reward: f32,
    actions: usize,
    fail_on_step: Option<usize>,
    episode: Option<usize>,
    step_in_episode: usize,
    total_steps: usize,
    actions_taken: Vec<usize>,
}

impl StubEnv {
    fn new(episode_length: Option<usize>, base_reward: f32) -> Self {
        Self {
            episode_length,
            base_reward,
            actions: 2,
            fail_on_step: None,
            episode: None,
            step_in_episode: 0,
            total_steps: 0,
            actions_taken: Vec::new(),
        }
    }

    fn observation() -> Frame {
        Frame::zeros((4, 4, 1))
    }
}

impl Environment for StubEnv {
    type Observation = Frame;

    fn reset(&mut self) -> Result<Frame, EnvError> {
        self.episode = Some(self.episode.map_or(0, |episode| episode + 1));
        self.step_in_episode = 0;
        Ok(Self::observation())
    }

    fn step(&mut self, action: usize) -> Result<Step<Frame>, EnvError> {
        if Some(self.total_steps) == self.fail_on_step {
            return Err(EnvError::Unavailable("emulator crashed".into()));
        }
        let episode = self.episode.ok_or(EnvError::EpisodeOver)?;
        self.actions_taken.push(action);
        self.step_in_episode += 1;
        self.total_steps += 1;

        Ok(Step {
            observation: Self::observation(),
            reward: self.base_reward + episode as f32,
            done: self
                .episode_length
                .is_some_and(|length| self.step_in_episode >= length),
            info: Info::new(),
        })
    }

    fn action_space(&self) -> usize {
        self.actions
    }
}

fn driver() -> RolloutDriver<Backend> {
    RolloutDriver::new(Default::default())
}

fn budget(episodes: usize) -> EpisodeBudget {
    EpisodeBudget::episodes(episodes).unwrap()
}

#[test]
fn finite_budget_returns_one_value_per_episode() {
    for k in [1, 2, 5] {
        let model = StubModel::new(&[0.2, 0.8]);
        let mut env = StubEnv::new(Some(3), 0.0);

        let returns = driver().run(&model, &mut env, budget(k)).unwrap();
        assert_eq!(returns.len(), k);
    }
}

#[test]
fn state_is_absent_at_every_episode_start() {
    let model = StubModel::new(&[0.2, 0.8]);
    let seen = model.seen_states.clone();
    let mut env = StubEnv::new(Some(3), 0.0);

    driver().run(&model, &mut env, budget(3)).unwrap();

    let seen = seen.lock().unwrap();
    let expected: Vec<Option<usize>> = [None, Some(1), Some(2)].repeat(3);
    assert_eq!(*seen, expected);
}

#[test]
fn returns_restart_from_zero_each_episode() {
    let model = StubModel::new(&[0.2, 0.8]);
    let mut env = StubEnv::new(Some(2), 1.0);

    // episode e rewards 1 + e per step, over 2 steps
    let returns = driver().run(&model, &mut env, budget(3)).unwrap();
    assert_eq!(returns, vec![2.0, 4.0, 6.0]);
}

#[test]
fn done_every_step_gives_single_step_returns() {
    let model = StubModel::new(&[0.2, 0.8]);
    let mut env = StubEnv::new(Some(1), 0.5);

    let returns = driver().run(&model, &mut env, budget(3)).unwrap();
    assert_eq!(returns, vec![0.5, 1.5, 2.5]);
    assert_eq!(env.total_steps, 3);
}

#[test]
fn stub_prediction_always_selects_action_one() {
    let model = StubModel::new(&[0.2, 0.8]);
    let mut env = StubEnv::new(Some(4), 0.0);

    driver().run(&model, &mut env, budget(2)).unwrap();
    assert_eq!(env.actions_taken, vec![1; 8]);
}

#[test]
fn tied_scores_select_the_lowest_action() {
    let model = StubModel::new(&[0.5, 0.5]);
    let mut env = StubEnv::new(Some(3), 0.0);

    driver().run(&model, &mut env, budget(1)).unwrap();
    assert_eq!(env.actions_taken, vec![0; 3]);
}

#[test]
fn unbounded_rollout_does_not_return() {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let model = StubModel::new(&[0.2, 0.8]);
        let mut env = StubEnv::new(None, 0.0);
        let result = driver().run(&model, &mut env, EpisodeBudget::Unbounded);
        let _ = sender.send(result);
    });

    assert_eq!(
        receiver.recv_timeout(Duration::from_millis(500)).err(),
        Some(mpsc::RecvTimeoutError::Timeout)
    );
}

#[test]
fn unbounded_rollout_surfaces_errors() {
    let model = StubModel::new(&[0.2, 0.8]);
    let mut env = StubEnv::new(Some(2), 0.0);
    env.fail_on_step = Some(7);

    let result = driver().run(&model, &mut env, EpisodeBudget::Unbounded);
    assert!(matches!(result, Err(Error::Env(EnvError::Unavailable(_)))));
    assert_eq!(env.total_steps, 7);
}

#[test]
fn zero_budget_is_rejected() {
    assert!(matches!(
        EpisodeBudget::episodes(0),
        Err(Error::InvalidEpisodeBudget)
    ));
}

#[test]
fn prediction_width_must_match_action_space() {
    let model = StubModel::new(&[0.1, 0.2, 0.7]);
    let mut env = StubEnv::new(Some(3), 0.0);

    let result = driver().run(&model, &mut env, budget(1));
    assert!(matches!(
        result,
        Err(Error::Inference(InferenceError::PredictionShape { actions: 2, .. }))
    ));
    assert!(env.actions_taken.is_empty());
}

#[derive(Default)]
struct Recorder {
    steps: usize,
    episodes: Vec<(usize, f32)>,
}

impl RolloutObserver<StubEnv> for Recorder {
    fn on_step(&mut self, _env: &StubEnv, action: usize, _step: &Step<Frame>) {
        assert_eq!(action, 1);
        self.steps += 1;
    }

    fn on_episode_end(&mut self, episode: usize, episode_return: f32) {
        self.episodes.push((episode, episode_return));
    }
}

#[test]
fn observer_sees_every_step_and_episode() {
    let model = StubModel::new(&[0.2, 0.8]);
    let mut env = StubEnv::new(Some(3), 1.0);
    let mut recorder = Recorder::default();

    let returns = driver()
        .run_observed(&model, &mut env, budget(2), &mut recorder)
        .unwrap();

    assert_eq!(recorder.steps, 6);
    assert_eq!(recorder.episodes, vec![(0, 3.0), (1, 6.0)]);
    assert_eq!(returns, vec![3.0, 6.0]);
}

#[test]
fn untrained_policy_plays_catch() {
    let device = Default::default();
    let config = CatchConfig::new()
        .with_grid_size(6)
        .with_balls_per_episode(2);
    let mut env = Catch::new(config).unwrap();
    let policy = LstmPolicy::<Backend>::new(4, env.action_space(), &device);

    let returns = driver().run(&policy, &mut env, budget(2)).unwrap();
    assert_eq!(returns.len(), 2);
    for episode_return in returns {
        assert!((-2.0..=2.0).contains(&episode_return));
    }
}
