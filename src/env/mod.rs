//! # Environments
//!
//! The [`Environment`] capability driven by the closed-loop rollout, plus
//! [`Catch`], a small pixel game with an Atari-style stacked-frame
//! observation.

use std::collections::BTreeMap;
use thiserror::Error;

mod catch;
mod frame;

pub use catch::{Catch, CatchAction, CatchConfig};
pub use frame::{to_channels_first, Frame, ObservationScaling};

/// Diagnostic values reported with a step.
pub type Info = BTreeMap<String, f64>;

#[derive(Error, Debug)]
pub enum EnvError {
    #[error("environment unavailable: {0}")]
    Unavailable(String),

    #[error("action {action} is outside the action space of size {actions}")]
    InvalidAction { action: usize, actions: usize },

    #[error("episode is over; reset the environment before stepping")]
    EpisodeOver,

    #[error("environment error: {0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Result of advancing an environment by one action.
#[derive(Debug, Clone)]
pub struct Step<O> {
    pub observation: O,
    pub reward: f32,
    pub done: bool,
    pub info: Info,
}

/// An episodic environment with a discrete action space.
pub trait Environment {
    type Observation;

    /// Start a new episode and return its first observation.
    fn reset(&mut self) -> Result<Self::Observation, EnvError>;

    fn step(&mut self, action: usize) -> Result<Step<Self::Observation>, EnvError>;

    /// Number of discrete actions; valid actions are `0..action_space()`.
    fn action_space(&self) -> usize;
}
