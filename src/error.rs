use crate::env::EnvError;
use crate::model::InferenceError;
use crate::wirings::WiringError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error("an episode budget must be at least 1")]
    InvalidEpisodeBudget,

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
