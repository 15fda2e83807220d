//! Experiment configuration.
//!
//! Both binaries start from the defaults below. When `NCPS_CONFIG` names a
//! JSON file, that file is merged over them; fields missing from the file,
//! at any depth, keep their defaults.

use std::path::{Path, PathBuf};

use burn::config::Config;
use serde_json::Value;
use tracing::info;

use crate::cells::CfcMode;
use crate::env::{CatchConfig, ObservationScaling};
use crate::error::{self, Error};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "NCPS_CONFIG";

/// CfC with an AutoNCP wiring regressing a frequency-doubled sine.
#[derive(Config, Debug)]
pub struct SineExperimentConfig {
    /// Length of the time series.
    #[config(default = 48)]
    pub sequence_length: usize,
    #[config(default = 2)]
    pub in_features: usize,
    #[config(default = 1)]
    pub out_features: usize,
    /// AutoNCP units, motor neurons included.
    #[config(default = 16)]
    pub units: usize,
    #[config(default = 0.5)]
    pub sparsity: f64,
    #[config(default = 22222)]
    pub wiring_seed: u64,
    #[config(default = "CfcMode::Default")]
    pub mode: CfcMode,
    #[config(default = 0.01)]
    pub learning_rate: f64,
    #[config(default = 400)]
    pub num_epochs: usize,
    #[config(default = 1)]
    pub batch_size: usize,
    /// Gradient norm clip.
    #[config(default = 1.0)]
    pub grad_clip: f32,
    #[config(default = 42)]
    pub seed: u64,
    #[config(default = "String::from(\"artifacts/cfc_sine\")")]
    pub artifact_dir: String,
}

/// LSTM image policy cloned from a scripted Catch expert.
#[derive(Config, Debug)]
pub struct CloningExperimentConfig {
    #[config(default = "CatchConfig::new()")]
    pub env: CatchConfig,
    /// Expert episodes recorded for the dataset.
    #[config(default = 60)]
    pub demo_episodes: usize,
    /// Frames per training sequence.
    #[config(default = 16)]
    pub sequence_length: usize,
    #[config(default = 0.8)]
    pub train_fraction: f64,
    #[config(default = 32)]
    pub batch_size: usize,
    #[config(default = 0.001)]
    pub learning_rate: f64,
    #[config(default = 1)]
    pub num_epochs: usize,
    /// Closed-loop episodes played after every epoch.
    #[config(default = 10)]
    pub eval_episodes: usize,
    #[config(default = "ObservationScaling::UnitInterval")]
    pub scaling: ObservationScaling,
    /// Keep playing and rendering after training, until interrupted.
    #[config(default = false)]
    pub visualize: bool,
    #[config(default = 42)]
    pub seed: u64,
    #[config(default = "String::from(\"artifacts/lstm_atari\")")]
    pub artifact_dir: String,
}

/// `default` unless [`CONFIG_ENV`] names a file, which is then merged over it.
pub fn load_or_default<C: Config>(default: C) -> error::Result<C> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            let config = load_over(default, &path)
                .map_err(|err| Error::Config(format!("could not load {path}: {err}")))?;
            info!(path = %path, "loaded config");
            Ok(config)
        }
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(Error::Config(format!("{CONFIG_ENV}: {err}"))),
    }
}

/// Read the JSON file at `path` and merge it over `default`.
pub fn load_over<C: Config>(default: C, path: impl AsRef<Path>) -> error::Result<C> {
    let overrides: Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let mut merged = serde_json::to_value(&default)?;
    merge(&mut merged, overrides);
    Ok(serde_json::from_value(merged)?)
}

/// Objects merge key by key; anything else replaces the base value.
fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (base, value) => *base = value,
    }
}

/// Write `config` to `<artifact_dir>/config.json` next to the run's outputs.
pub fn save_alongside<C: Config>(config: &C, artifact_dir: &str) -> error::Result<PathBuf> {
    std::fs::create_dir_all(artifact_dir)?;
    let path = PathBuf::from(artifact_dir).join("config.json");
    config.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_defaults() {
        let config = SineExperimentConfig::new();
        assert_eq!(config.sequence_length, 48);
        assert_eq!(config.units, 16);
        assert_eq!(config.num_epochs, 400);
        assert_eq!(config.learning_rate, 0.01);
    }

    fn write(dir: &tempfile::TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn cloning_config_reads_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, r#"{ "num_epochs": 3, "scaling": "Raw" }"#);

        let config = load_over(CloningExperimentConfig::new(), &path).unwrap();
        assert_eq!(config.num_epochs, 3);
        assert_eq!(config.scaling, ObservationScaling::Raw);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.env.grid_size, 12);
    }

    #[test]
    fn nested_env_fields_keep_their_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, r#"{ "env": { "grid_size": 8 } }"#);

        let config = load_over(CloningExperimentConfig::new(), &path).unwrap();
        assert_eq!(config.env.grid_size, 8);
        assert_eq!(config.env.frame_stack, 4);
        assert_eq!(config.env.balls_per_episode, 5);
        assert_eq!(config.demo_episodes, 60);
    }

    #[test]
    fn config_env_var_points_at_a_file() {
        // the only test touching the variable
        let dir = tempfile::tempdir().unwrap();
        let partial = write(&dir, r#"{ "num_epochs": 3 }"#);
        let malformed = dir.path().join("broken.json");
        std::fs::write(&malformed, "{ not json").unwrap();

        std::env::set_var(CONFIG_ENV, &partial);
        let loaded = load_or_default(CloningExperimentConfig::new());
        std::env::set_var(CONFIG_ENV, &malformed);
        let broken = load_or_default(SineExperimentConfig::new());
        std::env::remove_var(CONFIG_ENV);

        let config = loaded.unwrap();
        assert_eq!(config.num_epochs, 3);
        assert_eq!(config.learning_rate, 0.001);
        assert_eq!(config.env.grid_size, 12);
        assert!(matches!(broken, Err(Error::Config(_))));
    }
}
