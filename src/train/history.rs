use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::Backend;
use cpu_time::ProcessTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scalar {
    pub metric: String,
    pub step: usize,
    pub value: f64,
}

/// Logged scalars in the order they were recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    scalars: Vec<Scalar>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, metric: &str, step: usize, value: f64) {
        info!(metric, step, value, "scalar");
        self.scalars.push(Scalar {
            metric: metric.to_string(),
            step,
            value,
        });
    }

    pub fn scalars(&self) -> &[Scalar] {
        &self.scalars
    }

    pub fn values(&self, metric: &str) -> Vec<f64> {
        self.scalars
            .iter()
            .filter(|scalar| scalar.metric == metric)
            .map(|scalar| scalar.value)
            .collect()
    }

    pub fn last(&self, metric: &str) -> Option<f64> {
        self.scalars
            .iter()
            .rev()
            .find(|scalar| scalar.metric == metric)
            .map(|scalar| scalar.value)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// Wall-clock and process CPU time of a run.
pub struct RunTimer {
    wall: Instant,
    cpu: ProcessTime,
}

impl RunTimer {
    pub fn start() -> Result<Self> {
        Ok(Self {
            wall: Instant::now(),
            cpu: ProcessTime::try_now()?,
        })
    }

    /// Log `wall_seconds` and `cpu_seconds` into `history` and return them.
    pub fn finish(&self, history: &mut TrainingHistory) -> Result<(f64, f64)> {
        let wall = self.wall.elapsed().as_secs_f64();
        let cpu = self.cpu.try_elapsed()?.as_secs_f64();
        history.log("wall_seconds", 0, wall);
        history.log("cpu_seconds", 0, cpu);
        Ok((wall, cpu))
    }
}

/// Save `model` as `<dir>/<name>.mpk`.
pub fn save_checkpoint<B: Backend, M: Module<B>>(model: &M, dir: &str, name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = PathBuf::from(dir).join(name);
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(path.clone(), &recorder)
        .map_err(|err| Error::Checkpoint(format!("{}: {err:?}", path.display())))?;
    Ok(path.with_extension("mpk"))
}
