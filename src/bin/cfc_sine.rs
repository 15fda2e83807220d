//! Fit a CfC with a 16-unit AutoNCP wiring to a frequency-doubled sine.

use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use ncps_experiments::config::{load_or_default, save_alongside, SineExperimentConfig};
use ncps_experiments::data::generate_sine_data;
use ncps_experiments::error::Result;
use ncps_experiments::model::InferenceError;
use ncps_experiments::rnn::CfC;
use ncps_experiments::train::sequence::batch_sequences;
use ncps_experiments::train::{save_checkpoint, RunTimer, SequenceLearner, TrainingHistory};
use ncps_experiments::wirings::AutoNCP;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

type TrainBackend = Autodiff<NdArray<f32>>;

#[derive(Serialize)]
struct Predictions {
    target: Vec<f32>,
    before_training: Vec<f32>,
    after_training: Vec<f32>,
}

fn predict<B: Backend>(model: &CfC<B>, x: Tensor<B, 3>) -> Result<Vec<f32>> {
    let (prediction, _) = model.forward(x, None);
    prediction
        .into_data()
        .to_vec::<f32>()
        .map_err(|err| InferenceError::TensorData(format!("{err:?}")).into())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = load_or_default(SineExperimentConfig::new())?;
    save_alongside(&config, &config.artifact_dir)?;
    let device = Default::default();
    let mut rng = StdRng::seed_from_u64(config.seed);

    let data = generate_sine_data(config.sequence_length);
    info!(x = ?data.x.dim(), y = ?data.y.dim(), "training data");

    let wiring = AutoNCP::new(
        config.units,
        config.out_features,
        config.sparsity,
        config.wiring_seed,
    )?;
    let model = CfC::<TrainBackend>::with_wiring(config.in_features, wiring, &device)?
        .with_mode(config.mode)
        .with_batch_first(true);

    let (x, y) = data.to_tensors::<TrainBackend>(&device);
    let batches = batch_sequences(x, y, config.batch_size);
    let (x_eval, y_eval) = data.to_tensors::<NdArray<f32>>(&device);
    let eval_batches = batch_sequences(x_eval.clone(), y_eval, config.batch_size);

    let before_training = predict(&model.valid(), x_eval.clone())?;

    let mut learner = SequenceLearner::new(model, config.learning_rate, Some(config.grad_clip));
    let mut history = TrainingHistory::new();

    let timer = RunTimer::start()?;
    for epoch in 0..config.num_epochs {
        let train_loss = learner.fit_epoch(&batches, &mut rng, &mut history)?;
        if (epoch + 1) % 50 == 0 || epoch + 1 == config.num_epochs {
            let val_loss = learner.validate(&eval_batches, &mut history)?;
            info!(epoch = epoch + 1, train_loss, val_loss, "epoch");
        }
    }
    let (wall_seconds, cpu_seconds) = timer.finish(&mut history)?;
    info!(wall_seconds, cpu_seconds, "training time");

    let test_loss = learner.test(&eval_batches, &mut history)?;
    info!(test_loss, "trained");

    let model = learner.into_model();
    let predictions = Predictions {
        target: data.y.iter().copied().collect(),
        before_training,
        after_training: predict(&model.valid(), x_eval)?,
    };

    let dir = Path::new(&config.artifact_dir);
    history.save(dir.join("history.json"))?;
    std::fs::write(
        dir.join("predictions.json"),
        serde_json::to_string_pretty(&predictions)?,
    )?;
    let checkpoint = save_checkpoint(&model, &config.artifact_dir, "cfc_sine")?;
    info!(checkpoint = %checkpoint.display(), "saved model");
    Ok(())
}
