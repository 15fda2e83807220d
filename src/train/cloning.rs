use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{Int, Tensor};
use rand::Rng;
use tracing::info;

use super::{scalar, TrainingHistory};
use crate::data::CloningDataset;
use crate::env::ObservationScaling;
use crate::error::{Error, Result};
use crate::model::SequenceModel;
use crate::policy::LstmPolicy;

/// Validation metrics of one [`CloningTrainer::evaluate`] pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    /// Fraction of steps where the arg-max action matches the label.
    pub accuracy: f32,
}

/// Behavior cloning of an [`LstmPolicy`]: cross-entropy between per-step
/// action logits and the recorded expert actions.
pub struct CloningTrainer<B: AutodiffBackend> {
    model: LstmPolicy<B>,
    optimizer: OptimizerAdaptor<Adam, LstmPolicy<B>, B>,
    learning_rate: f64,
    scaling: ObservationScaling,
    device: B::Device,
    step: usize,
}

/// `[batch, time, actions]` logits and `[batch, time]` labels flattened to
/// one row per step.
fn flatten<B: Backend>(
    logits: Tensor<B, 3>,
    labels: Tensor<B, 2, Int>,
) -> (Tensor<B, 2>, Tensor<B, 1, Int>) {
    let [batch, time, actions] = logits.dims();
    (
        logits.reshape([batch * time, actions]),
        labels.reshape([batch * time]),
    )
}

impl<B: AutodiffBackend> CloningTrainer<B> {
    pub fn new(
        model: LstmPolicy<B>,
        learning_rate: f64,
        scaling: ObservationScaling,
        device: B::Device,
    ) -> Self {
        Self {
            model,
            optimizer: AdamConfig::new().init(),
            learning_rate,
            scaling,
            device,
            step: 0,
        }
    }

    pub fn model(&self) -> &LstmPolicy<B> {
        &self.model
    }

    pub fn into_model(self) -> LstmPolicy<B> {
        self.model
    }

    /// One shuffled pass over `dataset`; logs every batch `loss` and returns
    /// the running mean.
    pub fn train_one_epoch<R: Rng + ?Sized>(
        &mut self,
        dataset: &CloningDataset,
        batch_size: usize,
        rng: &mut R,
        history: &mut TrainingHistory,
    ) -> Result<f32> {
        if dataset.is_empty() {
            return Err(Error::Dataset("no training sequences".into()));
        }
        let criterion = CrossEntropyLossConfig::new().init(&self.device);

        let batches = dataset.batches(batch_size, true, rng);
        let mut running_loss = 0.0;
        for (i, indices) in batches.iter().enumerate() {
            let (frames, labels) = dataset.to_tensors::<B>(indices, self.scaling, &self.device)?;
            let (logits, _) = self.model.predict(frames, None)?;
            let (logits, labels) = flatten(logits, labels);

            let loss = criterion.forward(logits, labels);
            let value = scalar(loss.clone());
            history.log("loss", self.step, value as f64);

            let grads = GradientsParams::from_grads(loss.backward(), &self.model);
            self.model = self
                .optimizer
                .step(self.learning_rate, self.model.clone(), grads);
            self.step += 1;

            running_loss += value;
            tracing::debug!(
                batch = i + 1,
                of = batches.len(),
                loss = running_loss / (i + 1) as f32,
                "training"
            );
        }
        Ok(running_loss / batches.len() as f32)
    }

    /// Mean loss and accuracy over `dataset` with the inference model.
    pub fn evaluate(&self, dataset: &CloningDataset, batch_size: usize) -> Result<Evaluation> {
        if dataset.is_empty() {
            return Err(Error::Dataset("no validation sequences".into()));
        }
        let model = self.model.valid();
        let criterion = CrossEntropyLossConfig::new().init(&self.device);

        let mut losses = Vec::new();
        let mut accuracies = Vec::new();
        for indices in dataset.batches(batch_size, false, &mut rand::thread_rng()) {
            let (frames, labels) = dataset.to_tensors::<B::InnerBackend>(
                &indices,
                self.scaling,
                &self.device,
            )?;
            let (logits, _) = model.predict(frames, None)?;
            let (logits, labels) = flatten(logits, labels);

            let correct = logits
                .clone()
                .argmax(1)
                .flatten::<1>(0, 1)
                .equal(labels.clone())
                .int()
                .float()
                .mean();
            losses.push(scalar(criterion.forward(logits, labels)));
            accuracies.push(scalar(correct));
        }

        let mean = |values: &[f32]| values.iter().sum::<f32>() / values.len() as f32;
        let evaluation = Evaluation {
            loss: mean(&losses),
            accuracy: mean(&accuracies),
        };
        info!(
            val_loss = evaluation.loss,
            val_acc = evaluation.accuracy,
            "validation"
        );
        Ok(evaluation)
    }
}
