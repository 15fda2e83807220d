use burn::module::AutodiffModule;
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::grad_clipping::GradientClippingConfig;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;
use rand::seq::SliceRandom;
use rand::Rng;

use super::{scalar, TrainingHistory};
use crate::error::Result;
use crate::model::{InferenceError, SequenceModel};
use crate::rnn::CfC;

/// Input/target pair, both `[batch, time, features]`.
pub type SequenceBatch<B> = (Tensor<B, 3>, Tensor<B, 3>);

/// Split `x`/`y` along the batch axis into batches of at most `batch_size`.
pub fn batch_sequences<B: Backend>(
    x: Tensor<B, 3>,
    y: Tensor<B, 3>,
    batch_size: usize,
) -> Vec<SequenceBatch<B>> {
    let total = x.dims()[0];
    let batch_size = batch_size.max(1);
    (0..total)
        .step_by(batch_size)
        .map(|start| {
            let len = batch_size.min(total - start);
            (x.clone().narrow(0, start, len), y.clone().narrow(0, start, len))
        })
        .collect()
}

/// Fits a [`CfC`] to target sequences with MSE and Adam.
pub struct SequenceLearner<B: AutodiffBackend> {
    model: CfC<B>,
    optimizer: OptimizerAdaptor<Adam, CfC<B>, B>,
    learning_rate: f64,
    step: usize,
}

impl<B: AutodiffBackend> SequenceLearner<B> {
    /// `grad_clip` bounds the global gradient norm of every update.
    pub fn new(model: CfC<B>, learning_rate: f64, grad_clip: Option<f32>) -> Self {
        let optimizer = AdamConfig::new()
            .with_grad_clipping(grad_clip.map(GradientClippingConfig::Norm))
            .init();
        Self {
            model,
            optimizer,
            learning_rate,
            step: 0,
        }
    }

    pub fn model(&self) -> &CfC<B> {
        &self.model
    }

    pub fn into_model(self) -> CfC<B> {
        self.model
    }

    /// Number of optimizer updates so far.
    pub fn steps(&self) -> usize {
        self.step
    }

    fn mse<BB: Backend>(
        model: &CfC<BB>,
        x: Tensor<BB, 3>,
        y: Tensor<BB, 3>,
    ) -> Result<Tensor<BB, 1>> {
        let (prediction, _) = model.predict(x, None)?;
        let (predicted, expected) = (prediction.dims(), y.dims());
        if predicted.iter().product::<usize>() != expected.iter().product::<usize>() {
            return Err(InferenceError::InputShape {
                actual: predicted.to_vec(),
                expected: format!("{expected:?}"),
            }
            .into());
        }
        let prediction = prediction.reshape(expected);
        Ok(MseLoss::new().forward(prediction, y, Reduction::Mean))
    }

    /// One update on a single batch; returns and logs `train_loss`.
    pub fn training_step(
        &mut self,
        x: Tensor<B, 3>,
        y: Tensor<B, 3>,
        history: &mut TrainingHistory,
    ) -> Result<f32> {
        let loss = Self::mse(&self.model, x, y)?;
        let value = scalar(loss.clone());

        let grads = GradientsParams::from_grads(loss.backward(), &self.model);
        self.model = self
            .optimizer
            .step(self.learning_rate, self.model.clone(), grads);

        history.log("train_loss", self.step, value as f64);
        self.step += 1;
        Ok(value)
    }

    /// One pass over `batches` in random order; returns the mean loss.
    pub fn fit_epoch<R: Rng + ?Sized>(
        &mut self,
        batches: &[SequenceBatch<B>],
        rng: &mut R,
        history: &mut TrainingHistory,
    ) -> Result<f32> {
        let mut order: Vec<usize> = (0..batches.len()).collect();
        order.shuffle(rng);

        let mut total = 0.0;
        for &index in &order {
            let (x, y) = batches[index].clone();
            total += self.training_step(x, y, history)?;
        }
        Ok(total / order.len().max(1) as f32)
    }

    /// Mean MSE over `batches` without tracking gradients; logs `val_loss`.
    pub fn validate(
        &self,
        batches: &[SequenceBatch<B::InnerBackend>],
        history: &mut TrainingHistory,
    ) -> Result<f32> {
        let loss = self.evaluate(batches)?;
        history.log("val_loss", self.step, loss as f64);
        Ok(loss)
    }

    /// Same metric as [`validate`](Self::validate), logged as `test_loss`.
    pub fn test(
        &self,
        batches: &[SequenceBatch<B::InnerBackend>],
        history: &mut TrainingHistory,
    ) -> Result<f32> {
        let loss = self.evaluate(batches)?;
        history.log("test_loss", self.step, loss as f64);
        Ok(loss)
    }

    fn evaluate(&self, batches: &[SequenceBatch<B::InnerBackend>]) -> Result<f32> {
        let model = self.model.valid();
        let mut total = 0.0;
        for (x, y) in batches {
            total += scalar(Self::mse(&model, x.clone(), y.clone())?);
        }
        Ok(total / batches.len().max(1) as f32)
    }
}
