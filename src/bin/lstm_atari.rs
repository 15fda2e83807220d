//! Behavior cloning of an LSTM image policy on Catch, evaluated closed-loop.

use std::path::Path;
use std::thread;
use std::time::Duration;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use ncps_experiments::config::{load_or_default, save_alongside, CloningExperimentConfig};
use ncps_experiments::data::CloningDataset;
use ncps_experiments::env::{Catch, Environment, Frame, Step};
use ncps_experiments::error::Result;
use ncps_experiments::policy::LstmPolicy;
use ncps_experiments::rollout::{EpisodeBudget, RolloutDriver, RolloutObserver};
use ncps_experiments::train::{save_checkpoint, CloningTrainer, RunTimer, TrainingHistory};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

type InferenceBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferenceBackend>;

/// Draws the board in the terminal after every step.
struct TerminalView {
    frame_delay: Duration,
}

impl RolloutObserver<Catch> for TerminalView {
    fn on_step(&mut self, env: &Catch, action: usize, step: &Step<Frame>) {
        // clear screen, cursor home
        print!("\x1B[2J\x1B[H");
        println!("{}\naction {action}  reward {:+}", env.render(), step.reward);
        thread::sleep(self.frame_delay);
    }

    fn on_episode_end(&mut self, episode: usize, episode_return: f32) {
        println!("episode {episode} return {episode_return}");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = load_or_default(CloningExperimentConfig::new())?;
    save_alongside(&config, &config.artifact_dir)?;
    let device = Default::default();
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut demo_env = Catch::new(config.env.clone())?;
    let dataset =
        CloningDataset::record(&mut demo_env, config.demo_episodes, config.sequence_length)?;
    let (train_ds, val_ds) = dataset.split(config.train_fraction)?;
    info!(train = train_ds.len(), val = val_ds.len(), "recorded demonstrations");

    // evaluation episodes differ from the recorded ones
    let mut env = Catch::new(config.env.clone().with_seed(config.env.seed + 1))?;
    let model =
        LstmPolicy::<TrainBackend>::new(config.env.frame_stack, env.action_space(), &device);
    let mut trainer =
        CloningTrainer::new(model, config.learning_rate, config.scaling, device.clone());
    let driver = RolloutDriver::<InferenceBackend>::new(device).with_scaling(config.scaling);
    let mut history = TrainingHistory::new();

    let timer = RunTimer::start()?;
    for epoch in 0..config.num_epochs {
        trainer.train_one_epoch(&train_ds, config.batch_size, &mut rng, &mut history)?;

        let evaluation = trainer.evaluate(&val_ds, config.batch_size)?;
        info!(
            epoch = epoch + 1,
            val_loss = evaluation.loss,
            val_acc = %format!("{:.2}%", 100.0 * evaluation.accuracy),
            "epoch"
        );
        history.log("val_loss", epoch, evaluation.loss as f64);
        history.log("val_acc", epoch, evaluation.accuracy as f64);

        let returns = driver.run(
            &trainer.model().valid(),
            &mut env,
            EpisodeBudget::episodes(config.eval_episodes)?,
        )?;
        let mean_return = returns.iter().sum::<f32>() / returns.len() as f32;
        info!(mean_return, n = returns.len(), "closed loop");
        history.log("mean_return", epoch, mean_return as f64);
    }
    let (wall_seconds, cpu_seconds) = timer.finish(&mut history)?;
    info!(wall_seconds, cpu_seconds, "training time");

    history.save(Path::new(&config.artifact_dir).join("history.json"))?;
    let policy = trainer.into_model();
    let checkpoint = save_checkpoint(&policy, &config.artifact_dir, "lstm_policy")?;
    info!(checkpoint = %checkpoint.display(), "saved model");

    if config.visualize {
        let mut view = TerminalView {
            frame_delay: Duration::from_millis(80),
        };
        driver.run_observed(&policy.valid(), &mut env, EpisodeBudget::Unbounded, &mut view)?;
    }
    Ok(())
}
