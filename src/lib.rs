//! # NCPS Experiments
//!
//! Two Neural Circuit Policy experiments on the Burn framework.
//!
//! ## Features
//!
//! - **CfC**: Closed-form Continuous-time cells (3 modes: default, pure, no_gate)
//! - **NCP**: Neural Circuit Policy wiring driving sparse, layered CfC cells
//! - **LSTM policy**: convolutional encoder + LSTM for image sequences
//! - **Closed-loop rollout**: plays an environment with a recurrent policy,
//!   threading its state through the episode and resetting it at every end
//! - **Training**: MSE sequence regression and behavior cloning with Adam
//!
//! ## Quick Start
//!
//! ```rust
//! use ncps_experiments::prelude::*;
//!
//! let mut wiring = AutoNCP::new(16, 1, 0.5, 22222).unwrap();
//! wiring.build(2).unwrap();
//!
//! assert_eq!(wiring.units(), 16);
//! assert_eq!(wiring.output_dim(), 1);
//! ```
//!
//! ## Closed Loop
//!
//! ```ignore
//! let driver = RolloutDriver::<NdArray<f32>>::new(device)
//!     .with_scaling(ObservationScaling::UnitInterval);
//! let returns = driver.run(&policy.valid(), &mut env, EpisodeBudget::episodes(10)?)?;
//! ```

pub mod cells;
pub mod config;
pub mod data;
pub mod env;
pub mod error;
pub mod model;
pub mod policy;
pub mod rnn;
pub mod rollout;
pub mod train;
pub mod wirings;

pub mod prelude {
    pub use crate::cells::{CfCCell, CfcMode, LSTMCell, LstmState, WiredCfCCell};
    pub use crate::env::{Catch, CatchConfig, Environment, Frame, ObservationScaling, Step};
    pub use crate::error::{Error, Result};
    pub use crate::model::{InferenceError, SequenceModel};
    pub use crate::policy::LstmPolicy;
    pub use crate::rnn::{CfC, Lstm};
    pub use crate::rollout::{EpisodeBudget, RolloutDriver, RolloutObserver};
    pub use crate::wirings::{AutoNCP, FullyConnected, Wiring, NCP};
}
