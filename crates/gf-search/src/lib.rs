//! # gf-search
//!
//! Hyperparameter grid search for gridfold.
//!
//! Enumerates a [`HyperparameterGrid`](gf_types::HyperparameterGrid) in
//! last-axis-fastest order and trains one model per point through a
//! [`TrainingBackend`] looked up by algorithm key in a [`BackendRegistry`].

mod backend;
mod executor;
mod grid;
mod run;

pub use backend::{BackendRegistry, TrainRequest, TrainedModel, TrainingBackend};
pub use executor::{derive_max_depth, GridSearchExecutor, INIT_DEPTH, MAX_DEPTH, MAX_DEPTH_OFFSET};
pub use grid::{combinations, Combinations};
pub use run::ModelRun;
