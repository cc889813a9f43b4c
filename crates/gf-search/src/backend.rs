//! Training backend abstraction.
//!
//! A backend turns one fully merged parameter set into a trained model and,
//! as a side effect, appends per-generation rows to the evolution log named in
//! the request. Backends are registered by key in a [`BackendRegistry`]; the
//! grid search executor never needs to know the concrete variants.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use gf_types::{config_error, Dataset, GfResult, ParamSet};

/// Everything a backend sees for one training run.
#[derive(Debug, Clone, Copy)]
pub struct TrainRequest<'a> {
    pub algorithm: &'a str,
    /// Fixed parameters overlaid with the combination's dynamic parameters.
    pub params: &'a ParamSet,
    pub train: Option<&'a Dataset>,
    pub held_out: Option<&'a Dataset>,
    pub log_path: Option<&'a Path>,
}

/// A trained model as returned by a backend.
pub trait TrainedModel: fmt::Debug + Send {
    /// Error on the training partition.
    fn train_error(&self) -> f64;

    /// Error on the held-out partition.
    fn held_out_error(&self) -> f64;
}

/// A pluggable model trainer.
pub trait TrainingBackend: Send + Sync {
    /// Registry key, e.g. `gp`.
    fn name(&self) -> &str;

    /// Train one model. Failures are returned as-is to the caller of the
    /// grid search.
    fn train(&self, request: &TrainRequest<'_>, seed: u64) -> anyhow::Result<Box<dyn TrainedModel>>;
}

/// Key → backend lookup table.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn TrainingBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its own name, replacing any previous entry.
    pub fn register(&mut self, backend: Box<dyn TrainingBackend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn with(mut self, backend: impl TrainingBackend + 'static) -> Self {
        self.register(Box::new(backend));
        self
    }

    pub fn get(&self, key: &str) -> GfResult<&dyn TrainingBackend> {
        self.backends
            .get(key)
            .map(|b| b.as_ref())
            .ok_or_else(|| config_error!("unknown algorithm {key:?} (registered: {})", self.keys().join(", ")))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.backends.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.keys())
            .finish()
    }
}
