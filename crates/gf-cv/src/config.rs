use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings for one nested cross-validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedCvConfig {
    /// Used in per-fold log file names.
    pub dataset_name: String,
    /// Must already exist.
    pub log_dir: PathBuf,
    /// Inner fold `i` trains with seed `base_seed + i`.
    pub base_seed: u64,
    /// Derive `max_depth` from `init_depth` in every grid search.
    pub set_max_depth: bool,
}

impl NestedCvConfig {
    pub fn new(dataset_name: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_name: dataset_name.into(),
            log_dir: log_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    pub fn with_max_depth_derivation(mut self, enabled: bool) -> Self {
        self.set_max_depth = enabled;
        self
    }
}

impl Default for NestedCvConfig {
    fn default() -> Self {
        Self {
            dataset_name: "dataset".to_string(),
            log_dir: PathBuf::from("log"),
            base_seed: 0,
            set_max_depth: false,
        }
    }
}
