use serde::{Deserialize, Serialize};

use gf_types::algorithm;

/// Settings for a robust top-N selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Variant key; picks the size ordering.
    pub algorithm: String,
    /// Number of folds kept in stage one and rows kept in stage two.
    pub k: usize,
    /// Number of rows finally selected.
    pub n: usize,
}

impl SelectionConfig {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            ..Self::default()
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_n(mut self, n: usize) -> Self {
        self.n = n;
        self
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            algorithm: algorithm::GP.to_string(),
            k: 10,
            n: 3,
        }
    }
}
