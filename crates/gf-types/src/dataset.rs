use serde::{Deserialize, Serialize};

use crate::errors::{DataError, GfResult};

/// Row-major feature matrix with an aligned regression target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    features: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl Dataset {
    pub fn new(features: Vec<Vec<f64>>, targets: Vec<f64>) -> GfResult<Self> {
        if features.len() != targets.len() {
            return Err(DataError::Misaligned {
                features: features.len(),
                targets: targets.len(),
            }
            .into());
        }
        if features.is_empty() {
            return Err(crate::empty_data!("dataset has no rows"));
        }
        let width = features[0].len();
        if let Some(row) = features.iter().position(|r| r.len() != width) {
            return Err(DataError::Ragged {
                row,
                found: features[row].len(),
                expected: width,
            }
            .into());
        }
        Ok(Self { features, targets })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    /// `(rows, features)`
    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.n_features())
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// Gather the given rows, in the given order, into a new dataset.
    pub fn take(&self, indices: &[usize]) -> GfResult<Dataset> {
        if indices.is_empty() {
            return Err(crate::empty_data!("cannot slice an empty row set"));
        }
        let mut features = Vec::with_capacity(indices.len());
        let mut targets = Vec::with_capacity(indices.len());
        for &ix in indices {
            if ix >= self.len() {
                return Err(DataError::IndexOutOfBounds {
                    index: ix,
                    len: self.len(),
                }
                .into());
            }
            features.push(self.features[ix].clone());
            targets.push(self.targets[ix]);
        }
        Ok(Dataset { features, targets })
    }
}
