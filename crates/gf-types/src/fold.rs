use serde::{Deserialize, Serialize};

use crate::errors::{DataError, GfResult};

/// A train/test partition of a parent row set.
///
/// At the outer level `train` is the learning partition and `test` the final
/// hold-out; at the inner level they are the training and validation rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Fold {
    pub fn new(train: Vec<usize>, test: Vec<usize>) -> Self {
        Self { train, test }
    }

    /// Check that both sides are non-empty, disjoint, in bounds and together
    /// cover every row of a parent of `parent_len` rows.
    pub fn validate(&self, fold: usize, parent_len: usize) -> GfResult<()> {
        let invalid = |message: String| DataError::InvalidFold { fold, message };

        if self.train.is_empty() || self.test.is_empty() {
            return Err(invalid(format!(
                "empty partition (train {}, test {})",
                self.train.len(),
                self.test.len()
            ))
            .into());
        }

        let mut seen = vec![false; parent_len];
        for &ix in self.train.iter().chain(&self.test) {
            match seen.get_mut(ix) {
                None => {
                    return Err(invalid(format!(
                        "row {ix} outside parent of {parent_len} rows"
                    ))
                    .into())
                }
                Some(true) => return Err(invalid(format!("row {ix} assigned twice")).into()),
                Some(slot) => *slot = true,
            }
        }

        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(invalid(format!("row {missing} not assigned to either side")).into());
        }
        Ok(())
    }
}
