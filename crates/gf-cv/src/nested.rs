//! Nested cross-validation driver.
//!
//! [`NestedCv::run`] takes the first partition of the outer splitter as the
//! learning/test split, cuts the learning rows with the inner splitter, and
//! runs one grid search per inner fold. Each fold gets its own log file and
//! seed; stale logs from earlier runs are removed first.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use gf_search::{GridSearchExecutor, ModelRun};
use gf_types::{
    config_error, empty_data, fold_log_path, Dataset, FixedParams, Fold, GfResult,
    HyperparameterGrid,
};

use crate::config::NestedCvConfig;
use crate::splitter::Splitter;

/// Grid search outcome for one inner fold.
#[derive(Debug)]
pub struct FoldResult {
    pub fold_index: usize,
    pub seed: u64,
    pub log_path: PathBuf,
    /// `(rows, features)` of the training slice.
    pub train_shape: (usize, usize),
    /// `(rows, features)` of the validation slice.
    pub validation_shape: (usize, usize),
    /// One run per grid point, in enumeration order.
    pub runs: Vec<ModelRun>,
}

/// Everything produced by [`NestedCv::run`].
#[derive(Debug)]
pub struct NestedCvOutcome {
    /// The outer partition that was used; `outer.test` is the untouched hold-out.
    pub outer: Fold,
    /// Inner fold results, ordered by fold index.
    pub folds: Vec<FoldResult>,
}

impl NestedCvOutcome {
    pub fn len(&self) -> usize {
        self.folds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folds.is_empty()
    }

    /// Total number of trained models across all folds.
    pub fn total_runs(&self) -> usize {
        self.folds.iter().map(|f| f.runs.len()).sum()
    }
}

/// Runs a grid search per inner fold of a nested cross-validation.
#[derive(Debug, Clone)]
pub struct NestedCv {
    config: NestedCvConfig,
}

impl NestedCv {
    pub fn new(config: NestedCvConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NestedCvConfig {
        &self.config
    }

    /// Run every inner fold sequentially.
    ///
    /// Only the first outer partition is used; any further partitions the
    /// outer splitter could yield are ignored. `fixed` is cloned per fold and
    /// left untouched. The first failing fold aborts the run.
    pub fn run(
        &self,
        data: &Dataset,
        outer: &dyn Splitter,
        inner: &dyn Splitter,
        fixed: &FixedParams,
        grid: &HyperparameterGrid,
        executor: &GridSearchExecutor,
    ) -> GfResult<NestedCvOutcome> {
        let log_dir = &self.config.log_dir;
        if !log_dir.is_dir() {
            return Err(config_error!(
                "log directory {} does not exist",
                log_dir.display()
            ));
        }

        executor.registry().get(&fixed.algorithm)?;

        let outer_fold = outer
            .split(data)?
            .next()
            .ok_or_else(|| empty_data!("outer splitter yielded no partitions"))?;
        if outer.n_splits() > 1 {
            debug!(
                "Using outer partition 0 of {}; the rest are ignored",
                outer.n_splits()
            );
        }
        outer_fold.validate(0, data.len())?;

        let learning = data.take(&outer_fold.train)?;
        let test = data.take(&outer_fold.test)?;
        info!(
            "Outer CV: learning shape {:?}, test shape {:?}",
            learning.shape(),
            test.shape()
        );

        let mut folds = Vec::new();
        for (i, fold) in inner.split(&learning)?.enumerate() {
            fold.validate(i, learning.len())?;

            let train = learning.take(&fold.train)?;
            let validation = learning.take(&fold.test)?;
            info!(
                "Inner CV {}: training shape {:?}, validation shape {:?}",
                i,
                train.shape(),
                validation.shape()
            );

            let log_path = fold_log_path(log_dir, &fixed.algorithm, &self.config.dataset_name, i);
            if log_path.exists() {
                warn!("Removing stale log {}", log_path.display());
                fs::remove_file(&log_path)?;
            }

            let seed = self
                .config
                .base_seed
                .checked_add(i as u64)
                .ok_or_else(|| config_error!("seed overflow at fold {i}"))?;

            let train_shape = train.shape();
            let validation_shape = validation.shape();
            let fold_params = fixed
                .clone()
                .with_train(train)
                .with_held_out(validation)
                .with_log_path(&log_path);

            let runs = executor.run(&fold_params, grid, seed, self.config.set_max_depth)?;

            folds.push(FoldResult {
                fold_index: i,
                seed,
                log_path,
                train_shape,
                validation_shape,
                runs,
            });
        }

        if folds.is_empty() {
            return Err(empty_data!("inner splitter yielded no partitions"));
        }

        // Logs of folds past this run's last one would be read back as ours.
        for j in folds.len().. {
            let path = fold_log_path(log_dir, &fixed.algorithm, &self.config.dataset_name, j);
            if !path.exists() {
                break;
            }
            warn!("Removing stale log {} left by an earlier run", path.display());
            fs::remove_file(&path)?;
        }

        info!(
            "Nested CV finished: {} folds, {} models",
            folds.len(),
            folds.iter().map(|f| f.runs.len()).sum::<usize>()
        );
        Ok(NestedCvOutcome {
            outer: outer_fold,
            folds,
        })
    }
}
