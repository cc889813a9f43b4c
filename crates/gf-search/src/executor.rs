//! Exhaustive grid search over one training backend.

use tracing::{debug, info};

use gf_types::{config_error, FixedParams, GfError, GfResult, HyperparameterGrid, ParamSet, ParamValue};

use crate::backend::{BackendRegistry, TrainRequest};
use crate::grid::combinations;
use crate::run::ModelRun;

/// Name of the parameter that seeds the derived depth bound.
pub const INIT_DEPTH: &str = "init_depth";
/// Name of the derived depth bound.
pub const MAX_DEPTH: &str = "max_depth";
/// `max_depth = init_depth + MAX_DEPTH_OFFSET` when depth derivation is on.
pub const MAX_DEPTH_OFFSET: i64 = 15;

/// Set `max_depth` to `init_depth + MAX_DEPTH_OFFSET`, replacing any
/// existing value.
pub fn derive_max_depth(params: &mut ParamSet) -> GfResult<()> {
    let init_depth = params
        .get(INIT_DEPTH)
        .and_then(ParamValue::as_i64)
        .ok_or_else(|| config_error!("set_max_depth requires an integer {INIT_DEPTH} parameter"))?;
    let max_depth = init_depth
        .checked_add(MAX_DEPTH_OFFSET)
        .ok_or_else(|| config_error!("{INIT_DEPTH} {init_depth} is out of range"))?;
    params.insert(MAX_DEPTH, ParamValue::Int(max_depth));
    Ok(())
}

/// Trains one model per grid point through a registered backend.
#[derive(Debug)]
pub struct GridSearchExecutor {
    registry: BackendRegistry,
    retain_models: bool,
}

impl GridSearchExecutor {
    pub fn new(registry: BackendRegistry) -> Self {
        Self {
            registry,
            retain_models: true,
        }
    }

    /// When `false`, each run drops its model handle as soon as the metrics
    /// have been read.
    pub fn with_model_retention(mut self, retain: bool) -> Self {
        self.retain_models = retain;
        self
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Train every combination of `grid` on top of `fixed`.
    ///
    /// Runs come back in enumeration order (last axis fastest). Every
    /// combination receives the same `seed`. With `set_max_depth`,
    /// `max_depth` is forced to `init_depth + 15`, overriding any grid value.
    /// Configuration problems are reported before anything is trained; the
    /// first backend failure aborts the search and is returned unchanged.
    pub fn run(
        &self,
        fixed: &FixedParams,
        grid: &HyperparameterGrid,
        seed: u64,
        set_max_depth: bool,
    ) -> GfResult<Vec<ModelRun>> {
        grid.validate()?;
        let backend = self.registry.get(&fixed.algorithm)?;

        let plan = self.plan(fixed, grid, set_max_depth)?;
        info!(
            "Grid search: {} combinations with {} (seed {})",
            plan.len(),
            fixed.algorithm,
            seed
        );

        let mut runs = Vec::with_capacity(plan.len());
        for (index, (dynamic, full)) in plan.into_iter().enumerate() {
            debug!("Combination {}: {}", index, dynamic);

            let request = TrainRequest {
                algorithm: &fixed.algorithm,
                params: &full,
                train: fixed.train.as_ref(),
                held_out: fixed.held_out.as_ref(),
                log_path: fixed.log_path(),
            };
            let model = backend.train(&request, seed).map_err(GfError::backend)?;

            let mut run = ModelRun::new(index, dynamic, model);
            if !self.retain_models {
                run.discard_model();
            }
            debug!(
                "Combination {} done: train {:.6}, held-out {:.6}",
                index,
                run.train_error(),
                run.held_out_error()
            );
            runs.push(run);
        }

        Ok(runs)
    }

    /// Pair every combination with its merged parameter set.
    fn plan(
        &self,
        fixed: &FixedParams,
        grid: &HyperparameterGrid,
        set_max_depth: bool,
    ) -> GfResult<Vec<(ParamSet, ParamSet)>> {
        if grid.combination_count().is_none() {
            return Err(config_error!("grid has too many combinations to enumerate"));
        }

        combinations(grid)
            .map(|dynamic| -> GfResult<(ParamSet, ParamSet)> {
                let mut full = fixed.params.clone();
                full.merge(&dynamic);
                if set_max_depth {
                    derive_max_depth(&mut full)?;
                }
                Ok((dynamic, full))
            })
            .collect()
    }
}
