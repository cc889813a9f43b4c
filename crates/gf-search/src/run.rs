use gf_types::ParamSet;

use crate::backend::TrainedModel;

/// Outcome of training one grid point.
///
/// Metrics are copied out of the model when the run is created, so the model
/// handle can be released or dropped without losing them.
#[derive(Debug)]
pub struct ModelRun {
    index: usize,
    dynamic_params: ParamSet,
    train_error: f64,
    held_out_error: f64,
    model: Option<Box<dyn TrainedModel>>,
}

impl ModelRun {
    pub fn new(index: usize, dynamic_params: ParamSet, model: Box<dyn TrainedModel>) -> Self {
        Self {
            index,
            dynamic_params,
            train_error: model.train_error(),
            held_out_error: model.held_out_error(),
            model: Some(model),
        }
    }

    /// Position of this combination in grid enumeration order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The grid combination that produced this run (without fixed parameters).
    pub fn dynamic_params(&self) -> &ParamSet {
        &self.dynamic_params
    }

    pub fn train_error(&self) -> f64 {
        self.train_error
    }

    pub fn held_out_error(&self) -> f64 {
        self.held_out_error
    }

    pub fn model(&self) -> Option<&dyn TrainedModel> {
        self.model.as_deref()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Take ownership of the trained model, leaving the metrics behind.
    pub fn release_model(&mut self) -> Option<Box<dyn TrainedModel>> {
        self.model.take()
    }

    /// Drop the trained model now.
    pub fn discard_model(&mut self) {
        self.model = None;
    }
}
