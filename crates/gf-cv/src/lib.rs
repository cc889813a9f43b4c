//! # gf-cv
//!
//! Nested cross-validation for gridfold.
//!
//! Splits a dataset once with an outer [`Splitter`], cuts the learning side
//! into inner folds, and runs a grid search per fold with its own seed and
//! evolution log.

mod config;
mod nested;
mod splitter;

pub use config::NestedCvConfig;
pub use nested::{FoldResult, NestedCv, NestedCvOutcome};
pub use splitter::{KFold, ShuffleSplit, Splitter};
