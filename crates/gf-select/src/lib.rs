//! # gf-select
//!
//! Robust top-N model selection for gridfold.
//!
//! Consumes the evolution logs of every inner fold and narrows them down to a
//! short, reproducible list of row identifiers: best folds by median held-out
//! error, then least overfit rows, then smallest models.

mod config;
mod selector;
mod size;

pub use config::SelectionConfig;
pub use selector::{fold_medians, select_top_n, RobustSelector, SelectionCandidate};
pub use size::{ExactSize, NativeSize, SizeOrdering, SizeOrderingRegistry};
