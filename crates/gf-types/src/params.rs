//! Hyperparameter values, grids and the fixed parameter set handed to a
//! training backend.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::dataset::Dataset;
use crate::errors::GfResult;

/// A concrete hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Json(serde_json::Value),
}

impl ParamValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Json(v) => v.as_i64(),
            Self::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Json(v) => v.as_f64(),
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Json(serde_json::Value::String(v.to_string()))
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Json(serde_json::Value::Bool(v))
    }
}

/// Insertion-ordered name → value mapping.
///
/// Inserting an existing name replaces its value in place, so the position of
/// a key is fixed by its first insertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Copy every entry of `other` over this set.
    pub fn merge(&mut self, other: &ParamSet) {
        for (name, value) in other.iter() {
            self.insert(name, value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ParamValue)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        let mut set = ParamSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl std::fmt::Display for ParamSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// One named dimension of a hyperparameter grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    pub name: String,
    pub values: Vec<ParamValue>,
}

/// Ordered set of candidate values per hyperparameter.
///
/// Declaration order is significant: the last axis varies fastest when the
/// grid is enumerated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperparameterGrid {
    pub axes: Vec<GridAxis>,
}

impl HyperparameterGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis<V: Into<ParamValue>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.axes.push(GridAxis {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Total number of grid points, `None` on overflow.
    pub fn combination_count(&self) -> Option<usize> {
        self.axes
            .iter()
            .try_fold(1usize, |total, axis| total.checked_mul(axis.values.len()))
    }

    /// Reject grids that name the same hyperparameter twice.
    pub fn validate(&self) -> GfResult<()> {
        let mut seen = HashSet::new();
        for axis in &self.axes {
            if !seen.insert(axis.name.as_str()) {
                return Err(crate::config_error!(
                    "hyperparameter {:?} appears more than once in the grid",
                    axis.name
                ));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}

/// Parameters held constant across one grid search.
///
/// The nested-CV orchestrator clones this per fold and swaps in the fold's
/// partitions and log path; the grid search executor only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedParams {
    /// Training backend key, e.g. `gp`, `gsgp` or `slim`.
    pub algorithm: String,
    pub train: Option<Dataset>,
    pub held_out: Option<Dataset>,
    /// Where the backend appends its evolution log.
    pub log_path: Option<PathBuf>,
    pub params: ParamSet,
}

impl FixedParams {
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            train: None,
            held_out: None,
            log_path: None,
            params: ParamSet::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name, value.into());
        self
    }

    pub fn with_train(mut self, train: Dataset) -> Self {
        self.train = Some(train);
        self
    }

    pub fn with_held_out(mut self, held_out: Dataset) -> Self {
        self.held_out = Some(held_out);
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_values_keep_integers_integral() {
        let values: Vec<ParamValue> = serde_json::from_str(r#"[10, 0.1, "rmse", true]"#).unwrap();
        assert_eq!(values[0], ParamValue::Int(10));
        assert_eq!(values[1], ParamValue::Float(0.1));
        assert_eq!(values[2], ParamValue::from("rmse"));
        assert_eq!(values[3], ParamValue::from(true));
    }

    #[test]
    fn param_set_replaces_in_place() {
        let mut set = ParamSet::new().with("a", 1).with("b", 2);
        set.insert("a", ParamValue::Int(9));
        let keys: Vec<&str> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(set.get("a"), Some(&ParamValue::Int(9)));
        assert_eq!(set.to_string(), "{a: 9, b: 2}");
    }

    #[test]
    fn grid_serializes_as_ordered_axis_list() {
        let grid = HyperparameterGrid::new()
            .axis("pop_size", [10, 20])
            .axis("prob_const", [0.1, 0.2]);
        let json = serde_json::to_string(&grid).unwrap();
        assert!(json.starts_with(r#"[{"name":"pop_size""#));

        let back: HyperparameterGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
        assert_eq!(back.combination_count(), Some(4));
    }

    #[test]
    fn grid_rejects_duplicate_axes() {
        let grid = HyperparameterGrid::new()
            .axis("pop_size", [10])
            .axis("pop_size", [20]);
        assert!(grid.validate().is_err());
    }

    #[test]
    fn empty_grid_has_one_point() {
        assert_eq!(HyperparameterGrid::new().combination_count(), Some(1));
        let grid = HyperparameterGrid::new().axis("x", Vec::<i64>::new());
        assert_eq!(grid.combination_count(), Some(0));
    }
}
