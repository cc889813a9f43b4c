//! Structural-size orderings.
//!
//! Size metrics are stored as text. Variants whose size is a bounded count can
//! be compared as floats; variants whose size can grow without bound need
//! exact integer comparison, or sizes past 2^53 collapse into ties.

use num_bigint::BigInt;
use num_traits::FromPrimitive;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use gf_types::{algorithm, config_error, DataError, GfResult};

use crate::selector::SelectionCandidate;

/// Picks the candidates with the smallest structural size.
pub trait SizeOrdering: Send + Sync {
    fn name(&self) -> &'static str;

    /// Keep the `n` smallest candidates, smallest first. Equal sizes keep
    /// their input order.
    fn smallest(
        &self,
        candidates: Vec<SelectionCandidate>,
        n: usize,
    ) -> GfResult<Vec<SelectionCandidate>>;
}

fn invalid_size(candidate: &SelectionCandidate) -> DataError {
    DataError::InvalidSize {
        row: candidate.row.id,
        value: candidate.row.size.clone(),
    }
}

fn keep_smallest<K>(
    candidates: Vec<SelectionCandidate>,
    n: usize,
    key: impl Fn(&SelectionCandidate) -> Option<K>,
    cmp: impl Fn(&K, &K) -> Ordering,
) -> GfResult<Vec<SelectionCandidate>> {
    let mut keyed = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let k = key(&candidate).ok_or_else(|| invalid_size(&candidate))?;
        keyed.push((k, candidate));
    }
    keyed.sort_by(|a, b| cmp(&a.0, &b.0));
    Ok(keyed.into_iter().take(n).map(|(_, c)| c).collect())
}

/// Plain floating-point comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeSize;

impl SizeOrdering for NativeSize {
    fn name(&self) -> &'static str {
        "native"
    }

    fn smallest(
        &self,
        candidates: Vec<SelectionCandidate>,
        n: usize,
    ) -> GfResult<Vec<SelectionCandidate>> {
        keep_smallest(
            candidates,
            n,
            |c| c.row.size.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            f64::total_cmp,
        )
    }
}

/// Exact comparison on arbitrary-precision integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactSize;

impl ExactSize {
    /// Parse integer text exactly. Float text (`"1e3"`, `"12.5"`) is
    /// truncated toward zero; NaN and infinities are rejected.
    pub fn parse(raw: &str) -> Option<BigInt> {
        let raw = raw.trim();
        if let Ok(v) = BigInt::from_str(raw) {
            return Some(v);
        }
        let v = raw.parse::<f64>().ok()?;
        if v.is_finite() {
            BigInt::from_f64(v.trunc())
        } else {
            None
        }
    }
}

impl SizeOrdering for ExactSize {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn smallest(
        &self,
        candidates: Vec<SelectionCandidate>,
        n: usize,
    ) -> GfResult<Vec<SelectionCandidate>> {
        keep_smallest(candidates, n, |c| Self::parse(&c.row.size), BigInt::cmp)
    }
}

/// Variant key → size ordering.
pub struct SizeOrderingRegistry {
    orderings: HashMap<String, Box<dyn SizeOrdering>>,
}

impl SizeOrderingRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            orderings: HashMap::new(),
        }
    }

    pub fn register(&mut self, key: impl Into<String>, ordering: Box<dyn SizeOrdering>) {
        self.orderings.insert(key.into(), ordering);
    }

    pub fn with(mut self, key: impl Into<String>, ordering: impl SizeOrdering + 'static) -> Self {
        self.register(key, Box::new(ordering));
        self
    }

    pub fn get(&self, key: &str) -> GfResult<&dyn SizeOrdering> {
        self.orderings
            .get(key)
            .map(|o| o.as_ref())
            .ok_or_else(|| config_error!("no size ordering registered for variant {key:?}"))
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.orderings.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl Default for SizeOrderingRegistry {
    /// `gp` and `slim` compare natively, `gsgp` exactly.
    fn default() -> Self {
        Self::new()
            .with(algorithm::GP, NativeSize)
            .with(algorithm::SLIM, NativeSize)
            .with(algorithm::GSGP, ExactSize)
    }
}

impl fmt::Debug for SizeOrderingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<(&str, &str)> = self
            .keys()
            .into_iter()
            .map(|k| (k, self.orderings[k].name()))
            .collect();
        f.debug_struct("SizeOrderingRegistry")
            .field("orderings", &entries)
            .finish()
    }
}
