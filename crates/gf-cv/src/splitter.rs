//! Row splitters producing train/test index partitions.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use gf_types::{config_error, Dataset, Fold, GfResult};

/// Produces a finite sequence of partitions over a dataset's rows.
///
/// Each call to [`split`](Splitter::split) starts over, so the same splitter
/// with the same data always yields the same partitions.
pub trait Splitter {
    /// Number of partitions a full pass yields.
    fn n_splits(&self) -> usize;

    fn split<'a>(&'a self, data: &Dataset) -> GfResult<Box<dyn Iterator<Item = Fold> + 'a>>;
}

/// K contiguous folds, each used once as the test side.
///
/// The first `n % k` folds hold one extra row. With `shuffle`, rows are
/// permuted by a generator seeded from `seed` before being cut into folds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            seed: 0,
        }
    }

    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }
}

impl Splitter for KFold {
    fn n_splits(&self) -> usize {
        self.n_splits
    }

    fn split<'a>(&'a self, data: &Dataset) -> GfResult<Box<dyn Iterator<Item = Fold> + 'a>> {
        let n = data.len();
        let k = self.n_splits;
        if k < 2 {
            return Err(config_error!("KFold needs at least 2 splits, got {k}"));
        }
        if k > n {
            return Err(config_error!("KFold cannot make {k} splits from {n} rows"));
        }

        let mut order: Vec<usize> = (0..n).collect();
        if self.shuffle {
            order.shuffle(&mut ChaCha8Rng::seed_from_u64(self.seed));
        }

        let (base, extra) = (n / k, n % k);
        let mut bounds = Vec::with_capacity(k);
        let mut start = 0;
        for fold in 0..k {
            let end = start + base + usize::from(fold < extra);
            bounds.push((start, end));
            start = end;
        }

        Ok(Box::new(bounds.into_iter().map(move |(start, end)| {
            let test = order[start..end].to_vec();
            let train = order[..start]
                .iter()
                .chain(&order[end..])
                .copied()
                .collect();
            Fold::new(train, test)
        })))
    }
}

/// Independent random train/test splits.
///
/// Each split draws a fresh permutation from one generator seeded with `seed`;
/// the first `ceil(test_fraction * n)` rows of the permutation form the test
/// side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShuffleSplit {
    pub n_splits: usize,
    pub test_fraction: f64,
    pub seed: u64,
}

impl ShuffleSplit {
    pub fn new(n_splits: usize, test_fraction: f64, seed: u64) -> Self {
        Self {
            n_splits,
            test_fraction,
            seed,
        }
    }

    /// A single train/test split.
    pub fn holdout(test_fraction: f64, seed: u64) -> Self {
        Self::new(1, test_fraction, seed)
    }
}

impl Splitter for ShuffleSplit {
    fn n_splits(&self) -> usize {
        self.n_splits
    }

    fn split<'a>(&'a self, data: &Dataset) -> GfResult<Box<dyn Iterator<Item = Fold> + 'a>> {
        let n = data.len();
        if self.n_splits == 0 {
            return Err(config_error!("ShuffleSplit needs at least 1 split"));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(config_error!(
                "test fraction must lie strictly between 0 and 1, got {}",
                self.test_fraction
            ));
        }
        let n_test = (self.test_fraction * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(config_error!(
                "test fraction {} leaves an empty side with {n} rows",
                self.test_fraction
            ));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        Ok(Box::new((0..self.n_splits).map(move |_| {
            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(&mut rng);
            let train = order.split_off(n_test);
            Fold::new(train, order)
        })))
    }
}
