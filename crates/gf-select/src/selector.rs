//! Robust top-N selection over concatenated evolution logs.
//!
//! Three filters run in order:
//!
//! 1. **Fold robustness**: keep the `k` folds with the lowest median held-out
//!    error (ties go to the lower fold id).
//! 2. **Overfitting**: among their rows, keep the `k` with the lowest
//!    held-out / training error ratio.
//! 3. **Structure**: among those, keep the `n` smallest by size, compared with
//!    the variant's [`SizeOrdering`](crate::SizeOrdering).
//!
//! The same `k` bounds both the fold count and the row count.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use gf_types::{config_error, empty_data, DataError, EvolutionLog, EvolutionLogRow, GfResult};

use crate::config::SelectionConfig;
use crate::size::SizeOrderingRegistry;

/// A log row that survived into the overfitting stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionCandidate {
    pub row: EvolutionLogRow,
    /// `held_out_error / train_error`
    pub overfit_ratio: f64,
}

impl SelectionCandidate {
    /// Fails when the training error is not strictly positive.
    pub fn new(row: EvolutionLogRow) -> GfResult<Self> {
        if !(row.train_error > 0.0) {
            return Err(DataError::NonPositiveTrainError {
                row: row.id,
                train_error: row.train_error,
            }
            .into());
        }
        let overfit_ratio = row.held_out_error / row.train_error;
        Ok(Self { row, overfit_ratio })
    }
}

/// Median of the non-NaN values; even counts average the two middle values.
fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Median held-out error per fold, ascending by fold id. A fold whose
/// errors are all NaN gets a NaN median.
pub fn fold_medians(rows: &[EvolutionLogRow]) -> Vec<(usize, f64)> {
    let mut by_fold: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for row in rows {
        by_fold.entry(row.fold).or_default().push(row.held_out_error);
    }
    by_fold
        .into_iter()
        .map(|(fold, errors)| (fold, median(&errors)))
        .collect()
}

/// Three-stage robust selector.
#[derive(Debug, Default)]
pub struct RobustSelector {
    sizes: SizeOrderingRegistry,
}

impl RobustSelector {
    pub fn new(sizes: SizeOrderingRegistry) -> Self {
        Self { sizes }
    }

    pub fn sizes(&self) -> &SizeOrderingRegistry {
        &self.sizes
    }

    /// Run all three stages and return the selected rows, ascending by id.
    pub fn select_candidates(
        &self,
        rows: &[EvolutionLogRow],
        algorithm: &str,
        k: usize,
        n: usize,
    ) -> GfResult<Vec<SelectionCandidate>> {
        let ordering = self.sizes.get(algorithm)?;
        if k == 0 || n == 0 {
            return Err(config_error!("k and n must be positive (k = {k}, n = {n})"));
        }
        if rows.is_empty() {
            return Err(empty_data!("no evolution log rows to select from"));
        }

        // Stage 1: fold robustness. Folds without a finite median cannot be
        // ranked. Stable sort keeps fold-id order on ties.
        let (mut medians, unranked): (Vec<_>, Vec<_>) =
            fold_medians(rows).into_iter().partition(|(_, m)| m.is_finite());
        if !unranked.is_empty() {
            debug!("Dropping folds without a finite median: {:?}", unranked);
        }
        if medians.is_empty() {
            return Err(empty_data!("no fold has a finite median held-out error"));
        }
        medians.sort_by(|a, b| a.1.total_cmp(&b.1));
        let kept_folds: HashSet<usize> = medians.iter().take(k).map(|(fold, _)| *fold).collect();
        debug!("Fold medians {:?}; keeping {:?}", medians, kept_folds);

        // Stage 2: overfitting.
        let mut candidates = rows
            .iter()
            .filter(|r| kept_folds.contains(&r.fold))
            .cloned()
            .map(SelectionCandidate::new)
            .collect::<GfResult<Vec<_>>>()?;
        candidates.sort_by(|a, b| a.overfit_ratio.total_cmp(&b.overfit_ratio));
        candidates.truncate(k);

        // Stage 3: structural size.
        let mut selected = ordering.smallest(candidates, n)?;
        selected.sort_by_key(|c| c.row.id);

        info!(
            "Selected {} of {} rows for {} (k = {}, n = {}, {} size ordering)",
            selected.len(),
            rows.len(),
            algorithm,
            k,
            n,
            ordering.name()
        );
        Ok(selected)
    }

    /// Identifiers of the selected rows, ascending.
    pub fn select_top_n(
        &self,
        rows: &[EvolutionLogRow],
        algorithm: &str,
        k: usize,
        n: usize,
    ) -> GfResult<Vec<usize>> {
        Ok(self
            .select_candidates(rows, algorithm, k, n)?
            .into_iter()
            .map(|c| c.row.id)
            .collect())
    }

    /// [`select_top_n`](Self::select_top_n) over a whole log with settings
    /// taken from `config`.
    pub fn select(&self, log: &EvolutionLog, config: &SelectionConfig) -> GfResult<Vec<usize>> {
        self.select_top_n(log.rows(), &config.algorithm, config.k, config.n)
    }
}

/// Select with the default size orderings.
pub fn select_top_n(
    rows: &[EvolutionLogRow],
    algorithm: &str,
    k: usize,
    n: usize,
) -> GfResult<Vec<usize>> {
    RobustSelector::default().select_top_n(rows, algorithm, k, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::{NativeSize, SizeOrdering};
    use gf_types::GfError;

    fn row(id: usize, fold: usize, train: f64, held_out: f64, size: &str) -> EvolutionLogRow {
        EvolutionLogRow {
            id,
            fold,
            algorithm: "gp".into(),
            generation: id as u64,
            train_error: train,
            held_out_error: held_out,
            size: size.into(),
        }
    }

    #[test]
    fn median_handles_even_and_odd_counts() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn lowest_median_fold_survives_stage_one() {
        // Fold 0 median 0.5, fold 1 median 0.9. Fold 1 has the best single
        // overfit ratio, but must not survive with k = 1.
        let rows = vec![
            row(0, 0, 1.0, 0.4, "10"),
            row(1, 0, 1.0, 0.5, "10"),
            row(2, 0, 1.0, 0.6, "10"),
            row(3, 1, 100.0, 0.8, "1"),
            row(4, 1, 1.0, 0.9, "1"),
            row(5, 1, 1.0, 1.0, "1"),
        ];
        assert_eq!(fold_medians(&rows), vec![(0, 0.5), (1, 0.9)]);

        let ids = select_top_n(&rows, "gp", 1, 1).unwrap();
        assert_eq!(ids, vec![0]);
    }

    #[test]
    fn k_bounds_both_folds_and_rows() {
        let mut rows = Vec::new();
        for fold in 0..3 {
            for i in 0..4 {
                let id = fold * 4 + i;
                rows.push(row(id, fold, 1.0, 0.1 * (fold + 1) as f64 + 0.01 * i as f64, "5"));
            }
        }
        // k = 2 keeps folds 0 and 1 (8 rows), then only 2 rows by ratio.
        let picked = RobustSelector::default()
            .select_candidates(&rows, "gp", 2, 5)
            .unwrap();
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.iter().map(|c| c.row.id).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn single_winner_despite_ties() {
        let rows: Vec<EvolutionLogRow> = (0..9).map(|id| row(id, id % 3, 2.0, 2.0, "4")).collect();
        assert_eq!(select_top_n(&rows, "gp", 1, 1).unwrap(), vec![0]);
        assert_eq!(select_top_n(&rows, "gsgp", 1, 1).unwrap(), vec![0]);

        let one = vec![row(17, 4, 1.0, 3.0, "8")];
        assert_eq!(select_top_n(&one, "slim", 1, 1).unwrap(), vec![17]);
    }

    #[test]
    fn fold_median_ties_go_to_lower_fold_id() {
        let rows = vec![
            row(0, 2, 1.0, 0.5, "1"),
            row(1, 1, 1.0, 0.5, "1"),
        ];
        assert_eq!(select_top_n(&rows, "gp", 1, 1).unwrap(), vec![1]);
    }

    #[test]
    fn output_is_sorted_by_identifier() {
        // Size ranking is 4, 2, 0 but the result is in id order.
        let rows = vec![
            row(0, 0, 1.0, 1.0, "30"),
            row(1, 0, 1.0, 1.0, "40"),
            row(2, 0, 1.0, 1.0, "20"),
            row(3, 0, 1.0, 1.0, "50"),
            row(4, 0, 1.0, 1.0, "10"),
        ];
        assert_eq!(select_top_n(&rows, "gp", 5, 3).unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn unbounded_sizes_use_exact_comparison() {
        let rows = vec![
            row(0, 0, 1.0, 1.0, "1180591620717411303425"),
            row(1, 0, 1.0, 1.0, "1180591620717411303424"),
        ];
        assert_eq!(select_top_n(&rows, "gsgp", 2, 1).unwrap(), vec![1]);
    }

    #[test]
    fn non_positive_training_error_is_data_error() {
        let rows = vec![row(0, 0, 1.0, 1.0, "3"), row(1, 0, 0.0, 1.0, "3")];
        let err = select_top_n(&rows, "gp", 2, 1).unwrap_err();
        assert!(matches!(
            err,
            GfError::Data(DataError::NonPositiveTrainError { row: 1, .. })
        ));

        let negative = vec![row(0, 0, -0.5, 1.0, "3")];
        assert!(select_top_n(&negative, "gp", 1, 1).is_err());
    }

    #[test]
    fn rows_in_discarded_folds_are_not_checked() {
        // Fold 1 has a zero training error but never reaches stage two.
        let rows = vec![row(0, 0, 1.0, 0.1, "3"), row(1, 1, 0.0, 5.0, "3")];
        assert_eq!(select_top_n(&rows, "gp", 1, 1).unwrap(), vec![0]);
    }

    #[test]
    fn invalid_arguments() {
        let rows = vec![row(0, 0, 1.0, 1.0, "3")];
        assert!(matches!(
            select_top_n(&rows, "cart", 1, 1).unwrap_err(),
            GfError::Config(_)
        ));
        assert!(matches!(
            select_top_n(&rows, "gp", 0, 1).unwrap_err(),
            GfError::Config(_)
        ));
        assert!(matches!(
            select_top_n(&[], "gp", 1, 1).unwrap_err(),
            GfError::Data(DataError::Empty { .. })
        ));
    }

    #[test]
    fn custom_registry_adds_variants() {
        let sizes = SizeOrderingRegistry::new().with("cart", NativeSize);
        let selector = RobustSelector::new(sizes);
        assert_eq!(selector.sizes().get("cart").unwrap().name(), "native");

        let rows = vec![row(0, 0, 1.0, 1.0, "3"), row(1, 0, 1.0, 1.0, "2")];
        assert_eq!(selector.select_top_n(&rows, "cart", 2, 1).unwrap(), vec![1]);
        assert!(selector.select_top_n(&rows, "gp", 2, 1).is_err());
    }

    #[test]
    fn select_reads_settings_from_config() {
        let log = EvolutionLog::from_rows(vec![
            row(0, 0, 1.0, 2.0, "9"),
            row(1, 0, 1.0, 1.0, "9"),
        ]);
        let config = SelectionConfig::new("gp").with_k(1).with_n(1);
        assert_eq!(RobustSelector::default().select(&log, &config).unwrap(), vec![1]);
    }

    #[test]
    fn selects_from_fold_logs_on_disk() {
        use gf_types::{fold_log_path, EvolutionLogWriter, GenerationRecord};

        let dir = tempfile::tempdir().unwrap();
        let folds = [
            // (train, held-out, size) per generation
            [(1.0, 0.5, "12"), (1.0, 0.6, "10"), (1.0, 0.7, "9")],
            [(4.0, 2.0, "8"), (4.0, 2.1, "7"), (4.0, 2.2, "6")],
        ];
        for (fold, generations) in folds.iter().enumerate() {
            let path = fold_log_path(dir.path(), "gsgp", "toy", fold);
            let writer = EvolutionLogWriter::new(path, "gsgp", "toy", fold as u64);
            for (generation, (train, held_out, size)) in generations.iter().enumerate() {
                writer
                    .append(&GenerationRecord::new(generation as u64, *train, *held_out, size))
                    .unwrap();
            }
        }

        let log = EvolutionLog::read_folds(dir.path(), "gsgp", "toy").unwrap();
        assert_eq!(log.len(), 6);

        // Both folds survive; ids 0 and 3 tie on ratio 0.5, and 3 is smaller.
        let config = SelectionConfig::new("gsgp").with_k(2).with_n(1);
        assert_eq!(RobustSelector::default().select(&log, &config).unwrap(), vec![3]);

        // With one fold only the first log competes.
        let config = SelectionConfig::new("gsgp").with_k(1).with_n(1);
        assert_eq!(RobustSelector::default().select(&log, &config).unwrap(), vec![0]);
    }

    #[test]
    fn folds_without_finite_median_are_never_kept() {
        let rows = vec![
            row(0, 0, 1.0, -f64::NAN, "1"),
            row(1, 0, 1.0, -f64::NAN, "1"),
            row(2, 1, 1.0, f64::NEG_INFINITY, "1"),
            row(3, 2, 1.0, 0.75, "5"),
            row(4, 2, 1.0, 0.25, "5"),
        ];
        let medians = fold_medians(&rows);
        assert!(medians[0].1.is_nan());
        assert_eq!(medians[2], (2, 0.5));

        assert_eq!(select_top_n(&rows, "gp", 1, 1).unwrap(), vec![4]);

        let hopeless = vec![row(0, 0, 1.0, f64::NAN, "1")];
        assert!(matches!(
            select_top_n(&hopeless, "gp", 1, 1).unwrap_err(),
            GfError::Data(DataError::Empty { .. })
        ));
    }

    #[test]
    fn nan_values_are_skipped_inside_a_fold() {
        let rows = vec![
            row(0, 0, 1.0, -f64::NAN, "1"),
            row(1, 0, 1.0, 0.75, "1"),
            row(2, 1, 1.0, 0.25, "1"),
            row(3, 1, 1.0, 0.75, "1"),
        ];
        // Fold 0 median is 0.75 (NaN ignored), fold 1 median is 0.5.
        assert_eq!(fold_medians(&rows), vec![(0, 0.75), (1, 0.5)]);
        assert_eq!(select_top_n(&rows, "gp", 1, 1).unwrap(), vec![2]);
    }
}
