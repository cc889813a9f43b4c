//! Per-generation evolution logs.
//!
//! Training backends append one headerless CSV row per generation. Only a few
//! columns are read back, and they are addressed by position:
//!
//! | col | content                      |
//! |-----|------------------------------|
//! | 0   | algorithm variant            |
//! | 1   | run id                       |
//! | 2   | dataset name                 |
//! | 3   | seed                         |
//! | 4   | generation                   |
//! | 5   | training error               |
//! | 6   | elapsed seconds              |
//! | 7   | population size metric       |
//! | 8   | held-out error               |
//! | 9   | elite structural size metric |
//!
//! Any further columns are carried by the writer and ignored by the reader.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::{DataError, GfResult};

pub const COL_ALGORITHM: usize = 0;
pub const COL_GENERATION: usize = 4;
pub const COL_TRAIN_ERROR: usize = 5;
pub const COL_HELD_OUT_ERROR: usize = 8;
pub const COL_SIZE: usize = 9;
/// Minimum number of columns a row must carry.
pub const MIN_COLUMNS: usize = COL_SIZE + 1;

/// Log file for inner fold `fold` of `dataset`: `{log_dir}/{algorithm}_{dataset}_{fold}.csv`.
pub fn fold_log_path(log_dir: &Path, algorithm: &str, dataset: &str, fold: usize) -> PathBuf {
    log_dir.join(format!("{algorithm}_{dataset}_{fold}.csv"))
}

/// One generation of one training run, tagged with the fold it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionLogRow {
    /// Position in the concatenated log.
    pub id: usize,
    pub fold: usize,
    pub algorithm: String,
    pub generation: u64,
    pub train_error: f64,
    pub held_out_error: f64,
    /// Raw size text. Kept unparsed because some variants grow past any
    /// fixed-width integer.
    pub size: String,
}

/// Evolution log rows concatenated across folds, in read order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvolutionLog {
    rows: Vec<EvolutionLogRow>,
}

impl EvolutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows whose identifiers are already assigned.
    pub fn from_rows(rows: Vec<EvolutionLogRow>) -> Self {
        Self { rows }
    }

    /// Read a single log file, tagging every row with `fold`.
    pub fn read_fold(path: &Path, fold: usize) -> GfResult<Self> {
        let mut log = Self::new();
        log.append_fold(path, fold)?;
        Ok(log)
    }

    /// Read the per-fold logs `{algorithm}_{dataset}_{i}.csv` for `i = 0, 1, ..`
    /// until the first missing file.
    pub fn read_folds(log_dir: &Path, algorithm: &str, dataset: &str) -> GfResult<Self> {
        let mut log = Self::new();
        let mut fold = 0;
        loop {
            let path = fold_log_path(log_dir, algorithm, dataset, fold);
            if !path.exists() {
                break;
            }
            log.append_fold(&path, fold)?;
            fold += 1;
        }
        tracing::info!(
            "Read {} evolution rows from {} fold logs in {}",
            log.len(),
            fold,
            log_dir.display()
        );
        Ok(log)
    }

    /// Append every row of the file at `path`, tagging it with `fold`.
    /// Identifiers continue from the current length; nothing is deduplicated.
    pub fn append_fold(&mut self, path: &Path, fold: usize) -> GfResult<usize> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let before = self.rows.len();
        for (record_num, result) in rdr.records().enumerate() {
            let record = result?;
            let row = Self::parse_record(&record, path, record_num, self.rows.len(), fold)?;
            self.rows.push(row);
        }
        let added = self.rows.len() - before;
        tracing::debug!("Fold {} contributed {} rows from {}", fold, added, path.display());
        Ok(added)
    }

    fn parse_record(
        record: &csv::StringRecord,
        path: &Path,
        record_num: usize,
        id: usize,
        fold: usize,
    ) -> GfResult<EvolutionLogRow> {
        let parse_err = |message: String| DataError::LogParse {
            path: path.display().to_string(),
            record: record_num,
            message,
        };

        if record.len() < MIN_COLUMNS {
            return Err(parse_err(format!(
                "{} columns, expected at least {}",
                record.len(),
                MIN_COLUMNS
            ))
            .into());
        }

        let field = |col: usize| record.get(col).unwrap_or("").trim();
        let float = |col: usize, what: &str| -> GfResult<f64> {
            field(col)
                .parse::<f64>()
                .map_err(|e| parse_err(format!("{what} {:?}: {e}", field(col))).into())
        };

        let generation = field(COL_GENERATION)
            .parse::<u64>()
            .map_err(|e| parse_err(format!("generation {:?}: {e}", field(COL_GENERATION))))?;

        Ok(EvolutionLogRow {
            id,
            fold,
            algorithm: field(COL_ALGORITHM).to_string(),
            generation,
            train_error: float(COL_TRAIN_ERROR, "training error")?,
            held_out_error: float(COL_HELD_OUT_ERROR, "held-out error")?,
            size: field(COL_SIZE).to_string(),
        })
    }

    pub fn rows(&self) -> &[EvolutionLogRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<EvolutionLogRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Metrics of one generation, as handed to [`EvolutionLogWriter::append`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: u64,
    pub train_error: f64,
    pub held_out_error: f64,
    pub elite_size: String,
    pub elapsed_secs: f64,
    pub population_size: String,
    pub extras: Vec<String>,
}

impl GenerationRecord {
    pub fn new(
        generation: u64,
        train_error: f64,
        held_out_error: f64,
        elite_size: impl ToString,
    ) -> Self {
        Self {
            generation,
            train_error,
            held_out_error,
            elite_size: elite_size.to_string(),
            elapsed_secs: 0.0,
            population_size: "0".to_string(),
            extras: Vec::new(),
        }
    }

    pub fn with_elapsed(mut self, secs: f64) -> Self {
        self.elapsed_secs = secs;
        self
    }

    pub fn with_population_size(mut self, size: impl ToString) -> Self {
        self.population_size = size.to_string();
        self
    }

    pub fn with_extra(mut self, value: impl ToString) -> Self {
        self.extras.push(value.to_string());
        self
    }
}

/// Appends generation rows for a single training run.
#[derive(Debug, Clone)]
pub struct EvolutionLogWriter {
    path: PathBuf,
    run_id: Uuid,
    algorithm: String,
    dataset: String,
    seed: u64,
}

impl EvolutionLogWriter {
    pub fn new(
        path: impl Into<PathBuf>,
        algorithm: impl Into<String>,
        dataset: impl Into<String>,
        seed: u64,
    ) -> Self {
        Self {
            path: path.into(),
            run_id: Uuid::new_v4(),
            algorithm: algorithm.into(),
            dataset: dataset.into(),
            seed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Append one row, creating the file if needed.
    pub fn append(&self, record: &GenerationRecord) -> GfResult<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);

        let mut fields = vec![
            self.algorithm.clone(),
            self.run_id.to_string(),
            self.dataset.clone(),
            self.seed.to_string(),
            record.generation.to_string(),
            record.train_error.to_string(),
            record.elapsed_secs.to_string(),
            record.population_size.clone(),
            record.held_out_error.to_string(),
            record.elite_size.clone(),
        ];
        fields.extend(record.extras.iter().cloned());

        wtr.write_record(&fields)?;
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GfError;
    use std::fs;

    #[test]
    fn writer_emits_positional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gp_toy_0.csv");
        let writer = EvolutionLogWriter::new(&path, "gp", "toy", 42);

        writer
            .append(&GenerationRecord::new(0, 1.5, 2.5, 31).with_extra("note"))
            .unwrap();
        writer.append(&GenerationRecord::new(1, 1.25, 2.0, 17)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let cols: Vec<&str> = lines[0].split(',').collect();
        assert_eq!(cols[COL_ALGORITHM], "gp");
        assert_eq!(cols[1], writer.run_id().to_string());
        assert_eq!(cols[2], "toy");
        assert_eq!(cols[3], "42");
        assert_eq!(cols[COL_GENERATION], "0");
        assert_eq!(cols[COL_TRAIN_ERROR], "1.5");
        assert_eq!(cols[COL_HELD_OUT_ERROR], "2.5");
        assert_eq!(cols[COL_SIZE], "31");
        assert_eq!(cols[10], "note");
    }

    #[test]
    fn read_folds_concatenates_with_running_ids() {
        let dir = tempfile::tempdir().unwrap();
        for fold in 0..2 {
            let writer = EvolutionLogWriter::new(
                fold_log_path(dir.path(), "gsgp", "toy", fold),
                "gsgp",
                "toy",
                fold as u64,
            );
            for generation in 0..3 {
                writer
                    .append(&GenerationRecord::new(
                        generation,
                        1.0,
                        1.0 + generation as f64,
                        "1180591620717411303424",
                    ))
                    .unwrap();
            }
        }
        // Fold 3 exists but fold 2 does not: reading stops at the gap.
        fs::write(fold_log_path(dir.path(), "gsgp", "toy", 3), "").unwrap();

        let log = EvolutionLog::read_folds(dir.path(), "gsgp", "toy").unwrap();
        assert_eq!(log.len(), 6);
        let ids: Vec<usize> = log.rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(log.rows()[3].fold, 1);
        assert_eq!(log.rows()[3].generation, 0);
        assert_eq!(log.rows()[5].held_out_error, 3.0);
        assert_eq!(log.rows()[0].size, "1180591620717411303424");
    }

    #[test]
    fn short_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        fs::write(&path, "gp,run,toy,1,0,1.0\n").unwrap();

        let err = EvolutionLog::new().append_fold(&path, 0).unwrap_err();
        assert!(matches!(err, GfError::Data(DataError::LogParse { record: 0, .. })));
    }

    #[test]
    fn unparsable_metric_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "gp,run,toy,1,0,abc,0,0,1.0,5\n").unwrap();

        let err = EvolutionLog::read_fold(&path, 0).unwrap_err();
        assert!(err.to_string().contains("training error"));
    }

    #[test]
    fn read_fold_tags_rows_and_allows_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gp_toy_4.csv");
        fs::write(&path, "gp,r1,toy,9,0,0.5,1.2,100,0.75,13,x,y\ngp,r1,toy,9,1,0.4,2.4,100,0.7,11\n")
            .unwrap();

        let log = EvolutionLog::read_fold(&path, 4).unwrap();
        assert_eq!(log.len(), 2);
        let rows = log.into_rows();
        assert!(rows.iter().all(|r| r.fold == 4));
        assert_eq!(rows[1].id, 1);
        assert_eq!(rows[1].train_error, 0.4);
        assert_eq!(rows[1].held_out_error, 0.7);
        assert_eq!(rows[0].size, "13");
    }
}
