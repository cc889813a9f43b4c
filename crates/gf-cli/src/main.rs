//! # gridfold
//!
//! Command-line access to the gridfold pipeline: preview a hyperparameter grid
//! and pick robust winners from per-fold evolution logs.

use anyhow::{bail, Context};
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gf_search::{combinations, derive_max_depth, INIT_DEPTH, MAX_DEPTH};
use gf_select::{RobustSelector, SelectionCandidate, SelectionConfig};
use gf_types::{algorithm, EvolutionLog, HyperparameterGrid, ParamSet};

#[derive(Parser)]
#[command(name = "gridfold")]
#[command(about = "Nested-CV grid search tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick the most robust rows from the per-fold evolution logs
    Select {
        /// Directory holding `{algorithm}_{dataset}_{fold}.csv` logs
        #[arg(short, long)]
        log_dir: PathBuf,

        /// Dataset name used in the log file names
        #[arg(short, long)]
        dataset: String,

        /// Algorithm variant
        #[arg(
            short,
            long,
            default_value = algorithm::GP,
            value_parser = PossibleValuesParser::new(algorithm::KNOWN_ALGORITHMS)
        )]
        algorithm: String,

        /// Folds kept by median, then rows kept by overfit ratio
        #[arg(short, default_value = "10")]
        k: usize,

        /// Rows finally selected
        #[arg(short, default_value = "3")]
        n: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List every combination of a grid in enumeration order
    Grid {
        /// JSON file: a list of {"name": ..., "values": [...]} axes
        #[arg(short, long)]
        grid: PathBuf,

        /// Show the derived max_depth (init_depth + 15) for each combination
        #[arg(long)]
        set_max_depth: bool,

        /// Fixed init_depth for grids that do not vary it
        #[arg(long)]
        init_depth: Option<i64>,
    },
}

#[derive(Serialize)]
struct SelectionReport<'a> {
    config: &'a SelectionConfig,
    ids: Vec<usize>,
    rows: &'a [SelectionCandidate],
}

fn run_select(log_dir: PathBuf, dataset: String, config: SelectionConfig, json: bool) -> anyhow::Result<()> {
    let log = EvolutionLog::read_folds(&log_dir, &config.algorithm, &dataset)
        .with_context(|| format!("failed to read evolution logs from {}", log_dir.display()))?;
    if log.is_empty() {
        bail!(
            "no {}_{}_<fold>.csv logs found in {}",
            config.algorithm,
            dataset,
            log_dir.display()
        );
    }

    let selected = RobustSelector::default().select_candidates(
        log.rows(),
        &config.algorithm,
        config.k,
        config.n,
    )?;

    if json {
        let report = SelectionReport {
            config: &config,
            ids: selected.iter().map(|c| c.row.id).collect(),
            rows: &selected,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{:>6} {:>5} {:>10} {:>14} {:>14} {:>10}  size",
        "id", "fold", "generation", "train", "held-out", "ratio"
    );
    for c in &selected {
        println!(
            "{:>6} {:>5} {:>10} {:>14.6} {:>14.6} {:>10.4}  {}",
            c.row.id,
            c.row.fold,
            c.row.generation,
            c.row.train_error,
            c.row.held_out_error,
            c.overfit_ratio,
            c.row.size
        );
    }
    Ok(())
}

fn run_grid(path: PathBuf, set_max_depth: bool, init_depth: Option<i64>) -> anyhow::Result<()> {
    let text = fs::read_to_string(&path)
        .with_context(|| format!("failed to read grid file {}", path.display()))?;
    let grid: HyperparameterGrid = serde_json::from_str(&text)
        .with_context(|| format!("invalid grid in {}", path.display()))?;
    grid.validate()?;
    info!("Loaded grid with {} axes from {}", grid.len(), path.display());

    match grid.combination_count() {
        Some(count) => println!("{count} combinations"),
        None => bail!("grid has too many combinations to enumerate"),
    }
    let fixed = match init_depth {
        Some(depth) => ParamSet::new().with(INIT_DEPTH, depth),
        None => ParamSet::new(),
    };
    for (index, combo) in combinations(&grid).enumerate() {
        if set_max_depth {
            let mut full = fixed.clone();
            full.merge(&combo);
            derive_max_depth(&mut full)?;
            let max_depth = full.get(MAX_DEPTH).map(ToString::to_string).unwrap_or_default();
            println!("{index:>5}  {combo}  {MAX_DEPTH}={max_depth}");
        } else {
            println!("{index:>5}  {combo}");
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Select {
            log_dir,
            dataset,
            algorithm,
            k,
            n,
            json,
        } => {
            let config = SelectionConfig::new(algorithm).with_k(k).with_n(n);
            run_select(log_dir, dataset, config, json)
        }
        Commands::Grid {
            grid,
            set_max_depth,
            init_depth,
        } => run_grid(grid, set_max_depth, init_depth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_defaults() {
        let cli = Cli::try_parse_from(["gridfold", "select", "--log-dir", "log", "--dataset", "toy"])
            .unwrap();
        match cli.command {
            Commands::Select {
                algorithm, k, n, json, ..
            } => {
                assert_eq!(algorithm, "gp");
                assert_eq!((k, n), (10, 3));
                assert!(!json);
            }
            Commands::Grid { .. } => panic!("expected select"),
        }
    }

    #[test]
    fn grid_flags() {
        let cli = Cli::try_parse_from([
            "gridfold",
            "grid",
            "--grid",
            "grid.json",
            "--set-max-depth",
            "--init-depth",
            "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Grid {
                grid,
                set_max_depth,
                init_depth,
            } => {
                assert_eq!(grid, PathBuf::from("grid.json"));
                assert!(set_max_depth);
                assert_eq!(init_depth, Some(4));
            }
            Commands::Select { .. } => panic!("expected grid"),
        }
    }

    #[test]
    fn select_accepts_only_known_algorithms() {
        for known in algorithm::KNOWN_ALGORITHMS {
            let args = ["gridfold", "select", "-l", "log", "-d", "toy", "-a", known];
            assert!(Cli::try_parse_from(args).is_ok(), "{known} rejected");
        }
        let args = ["gridfold", "select", "-l", "log", "-d", "toy", "-a", "cart"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn select_requires_dataset() {
        assert!(Cli::try_parse_from(["gridfold", "select", "--log-dir", "log"]).is_err());
    }
}
