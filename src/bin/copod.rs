//! copod - batch outlier scoring from the command line
//!
//! Usage:
//!   copod fit --input train.csv --headers --contamination 0.05 --save model.bin
//!   copod score --checkpoint model.bin --input new.csv
//!   copod explain --input train.json --index 12 --cutoffs 0.9,0.99

use clap::{Parser, Subcommand, ValueEnum};
use copod::{Copod, Decision, DetectorConfig, Matrix, Result};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "copod")]
#[command(about = "Copula-based outlier detection on numeric tables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct TableArgs {
    /// CSV or JSON (array of arrays) table
    #[arg(short, long)]
    input: PathBuf,

    /// First CSV line is a header
    #[arg(long)]
    headers: bool,
}

#[derive(clap::Args)]
struct DetectorArgs {
    /// JSON detector configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expected outlier fraction, overrides the config
    #[arg(short, long)]
    contamination: Option<f64>,

    /// Evaluate feature columns in parallel
    #[arg(long)]
    parallel: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit on a table and print its scores and labels
    Fit {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        detector: DetectorArgs,

        /// Write a checkpoint of the fitted detector
        #[arg(long)]
        save: Option<PathBuf>,

        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Score new rows against a saved fit
    Score {
        /// Checkpoint written by `fit --save`
        #[arg(long)]
        checkpoint: PathBuf,

        #[command(flatten)]
        table: TableArgs,

        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Fit on a table and print the dimensional breakdown of one row
    Explain {
        #[command(flatten)]
        table: TableArgs,

        #[command(flatten)]
        detector: DetectorArgs,

        /// Zero-based row index
        #[arg(long)]
        index: usize,

        /// Two quantile bands, e.g. 0.9,0.99
        #[arg(long, value_delimiter = ',', num_args = 2)]
        cutoffs: Option<Vec<f64>>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Serialize)]
struct ScoreReport<'a> {
    threshold: f64,
    scores: &'a [f64],
    labels: &'a [u8],
}

fn build_detector(args: &DetectorArgs) -> Result<Copod> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_path(path)?,
        None => DetectorConfig::default(),
    };
    if let Some(c) = args.contamination {
        config = config.with_contamination(c);
    }
    if args.parallel {
        config = config.with_parallel(true);
    }
    Copod::from_config(&config)
}

fn load(table: &TableArgs) -> Result<Matrix> {
    let matrix = copod::io::read_path(&table.input, table.headers)?;
    info!(
        path = %table.input.display(),
        rows = matrix.rows(),
        cols = matrix.cols(),
        "loaded table"
    );
    Ok(matrix)
}

fn print_decision(decision: &Decision, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let report = ScoreReport {
                threshold: decision.threshold,
                scores: &decision.scores,
                labels: &decision.labels,
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("failed to encode report: {}", e),
            }
        }
        OutputFormat::Table => {
            println!("{:<8} | {:>12} | {:<7}", "Row", "Score", "Label");
            println!("{}", "-".repeat(34));
            for (i, (score, label)) in decision.scores.iter().zip(&decision.labels).enumerate() {
                let label = if *label == 1 { "outlier" } else { "inlier" };
                println!("{:<8} | {:>12.6} | {:<7}", i, score, label);
            }
            println!("{}", "-".repeat(34));
            println!(
                "threshold {:.6}, {} of {} rows flagged",
                decision.threshold,
                decision.outlier_count(),
                decision.scores.len()
            );
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Fit {
            table,
            detector,
            save,
            format,
        } => {
            let mut copod = build_detector(&detector)?;
            copod.fit(&load(&table)?)?;
            print_decision(&copod.last_decision(), format);

            if let Some(path) = save {
                std::fs::write(&path, copod.checkpoint()?)?;
                info!(path = %path.display(), "checkpoint written");
            }
        }
        Commands::Score {
            checkpoint,
            table,
            format,
        } => {
            let bytes = std::fs::read(&checkpoint)?;
            let mut copod = Copod::restore(&bytes)?;
            copod.score(&load(&table)?)?;
            print_decision(&copod.last_decision(), format);
        }
        Commands::Explain {
            table,
            detector,
            index,
            cutoffs,
        } => {
            let mut copod = build_detector(&detector)?;
            copod.fit(&load(&table)?)?;
            let cutoffs = cutoffs.map(|c| [c[0], c[1]]);
            print!("{}", copod.explain(index, cutoffs)?);
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
