//! ACAML command line: train on a CSV (or the built-in flower sample) under a
//! time budget and interpretability preference, then print the held-out
//! score, the best model and its feature attributions.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use ac_data::{samples, CsvLoader};
use ac_engine::{Pipeline, PipelineConfig, RunReport};
use ac_types::{Constraint, ConstraintBounds, ExplanationOutcome};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "acaml")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Adaptive constraint-aware AutoML", long_about = None)]
struct Args {
    /// CSV dataset with a header row (default: built-in flower sample)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Target column name
    #[arg(short, long, default_value = "target")]
    target: String,

    /// Training time budget in seconds (clamped to 10..=300)
    #[arg(long)]
    time_budget: Option<u64>,

    /// Restrict the search to interpretable linear models
    #[arg(long, conflicts_with = "no_interpretable")]
    interpretable: bool,

    /// Allow the full model catalog
    #[arg(long)]
    no_interpretable: bool,

    /// JSON pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the feature attribution step
    #[arg(long)]
    no_explain: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let dataset = match &args.input {
        Some(path) => CsvLoader::new()
            .load_csv_file(path)
            .with_context(|| format!("Failed to load dataset from {}", path.display()))?,
        None => {
            info!("No input given; using the built-in flower sample");
            samples::flowers(config.seed).context("Failed to build sample dataset")?
        }
    };

    let constraint = read_constraint(&args)?;
    info!(
        "Constraint: {:?} budget, interpretable = {}",
        constraint.time_budget(),
        constraint.interpretable()
    );

    let pipeline = Pipeline::with_defaults(config).context("Invalid pipeline configuration")?;
    let report = pipeline
        .execute(&dataset, &args.target, &constraint, !args.no_explain)
        .context("Training failed")?;

    print_report(&report);
    Ok(())
}

/// Flags win; otherwise prompt on a terminal, otherwise use defaults.
fn read_constraint(args: &Args) -> Result<Constraint> {
    let bounds = ConstraintBounds::default();
    let interactive = io::stdin().is_terminal();

    let budget = match args.time_budget {
        Some(secs) => bounds.clamp(secs),
        None if interactive => {
            let answer = prompt("How much time (in seconds) can we train the model? ")?;
            match answer.trim().parse::<u64>() {
                Ok(secs) => bounds.clamp(secs),
                Err(_) => bounds.default_budget(),
            }
        }
        None => bounds.default_budget(),
    };

    let interpretable = if args.interpretable {
        true
    } else if args.no_interpretable || !interactive {
        false
    } else {
        let answer = prompt("Do you prefer simple, interpretable models? (yes/no): ")?;
        answer.trim().eq_ignore_ascii_case("yes")
    };

    Ok(Constraint::new(budget, interpretable)?)
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn print_report(report: &RunReport) {
    println!("Task type: {}", report.task_type);
    println!("{}: {:.2}%", report.metric.label(), report.score * 100.0);
    println!("Best model: {}", report.best_model);

    match &report.explanation {
        Some(ExplanationOutcome::Available(explanation)) => {
            println!();
            println!("Feature importance (mean |attribution|):");
            let width = explanation
                .attributions
                .iter()
                .map(|a| a.feature.len())
                .max()
                .unwrap_or(0);
            for (feature, importance) in explanation.ranked() {
                println!("  {feature:<width$}  {importance:.4}");
            }
        }
        Some(ExplanationOutcome::Unavailable(unavailable)) => {
            println!();
            println!("Could not generate explanation: {}", unavailable.reason);
        }
        None => {}
    }
}
