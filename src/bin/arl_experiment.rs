use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spc_arl::experiment::{report, run_ewma, run_shewhart, ExperimentConfig};
use tracing_subscriber::EnvFilter;

/// Monte-Carlo average run length experiments for Shewhart and EWMA charts.
#[derive(Parser, Debug)]
#[command(name = "arl-experiment", version, about)]
struct Cli {
    #[command(subcommand)]
    chart: Chart,

    /// JSON configuration file; omitted fields keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Trials per parameter combination
    #[arg(long, global = true)]
    trials: Option<usize>,

    /// Observations per trial
    #[arg(long, global = true)]
    sample_size: Option<usize>,

    /// Base random seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print results as JSON instead of a text table
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Chart {
    /// Shewhart chart: empirical vs theoretical ARL
    Shewhart,
    /// EWMA chart over the (L, lambda) grid
    Ewma,
    /// Both experiments
    All,
}

/// Logs go to stderr so result tables on stdout stay clean.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<ExperimentConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            ExperimentConfig::from_json(&json)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ExperimentConfig::default(),
    };
    if let Some(trials) = cli.trials {
        config.trials = trials;
    }
    if let Some(sample_size) = cli.sample_size {
        config.sample_size = sample_size;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);
    let config = load_config(&cli)?;

    if matches!(cli.chart, Chart::Shewhart | Chart::All) {
        tracing::info!("running Shewhart experiment");
        let rows = run_shewhart(&config.shewhart()?)?;
        if cli.json {
            println!("{}", report::to_json(&rows)?);
        } else {
            print!("{}", report::shewhart_table(&rows));
        }
    }

    if matches!(cli.chart, Chart::Ewma | Chart::All) {
        tracing::info!("running EWMA experiment");
        let rows = run_ewma(&config.ewma()?)?;
        if cli.json {
            println!("{}", report::to_json(&rows)?);
        } else {
            print!("{}", report::ewma_table(&rows));
        }
    }

    Ok(())
}
