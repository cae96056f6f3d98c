//! ensemble – combine per-method results from JSON files
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use ensemble_combiner::config::Config;
use ensemble_combiner::utils::init_logging;
use ensemble_combiner::{combine_forecast, combine_voting, EnsembleWeightMap, MethodResult};

#[derive(Debug, Parser)]
#[command(name = "ensemble", author, version, about = "Ensemble combiner CLI", long_about = None)]
struct Args {
    /// Path to the configuration file (TOML); defaults are used when absent
    #[arg(short, long, env = "ENSEMBLE_CONFIG")]
    config: Option<PathBuf>,

    /// Print the default configuration to stdout and exit
    #[arg(long)]
    print_default_config: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Combine anomaly labels by weighted vote
    CombineVoting {
        /// JSON array of method results ("-" reads stdin)
        #[arg(long, value_name = "JSON")]
        input: String,
        /// Path to a JSON file mapping method name to weight
        #[arg(long, value_name = "FILE")]
        weights: Option<PathBuf>,
        /// Vote share an item needs to be labelled anomalous
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Combine point forecasts by weighted average
    CombineForecast {
        /// JSON array of method results ("-" reads stdin)
        #[arg(long, value_name = "JSON")]
        input: String,
        /// Path to a JSON file mapping method name to weight
        #[arg(long, value_name = "FILE")]
        weights: Option<PathBuf>,
    },
    /// Write a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let cfg = match path {
        | Some(p) => Config::from_file(p).with_context(|| format!("loading config {}", p.display()))?,
        | None => Config::load().context("loading config")?,
    };
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

fn read_results(input: &str) -> Result<Vec<MethodResult>> {
    let text = if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading results from stdin")?;
        buf
    } else {
        fs::read_to_string(input).with_context(|| format!("reading results from {}", input))?
    };
    serde_json::from_str(&text).context("parsing method results")
}

fn read_weights(path: Option<&Path>) -> Result<Option<EnsembleWeightMap>> {
    path.map(|p| {
        let text = fs::read_to_string(p).with_context(|| format!("reading weights from {}", p.display()))?;
        serde_json::from_str(&text).context("parsing weights")
    })
    .transpose()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        println!("{}", Config::default_toml()?);
        return Ok(());
    }

    let Some(command) = args.command else {
        bail!("no command given, see --help");
    };

    if let Command::Init { config, force } = &command {
        if config.exists() && !force {
            bail!("Config file {} exists. Use --force to overwrite.", config.display());
        }
        Config::default().save(config)?;
        println!("Wrote default configuration to {}", config.display());
        return Ok(());
    }

    let cfg = load_config(args.config.as_deref())?;
    init_logging(&cfg.logging.level);

    match command {
        | Command::CombineVoting { input, weights, threshold } => {
            let results = read_results(&input)?;
            let weights = read_weights(weights.as_deref())?.or(cfg.voting.weights);
            let threshold = threshold.unwrap_or(cfg.voting.threshold);
            let combined = combine_voting(&results, weights.as_ref(), threshold)?;
            print_json(&combined)
        }
        | Command::CombineForecast { input, weights } => {
            let results = read_results(&input)?;
            let weights = read_weights(weights.as_deref())?.or(cfg.forecast.weights);
            let combined = combine_forecast(&results, weights.as_ref())?;
            print_json(&combined)
        }
        | Command::Init { .. } => Ok(()),
    }
}
