use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use evolver::{RunConfig, config::DatasetSpec, pipeline};
use log::info;

#[derive(Parser)]
#[command(name = "evolver")]
#[command(about = "Fits a digits classifier and evolves its weights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the classifier, evolve it and report both
    Run {
        /// JSON run configuration, defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// optdigits CSV file, overrides the configured dataset
        #[arg(long)]
        data: Option<PathBuf>,
        /// Where to write the JSON report
        #[arg(long)]
        report: Option<PathBuf>,
        /// Where to write the per generation fitness CSV
        #[arg(long)]
        history: Option<PathBuf>,
        /// Seed for the splits, the classifier and the evolution
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Fit and score the classifier only
    Fit {
        /// JSON run configuration, defaults are used when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// optdigits CSV file, overrides the configured dataset
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Print the default configuration
    Config,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            report,
            history,
            seed,
        } => {
            let mut config = load_config(config, data)?;
            if let Some(seed) = seed {
                config.seed_all(seed);
            }
            if report.is_some() {
                config.report.json = report;
            }
            if history.is_some() {
                config.report.history_csv = history;
            }

            let report = pipeline::run(&config).context("run failed")?;

            if let Some(path) = &config.report.json {
                report
                    .write_json(path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("wrote report to {}", path.display());
            }
            if let Some(path) = &config.report.history_csv {
                report
                    .write_history_csv(path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("wrote fitness history to {}", path.display());
            }

            println!(
                "baseline test accuracy: {:.4}\nevolved test accuracy:  {:.4}\n{} after {} generations ({} evaluations)",
                report.baseline.test_accuracy,
                report.evolved.test_accuracy,
                report.termination,
                report.history.len().saturating_sub(1),
                report.evaluations,
            );
        }
        Commands::Fit { config, data } => {
            let config = load_config(config, data)?;
            let report = pipeline::fit_only(&config).context("fit failed")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&RunConfig::default())?);
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>, data: Option<PathBuf>) -> Result<RunConfig> {
    let mut config = match path {
        Some(path) => RunConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RunConfig::default(),
    };

    if let Some(path) = data {
        config.dataset = DatasetSpec::Digits { path };
    }

    Ok(config)
}
