//! Namespace Cost Estimator CLI
//!
//! A command-line tool for sizing Kubernetes namespaces into T-shirt
//! pricing tiers and summarizing their monthly and annual cost.

mod commands;
mod config;
mod input;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{estimate, finalize, tiers};
use estimator_lib::{CostCalculator, EstimatorMetrics};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::input::OverrideSpec;
use crate::output::{print_error, LogFormat, OutputFormat};

/// Kubernetes Namespace Cost Estimator CLI
#[derive(Parser)]
#[command(name = "kce")]
#[command(author, version, about = "Kubernetes Namespace Cost Estimator", long_about = None)]
pub struct Cli {
    /// Path to config file (defaults to ~/.config/kce/config.json)
    #[arg(long, env = "KCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (overrides the configured default)
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Print Prometheus metrics to stderr after the command
    #[arg(long)]
    pub emit_metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the pricing tiers
    Tiers,

    /// Show form defaults for an environment
    Defaults {
        /// Environment name (prod, uat, sit, test, sandbox, dev)
        environment: String,
    },

    /// Estimate a single namespace
    Estimate(estimate::NamespaceArgs),

    /// Estimate every namespace in a JSON file, grouped by environment
    Batch {
        /// JSON file holding an array of namespaces
        file: PathBuf,

        /// Size override for an entry, as ID=SIZE (repeatable)
        #[arg(long = "override", short = 'o')]
        overrides: Vec<OverrideSpec>,
    },

    /// Summarize a JSON file of namespaces by cluster with node estimates
    Finalize {
        /// JSON file holding an array of namespaces
        file: PathBuf,

        /// Size override for an entry, as ID=SIZE (repeatable)
        #[arg(long = "override", short = 'o')]
        overrides: Vec<OverrideSpec>,
    },
}

fn init_tracing(verbose: bool, log_format: LogFormat) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    match log_format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load(cli.config.as_deref())?;
    let format = cli.format.or(config.default_format).unwrap_or_default();
    let calculator = CostCalculator::new(config.pricing_table()?);
    debug!(?format, environment = %config.environment(), "Configuration loaded");

    match cli.command {
        Commands::Tiers => tiers::show_tiers(calculator.pricing(), format)?,
        Commands::Defaults { environment } => tiers::show_defaults(&environment, format)?,
        Commands::Estimate(args) => {
            estimate::estimate_namespace(calculator, args, config.environment(), format)?
        }
        Commands::Batch { file, overrides } => {
            estimate::estimate_batch(calculator, &file, &overrides, format)?
        }
        Commands::Finalize { file, overrides } => {
            finalize::finalize_batch(calculator, &file, &overrides, config.report, format)?
        }
    }

    if cli.emit_metrics {
        eprintln!("{}", EstimatorMetrics::new().render()?);
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    if let Err(e) = run(cli) {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
