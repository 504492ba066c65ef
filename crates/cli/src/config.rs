//! Configuration management for the CLI

use anyhow::{Context, Result};
use estimator_lib::{PricingTable, ReportMetadata, SizeTier};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Environment used when neither a flag nor the config names one
pub const FALLBACK_ENVIRONMENT: &str = "dev";

/// CLI configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Default output format
    #[serde(default)]
    pub default_format: Option<OutputFormat>,
    /// Default environment for `estimate`
    #[serde(default)]
    pub default_environment: Option<String>,
    /// Custom pricing tiers replacing the standard table
    #[serde(default)]
    pub pricing: Option<Vec<SizeTier>>,
    /// Cluster settings and tags for `finalize`
    #[serde(default)]
    pub report: ReportMetadata,
}

impl Config {
    /// Load configuration from the config file and `KCE_*` environment variables.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        let config = config::Config::builder()
            .add_source(
                config::File::from(path.clone())
                    .format(config::FileFormat::Json)
                    .required(override_path.is_some()),
            )
            .add_source(config::Environment::with_prefix("KCE"))
            .build()
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Pricing table from configuration, or the standard table
    pub fn pricing_table(&self) -> Result<PricingTable> {
        match &self.pricing {
            Some(tiers) => {
                PricingTable::new(tiers.clone()).context("Invalid pricing table in configuration")
            }
            None => Ok(PricingTable::standard()),
        }
    }

    pub fn environment(&self) -> &str {
        self.default_environment
            .as_deref()
            .unwrap_or(FALLBACK_ENVIRONMENT)
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("kce").join("config.json"))
    }
}
