//! Pricing table and environment defaults commands

use anyhow::{bail, Result};
use colored::Colorize;
use estimator_lib::defaults::KNOWN_ENVIRONMENTS;
use estimator_lib::{EnvironmentDefaults, PricingTable};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{
    color_size, format_cores, format_currency, print_json, render_table, OutputFormat,
};

/// Row for pricing tiers table
#[derive(Tabled)]
struct TierRow {
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "CPU Capacity")]
    capacity: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Annual")]
    annual: String,
}

/// Row for defaults table
#[derive(Tabled)]
struct DefaultRow {
    #[tabled(rename = "Setting")]
    setting: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Serialize)]
struct DefaultsOutput<'a> {
    environment: &'a str,
    group: Option<&'static str>,
    defaults: EnvironmentDefaults,
}

/// Show the pricing tiers
pub fn show_tiers(pricing: &PricingTable, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&pricing.size_options())?,
        OutputFormat::Table => {
            println!("{}", "Pricing Tiers".bold());
            let rows: Vec<TierRow> = pricing
                .tiers()
                .iter()
                .map(|t| TierRow {
                    size: color_size(t.name),
                    capacity: format!("{} cores", format_cores(t.cpu_capacity)),
                    monthly: format_currency(t.monthly_price),
                    annual: format_currency(t.monthly_price * 12.0),
                })
                .collect();
            println!("{}", render_table(rows));
            println!(
                "Node estimate assumes {} cores per node.",
                format_cores(pricing.cpu_per_node())
            );
        }
    }

    Ok(())
}

/// Show the form defaults for an environment
pub fn show_defaults(environment: &str, format: OutputFormat) -> Result<()> {
    let Some(defaults) = EnvironmentDefaults::for_environment(environment) else {
        bail!(
            "No defaults for environment '{}' (known: {})",
            environment,
            KNOWN_ENVIRONMENTS.join(", ")
        );
    };
    let group = estimator_lib::aggregation::environment_group(environment);

    match format {
        OutputFormat::Json => print_json(&DefaultsOutput {
            environment,
            group,
            defaults,
        })?,
        OutputFormat::Table => {
            println!(
                "{} {} {}",
                "Defaults for".bold(),
                environment.cyan(),
                group.map(|g| format!("({})", g)).unwrap_or_default().dimmed()
            );
            let rows: Vec<DefaultRow> = [
                ("Pods", defaults.pod_count.to_string()),
                ("CPU Request", format!("{}m", defaults.cpu_request_millicores)),
                ("Memory Request", format!("{}MB", defaults.memory_request_mb)),
                ("CPU Limit", format!("{}m", defaults.cpu_limit_millicores)),
                ("Memory Limit", format!("{}MB", defaults.memory_limit_mb)),
                ("HPA Min", defaults.autoscale_min.to_string()),
                ("HPA Max", defaults.autoscale_max.to_string()),
                ("CPU Trigger", defaults.cpu_trigger_percent.to_string()),
                ("Istio CPU Request", format!("{}m", defaults.istio_cpu_request)),
                ("Istio CPU Limit", format!("{}m", defaults.istio_cpu_limit)),
                ("Istio Memory Request", format!("{}MB", defaults.istio_mem_request)),
                ("Istio Memory Limit", format!("{}MB", defaults.istio_mem_limit)),
            ]
            .into_iter()
            .map(|(setting, value)| DefaultRow { setting, value })
            .collect();
            println!("{}", render_table(rows));
        }
    }

    Ok(())
}
