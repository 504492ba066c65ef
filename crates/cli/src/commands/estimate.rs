//! Namespace estimate commands

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use estimator_lib::aggregation::environment_group;
use estimator_lib::{
    BatchSummary, CostCalculator, EstimateSession, GroupBy, NamespaceRequest, Quantity,
    RollupTotals, SessionEntry,
};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::input::{load_session, read_requests, OverrideSpec};
use crate::output::{
    color_size, format_cores, format_currency, print_json, print_success, print_warning,
    render_table, OutputFormat,
};

/// Namespace parameters; omitted values come from the environment defaults
#[derive(Debug, Args)]
pub struct NamespaceArgs {
    /// Namespace name
    #[arg(long, short)]
    pub namespace: String,

    /// Environment (prod, uat, sit, test, sandbox, dev)
    #[arg(long, short)]
    pub env: Option<String>,

    /// Cluster name
    #[arg(long, short)]
    pub cluster: String,

    /// Number of pods
    #[arg(long)]
    pub pods: Option<String>,

    /// CPU request per pod in millicores
    #[arg(long)]
    pub cpu_req: Option<String>,

    /// Memory request per pod in MB
    #[arg(long)]
    pub mem_req: Option<u32>,

    /// CPU limit per pod in millicores
    #[arg(long)]
    pub cpu_lim: Option<u32>,

    /// Memory limit per pod in MB
    #[arg(long)]
    pub mem_lim: Option<u32>,

    /// Autoscaler minimum replicas
    #[arg(long)]
    pub hpa_min: Option<u32>,

    /// Autoscaler maximum replicas
    #[arg(long)]
    pub hpa_max: Option<u32>,

    /// Autoscaler CPU trigger, e.g. 60%
    #[arg(long)]
    pub cpu_trigger: Option<String>,

    /// Namespace runs Istio sidecars
    #[arg(long)]
    pub istio: bool,

    /// Istio sidecar CPU request in millicores
    #[arg(long)]
    pub istio_cpu_req: Option<u32>,

    /// Istio sidecar CPU limit in millicores
    #[arg(long)]
    pub istio_cpu_lim: Option<u32>,

    /// Istio sidecar memory request in MB
    #[arg(long)]
    pub istio_mem_req: Option<u32>,

    /// Istio sidecar memory limit in MB
    #[arg(long)]
    pub istio_mem_lim: Option<u32>,

    /// Size override (S, M, L, XL)
    #[arg(long)]
    pub size: Option<String>,
}

impl NamespaceArgs {
    /// Build a request on top of the environment's defaults
    pub fn into_request(self, default_environment: &str) -> NamespaceRequest {
        let env = self.env.unwrap_or_else(|| default_environment.to_string());
        let mut request = NamespaceRequest::from_defaults(env, self.cluster, self.namespace);

        if let Some(pods) = self.pods {
            request.pod_count = Some(Quantity::Text(pods));
        }
        if let Some(cpu) = self.cpu_req {
            request.cpu_request_millicores = Some(Quantity::Text(cpu));
        }
        if let Some(trigger) = self.cpu_trigger {
            request.cpu_trigger_percent = Some(Quantity::Text(trigger));
        }
        request.memory_request_mb = self.mem_req.unwrap_or(request.memory_request_mb);
        request.cpu_limit_millicores = self.cpu_lim.unwrap_or(request.cpu_limit_millicores);
        request.memory_limit_mb = self.mem_lim.unwrap_or(request.memory_limit_mb);
        request.autoscale_min = self.hpa_min.unwrap_or(request.autoscale_min);
        request.autoscale_max = self.hpa_max.unwrap_or(request.autoscale_max);
        request.istio_enabled = self.istio;
        request.istio_cpu_request = self.istio_cpu_req.unwrap_or(request.istio_cpu_request);
        request.istio_cpu_limit = self.istio_cpu_lim.unwrap_or(request.istio_cpu_limit);
        request.istio_mem_request = self.istio_mem_req.unwrap_or(request.istio_mem_request);
        request.istio_mem_limit = self.istio_mem_lim.unwrap_or(request.istio_mem_limit);
        request.override_size = self.size;
        request
    }
}

/// Row for the per-environment namespace table
#[derive(Tabled)]
struct NamespaceRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pods")]
    pods: String,
    #[tabled(rename = "Pod Specs")]
    pod_specs: String,
    #[tabled(rename = "CPU Lim")]
    cpu_limit: String,
    #[tabled(rename = "Mem Lim")]
    memory_limit: String,
    #[tabled(rename = "HPA")]
    hpa: String,
    #[tabled(rename = "Trigger")]
    trigger: String,
    #[tabled(rename = "Istio")]
    istio: String,
    #[tabled(rename = "Total CPU")]
    total_cpu: String,
    #[tabled(rename = "Buffered")]
    buffered_cpu: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Annual")]
    annual: String,
}

impl NamespaceRow {
    fn from_entry(entry: &SessionEntry) -> Self {
        let r = &entry.result;
        let req = &r.request;
        let quantity =
            |q: &Option<Quantity>| q.as_ref().map(|v| v.to_string()).unwrap_or_default();

        let size = if r.is_error() {
            "error".red().to_string()
        } else if r.is_overridden() {
            format!("{} (calc. {})", color_size(r.recommended_size), r.computed_size)
        } else {
            color_size(r.recommended_size)
        };

        let istio = if req.istio_enabled {
            format!(
                "Y {}m/{}m {}MB/{}MB",
                req.istio_cpu_request,
                req.istio_cpu_limit,
                req.istio_mem_request,
                req.istio_mem_limit
            )
        } else {
            "N".to_string()
        };

        Self {
            id: entry.id,
            cluster: req.cluster.clone(),
            namespace: req.namespace.clone(),
            pods: quantity(&req.pod_count),
            pod_specs: format!(
                "{}m / {}MB",
                quantity(&req.cpu_request_millicores),
                req.memory_request_mb
            ),
            cpu_limit: format!("{}m", req.cpu_limit_millicores),
            memory_limit: format!("{}MB", req.memory_limit_mb),
            hpa: format!("{}-{}", req.autoscale_min, req.autoscale_max),
            trigger: quantity(&req.cpu_trigger_percent),
            istio,
            total_cpu: format_cores(r.total_cpu_cores),
            buffered_cpu: format_cores(r.buffered_cpu_cores),
            size,
            monthly: format_currency(r.monthly_cost),
            annual: format_currency(r.annual_cost),
        }
    }
}

#[derive(Serialize)]
struct EnvironmentOutput<'a> {
    environment: &'a str,
    group: Option<&'static str>,
    entry_ids: Vec<u64>,
    totals: RollupTotals,
}

#[derive(Serialize)]
struct BatchOutput<'a> {
    entries: &'a [SessionEntry],
    environments: Vec<EnvironmentOutput<'a>>,
    summary: &'a BatchSummary,
}

/// Estimate a single namespace from command-line parameters
pub fn estimate_namespace(
    calculator: CostCalculator,
    args: NamespaceArgs,
    default_environment: &str,
    format: OutputFormat,
) -> Result<()> {
    let mut session = EstimateSession::with_label(calculator, "estimate");
    let id = session.add(args.into_request(default_environment))?;
    let Some(entry) = session.get(id) else {
        anyhow::bail!("Estimate entry {} missing from session", id);
    };

    match format {
        OutputFormat::Json => print_json(entry)?,
        OutputFormat::Table => {
            let r = &entry.result;
            println!("{}", "Namespace Estimate".bold());
            println!("{}", "=".repeat(50));
            println!("Namespace:              {}", r.request.namespace.cyan());
            println!("Environment:            {}", r.request.environment);
            println!("Cluster:                {}", r.request.cluster);
            println!();

            if let Some(err) = &r.calculation_error {
                print_warning(&format!("Calculation error: {}", err));
                println!("Fallback size:          {}", color_size(r.recommended_size));
                return Ok(());
            }

            println!("Total CPU:              {} cores", format_cores(r.total_cpu_cores));
            println!("Buffered CPU:           {} cores", format_cores(r.buffered_cpu_cores));
            if r.is_overridden() {
                println!("Calculated size:        {}", color_size(r.computed_size));
            }
            println!("Recommended size:       {}", color_size(r.recommended_size));
            println!();
            println!("{}", "Costs".bold());
            println!("{}", "-".repeat(50));
            println!("Monthly:                {}", format_currency(r.monthly_cost).green());
            println!("Annual:                 {}", format_currency(r.annual_cost).green().bold());
        }
    }

    Ok(())
}

/// Price a batch file and render it grouped by environment
pub fn estimate_batch(
    calculator: CostCalculator,
    path: &Path,
    overrides: &[OverrideSpec],
    format: OutputFormat,
) -> Result<()> {
    let mut session = EstimateSession::with_label(calculator, "batch");
    load_session(&mut session, read_requests(path)?, overrides)?;

    let results = session.results();
    let groups = session.rollup(&results, GroupBy::Environment);
    let summary = session.summary();

    match format {
        OutputFormat::Json => {
            let environments = groups
                .iter()
                .map(|g| EnvironmentOutput {
                    environment: &g.key,
                    group: environment_group(&g.key),
                    entry_ids: session
                        .entries()
                        .iter()
                        .filter(|e| e.result.request.environment == g.key)
                        .map(|e| e.id)
                        .collect(),
                    totals: g.totals,
                })
                .collect();

            print_json(&BatchOutput {
                entries: session.entries(),
                environments,
                summary: &summary,
            })?;
        }
        OutputFormat::Table => {
            if session.is_empty() {
                print_warning("No namespaces to estimate");
                return Ok(());
            }

            for group in &groups {
                let label = environment_group(&group.key)
                    .map(|g| format!(" ({})", g))
                    .unwrap_or_default();
                println!(
                    "{} {}{}",
                    "Environment:".bold(),
                    group.key.to_uppercase().cyan().bold(),
                    label.dimmed()
                );

                let rows: Vec<NamespaceRow> = session
                    .entries()
                    .iter()
                    .filter(|e| e.result.request.environment == group.key)
                    .map(NamespaceRow::from_entry)
                    .collect();
                println!("{}", render_table(rows));
                println!(
                    "Subtotal: {} namespaces, {} buffered cores, {}/month, {}/year",
                    group.totals.namespace_count,
                    format_cores(group.totals.buffered_cpu_cores),
                    format_currency(group.totals.monthly_cost),
                    format_currency(group.totals.annual_cost)
                );
                println!();
            }

            println!("{}", "Totals".bold());
            println!("{}", "-".repeat(50));
            println!("Namespaces:             {}", summary.totals.count);
            if summary.totals.error_count > 0 {
                print_warning(&format!(
                    "{} namespace(s) could not be priced and show zero cost",
                    summary.totals.error_count
                ));
            }
            println!("Monthly:                {}", format_currency(summary.totals.monthly).green());
            println!("Annual:                 {}", format_currency(summary.totals.annual).green().bold());
            println!("Average per namespace:  {}", format_currency(summary.average_monthly));

            if summary.totals.error_count == 0 {
                print_success("All namespaces priced");
            }
        }
    }

    Ok(())
}
