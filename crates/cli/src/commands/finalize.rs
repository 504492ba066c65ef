//! Finalized cost summary command

use anyhow::Result;
use colored::Colorize;
use estimator_lib::{CostCalculator, EstimateSession, ReportMetadata};
use std::path::Path;
use tabled::Tabled;

use crate::input::{load_session, read_requests, OverrideSpec};
use crate::output::{
    format_cores, format_currency, print_info, print_json, print_warning, render_table,
    OutputFormat,
};

/// Row for the per-cluster summary table
#[derive(Tabled)]
struct ClusterRow {
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "PDB")]
    pdb: String,
    #[tabled(rename = "EKS")]
    eks: String,
    #[tabled(rename = "Namespaces")]
    namespaces: usize,
    #[tabled(rename = "Buffered CPU")]
    buffered_cpu: String,
    #[tabled(rename = "Nodes")]
    nodes: u64,
    #[tabled(rename = "Monthly")]
    monthly: String,
    #[tabled(rename = "Annual")]
    annual: String,
}

/// Price a batch file and show the cluster summary with node estimates
pub fn finalize_batch(
    calculator: CostCalculator,
    path: &Path,
    overrides: &[OverrideSpec],
    metadata: ReportMetadata,
    format: OutputFormat,
) -> Result<()> {
    let cpu_per_node = calculator.pricing().cpu_per_node();
    let mut session = EstimateSession::with_label(calculator, "finalize").with_metadata(metadata);
    load_session(&mut session, read_requests(path)?, overrides)?;

    let report = session.finalize()?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!(
                "{} {}",
                "Cost Summary -".bold(),
                format!("{}/year", format_currency(report.total.annual_cost))
                    .green()
                    .bold()
            );
            println!("{}", "=".repeat(50));

            let mut rows: Vec<ClusterRow> = report
                .clusters
                .iter()
                .map(|c| ClusterRow {
                    cluster: c.cluster.clone(),
                    pdb: report.metadata.pdb_policy.clone(),
                    eks: report.metadata.eks_version.clone(),
                    namespaces: c.totals.namespace_count,
                    buffered_cpu: format!("{:.1}", c.totals.buffered_cpu_cores),
                    nodes: c.totals.node_count,
                    monthly: format_currency(c.totals.monthly_cost),
                    annual: format_currency(c.totals.annual_cost),
                })
                .collect();
            rows.push(ClusterRow {
                cluster: "Total".bold().to_string(),
                pdb: String::new(),
                eks: String::new(),
                namespaces: report.total.namespace_count,
                buffered_cpu: format!("{:.1}", report.total.buffered_cpu_cores),
                nodes: report.total.node_count,
                monthly: format_currency(report.total.monthly_cost),
                annual: format_currency(report.total.annual_cost),
            });
            println!("{}", render_table(rows));

            println!("{}", "Tags".bold());
            println!("{}", "-".repeat(50));
            for (label, value) in report.metadata.tags.labelled() {
                println!("{:<15} {}", format!("{}:", label), value);
            }
            println!();

            if report.error_count > 0 {
                print_warning(&format!(
                    "{} namespace(s) could not be priced and are counted at zero cost",
                    report.error_count
                ));
            }
            print_info(&format!(
                "Node estimate assumes {} cores per node",
                format_cores(cpu_per_node)
            ));
            println!(
                "Generated: {}",
                report
                    .generated_at
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string()
                    .dimmed()
            );
        }
    }

    Ok(())
}
