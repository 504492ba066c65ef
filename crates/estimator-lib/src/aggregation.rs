//! Environment and cluster rollups
//!
//! Groups keep each namespace's own sizing decision: CPU sums use the
//! members' buffered CPU and cost sums use the members' computed costs,
//! rather than re-pricing the group as a whole.

use crate::models::NamespaceResult;
use crate::pricing::PricingTable;
use serde::Serialize;

/// Grouping key for a rollup view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Primary results table
    Environment,
    /// Finalize summary
    Cluster,
}

impl GroupBy {
    fn key<'a>(&self, result: &'a NamespaceResult) -> &'a str {
        match self {
            GroupBy::Environment => &result.request.environment,
            GroupBy::Cluster => &result.request.cluster,
        }
    }
}

/// Sums over a set of namespace results
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RollupTotals {
    pub namespace_count: usize,
    pub buffered_cpu_cores: f64,
    pub node_count: u64,
    pub monthly_cost: f64,
    pub annual_cost: f64,
}

/// One group of results sharing an environment or cluster
#[derive(Debug, Clone, Serialize)]
pub struct GroupRollup<'a> {
    pub key: String,
    pub members: Vec<&'a NamespaceResult>,
    pub totals: RollupTotals,
}

/// Nodes needed for `buffered_cpu` cores, one largest-tier slot per node
pub fn estimate_nodes(buffered_cpu: f64, cpu_per_node: f64) -> u64 {
    if !buffered_cpu.is_finite() || buffered_cpu <= 0.0 || cpu_per_node <= 0.0 {
        return 0;
    }
    (buffered_cpu / cpu_per_node).ceil() as u64
}

fn totals_for<'a, I>(members: I, pricing: &PricingTable) -> RollupTotals
where
    I: IntoIterator<Item = &'a NamespaceResult>,
{
    let mut totals = members
        .into_iter()
        .fold(RollupTotals::default(), |mut acc, r| {
            acc.namespace_count += 1;
            acc.buffered_cpu_cores += r.buffered_cpu_cores;
            acc.monthly_cost += r.monthly_cost;
            acc.annual_cost += r.annual_cost;
            acc
        });
    totals.node_count = estimate_nodes(totals.buffered_cpu_cores, pricing.cpu_per_node());
    totals
}

/// Group results by `group_by`, in order of first appearance
pub fn rollup<'a>(
    results: &'a [NamespaceResult],
    group_by: GroupBy,
    pricing: &PricingTable,
) -> Vec<GroupRollup<'a>> {
    let mut groups: Vec<GroupRollup<'a>> = Vec::new();

    for result in results {
        let key = group_by.key(result);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.members.push(result),
            None => groups.push(GroupRollup {
                key: key.to_string(),
                members: vec![result],
                totals: RollupTotals::default(),
            }),
        }
    }

    for group in &mut groups {
        group.totals = totals_for(group.members.iter().copied(), pricing);
    }

    groups
}

/// Totals across every result, for the summary total row
pub fn grand_total(results: &[NamespaceResult], pricing: &PricingTable) -> RollupTotals {
    totals_for(results, pricing)
}

/// Environment group label shown next to an environment name
pub fn environment_group(environment: &str) -> Option<&'static str> {
    match environment.trim().to_ascii_lowercase().as_str() {
        "uat" | "sit" | "dev" | "sandbox" | "test" | "nonprod" => Some("Non-Prod"),
        "preprod" => Some("Pre-Prod"),
        "prod" | "production" => Some("Prod"),
        _ => None,
    }
}
