//! Batch calculation over many namespaces

use super::cost::CostCalculator;
use crate::models::{NamespaceRequest, NamespaceResult};
use serde::Serialize;
use tracing::info;

/// Folded totals over a batch of results
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BatchTotals {
    pub monthly: f64,
    pub annual: f64,
    pub count: usize,
    pub error_count: usize,
}

impl BatchTotals {
    fn add(mut self, result: &NamespaceResult) -> Self {
        self.monthly += result.monthly_cost;
        self.annual += result.annual_cost;
        self.count += 1;
        if result.is_error() {
            self.error_count += 1;
        }
        self
    }
}

/// Results of a batch calculation, in input order, with totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub results: Vec<NamespaceResult>,
    pub totals: BatchTotals,
    pub average_monthly: f64,
}

impl BatchSummary {
    /// Fold totals over already-computed results
    pub fn from_results(results: Vec<NamespaceResult>) -> Self {
        let totals = results.iter().fold(BatchTotals::default(), BatchTotals::add);
        let average_monthly = if totals.count > 0 {
            totals.monthly / totals.count as f64
        } else {
            0.0
        };

        Self {
            results,
            totals,
            average_monthly,
        }
    }
}

impl CostCalculator {
    /// Price every request, preserving order
    pub fn calculate_all_namespaces(&self, requests: &[NamespaceRequest]) -> BatchSummary {
        let results = requests
            .iter()
            .map(|r| self.calculate_namespace_cost(r))
            .collect();
        let summary = BatchSummary::from_results(results);

        info!(
            namespaces = summary.totals.count,
            errors = summary.totals.error_count,
            total_monthly = summary.totals.monthly,
            "Calculated batch of namespaces"
        );

        summary
    }
}
