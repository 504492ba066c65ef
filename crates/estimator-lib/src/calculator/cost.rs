//! Per-namespace cost calculation

use crate::models::{NamespaceRequest, NamespaceResult, Quantity};
use crate::pricing::{PricingTable, TierName};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Safety margin applied to raw CPU demand (30%)
pub const BUFFER_MULTIPLIER: f64 = 1.3;

/// Millicores in one CPU core
pub const MILLICORES_PER_CORE: f64 = 1000.0;

/// Reasons a namespace could not be priced
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalculationError {
    #[error("Missing required fields: pod_count and cpu_request_millicores")]
    MissingFields,

    #[error("Invalid numeric value for {field}: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Invalid CPU calculation result: {0}")]
    InvalidCpuTotal(f64),

    #[error("No monthly price for size {0}")]
    MissingPrice(TierName),
}

/// Total CPU demand in cores for `pod_count` pods at `cpu_request_millicores` each.
///
/// Non-finite, zero or negative inputs degrade to zero demand rather than
/// failing, which makes tier selection pick the smallest tier.
pub fn compute_total_cpu(pod_count: f64, cpu_request_millicores: f64) -> f64 {
    if !pod_count.is_finite() || !cpu_request_millicores.is_finite() {
        warn!(
            pod_count = pod_count,
            cpu_request_millicores = cpu_request_millicores,
            "Non-finite input to CPU calculation, using zero demand"
        );
        return 0.0;
    }

    if pod_count <= 0.0 || cpu_request_millicores <= 0.0 {
        debug!(
            pod_count = pod_count,
            cpu_request_millicores = cpu_request_millicores,
            "Zero or negative input to CPU calculation, using zero demand"
        );
        return 0.0;
    }

    pod_count * cpu_request_millicores / MILLICORES_PER_CORE
}

/// Buffered CPU requirement: `ceil(cpu_cores * 1.3)`.
///
/// Invalid input maps to zero and is reported as a warning.
pub fn apply_buffer(cpu_cores: f64) -> f64 {
    if !cpu_cores.is_finite() || cpu_cores < 0.0 {
        warn!(cpu_cores = cpu_cores, "Invalid CPU value for buffer, using 0");
        return 0.0;
    }

    (cpu_cores * BUFFER_MULTIPLIER).ceil()
}

/// Round to whole cents (2 decimal places)
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Stateless namespace cost calculator bound to a pricing table
#[derive(Debug, Clone, Default)]
pub struct CostCalculator {
    pricing: PricingTable,
}

impl CostCalculator {
    pub fn new(pricing: PricingTable) -> Self {
        Self { pricing }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Price a single namespace.
    ///
    /// Never fails: any problem with the request is reported through
    /// `calculation_error` on a result with zeroed costs and the fallback
    /// tier, carrying the request fields unchanged.
    pub fn calculate_namespace_cost(&self, request: &NamespaceRequest) -> NamespaceResult {
        match self.try_calculate(request) {
            Ok(result) => result,
            Err(e) => {
                error!(
                    namespace = %request.namespace,
                    cluster = %request.cluster,
                    error = %e,
                    "Namespace cost calculation failed"
                );
                self.error_result(request, &e)
            }
        }
    }

    fn try_calculate(&self, request: &NamespaceRequest) -> Result<NamespaceResult, CalculationError> {
        let (pods_raw, cpu_raw) = match (&request.pod_count, &request.cpu_request_millicores) {
            (Some(pods), Some(cpu)) => (pods, cpu),
            _ => return Err(CalculationError::MissingFields),
        };

        let pods = coerce_field("pod_count", pods_raw)?;
        let cpu_request = coerce_field("cpu_request_millicores", cpu_raw)?;

        let total_cpu = compute_total_cpu(pods, cpu_request);
        if !total_cpu.is_finite() || total_cpu < 0.0 {
            return Err(CalculationError::InvalidCpuTotal(total_cpu));
        }

        let buffered_cpu = apply_buffer(total_cpu);
        let computed = self.pricing.select_tier(buffered_cpu);
        let recommended = self.resolve_override(request, computed);

        let monthly_price = self
            .pricing
            .get(recommended)
            .ok_or(CalculationError::MissingPrice(recommended))?
            .monthly_price;
        let monthly_cost = round_cents(monthly_price);

        debug!(
            namespace = %request.namespace,
            pods = pods,
            cpu_request_millicores = cpu_request,
            total_cpu_cores = total_cpu,
            buffered_cpu_cores = buffered_cpu,
            computed_size = %computed,
            recommended_size = %recommended,
            monthly_cost = monthly_cost,
            "Calculated namespace cost"
        );

        Ok(NamespaceResult {
            request: request.clone(),
            total_cpu_cores: round_cents(total_cpu),
            buffered_cpu_cores: buffered_cpu,
            computed_size: computed,
            recommended_size: recommended,
            effective_size: recommended,
            monthly_cost,
            annual_cost: round_cents(monthly_cost * 12.0),
            calculation_error: None,
        })
    }

    /// Whether the request names an override this table does not have
    pub fn has_unknown_override(&self, request: &NamespaceRequest) -> bool {
        requested_override(request).is_some_and(|name| self.pricing.lookup(name).is_none())
    }

    /// Recommended size: a valid override, otherwise the computed tier
    fn resolve_override(&self, request: &NamespaceRequest, computed: TierName) -> TierName {
        let Some(name) = requested_override(request) else {
            return computed;
        };

        match self.pricing.lookup(name) {
            Some(tier) => tier.name,
            None => {
                warn!(
                    namespace = %request.namespace,
                    override_size = %name,
                    fallback = %computed,
                    "Unknown override size, using computed size"
                );
                computed
            }
        }
    }

    fn error_result(&self, request: &NamespaceRequest, err: &CalculationError) -> NamespaceResult {
        let fallback = self.pricing.default_tier().name;
        NamespaceResult {
            request: request.clone(),
            total_cpu_cores: 0.0,
            buffered_cpu_cores: 0.0,
            computed_size: fallback,
            recommended_size: fallback,
            effective_size: fallback,
            monthly_cost: 0.0,
            annual_cost: 0.0,
            calculation_error: Some(err.to_string()),
        }
    }
}

/// Non-blank override name, if any
fn requested_override(request: &NamespaceRequest) -> Option<&str> {
    request
        .override_size
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn coerce_field(field: &'static str, raw: &Quantity) -> Result<f64, CalculationError> {
    raw.coerce().ok_or_else(|| CalculationError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}
