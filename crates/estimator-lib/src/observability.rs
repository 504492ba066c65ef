//! Observability infrastructure for the cost estimator
//!
//! Provides:
//! - Prometheus metrics (calculations, errors, override fallbacks, tier selections)
//! - Structured logging of session actions with tracing

use crate::models::NamespaceResult;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<EstimatorMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct EstimatorMetricsInner {
    calculations: IntCounter,
    calculation_errors: IntCounter,
    override_fallbacks: IntCounter,
    tier_selections: IntCounterVec,
    session_namespaces: IntGauge,
}

impl EstimatorMetricsInner {
    fn new() -> Self {
        Self {
            calculations: register_int_counter!(
                "cost_estimator_calculations_total",
                "Total number of namespace cost calculations"
            )
            .expect("Failed to register calculations_total"),

            calculation_errors: register_int_counter!(
                "cost_estimator_calculation_errors_total",
                "Total number of calculations that produced an error result"
            )
            .expect("Failed to register calculation_errors_total"),

            override_fallbacks: register_int_counter!(
                "cost_estimator_override_fallbacks_total",
                "Total number of unknown size overrides replaced by the recommendation"
            )
            .expect("Failed to register override_fallbacks_total"),

            tier_selections: register_int_counter_vec!(
                "cost_estimator_tier_selections_total",
                "Effective size tier of each priced namespace",
                &["tier"]
            )
            .expect("Failed to register tier_selections_total"),

            session_namespaces: register_int_gauge!(
                "cost_estimator_session_namespaces",
                "Number of namespaces in the current estimate session"
            )
            .expect("Failed to register session_namespaces"),
        }
    }
}

/// Estimator metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct EstimatorMetrics {
    _private: (),
}

impl Default for EstimatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EstimatorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EstimatorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record one priced namespace
    pub fn record_result(&self, result: &NamespaceResult, override_fell_back: bool) {
        let inner = self.inner();
        inner.calculations.inc();
        if result.is_error() {
            inner.calculation_errors.inc();
        } else {
            inner
                .tier_selections
                .with_label_values(&[result.effective_size.as_str()])
                .inc();
        }
        if override_fell_back {
            inner.override_fallbacks.inc();
        }
    }

    pub fn set_session_namespaces(&self, count: usize) {
        self.inner().session_namespaces.set(count as i64);
    }

    pub fn calculations_total(&self) -> u64 {
        self.inner().calculations.get()
    }

    pub fn calculation_errors_total(&self) -> u64 {
        self.inner().calculation_errors.get()
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Structured logger for session events
#[derive(Clone)]
pub struct StructuredLogger {
    session: String,
}

impl StructuredLogger {
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
        }
    }

    /// Log a namespace being added to the session
    pub fn log_namespace_added(&self, id: u64, result: &NamespaceResult) {
        match &result.calculation_error {
            None => info!(
                event = "namespace_added",
                session = %self.session,
                id = id,
                environment = %result.request.environment,
                cluster = %result.request.cluster,
                namespace = %result.request.namespace,
                total_cpu_cores = result.total_cpu_cores,
                buffered_cpu_cores = result.buffered_cpu_cores,
                computed_size = %result.computed_size,
                recommended_size = %result.recommended_size,
                monthly_cost = result.monthly_cost,
                "Namespace added to estimate"
            ),
            Some(err) => self.log_calculation_error(id, result, err),
        }
    }

    /// Log a calculation that produced an error result
    pub fn log_calculation_error(&self, id: u64, result: &NamespaceResult, err: &str) {
        error!(
            event = "calculation_error",
            session = %self.session,
            id = id,
            namespace = %result.request.namespace,
            cluster = %result.request.cluster,
            error = %err,
            fallback_size = %result.recommended_size,
            "Namespace kept with zero cost after calculation error"
        );
    }

    /// Log a size override being applied
    pub fn log_size_override(
        &self,
        id: u64,
        requested: &str,
        result: &NamespaceResult,
        fell_back: bool,
    ) {
        if !fell_back {
            info!(
                event = "size_overridden",
                session = %self.session,
                id = id,
                namespace = %result.request.namespace,
                computed_size = %result.computed_size,
                recommended_size = %result.recommended_size,
                monthly_cost = result.monthly_cost,
                "Size override applied"
            );
        } else {
            warn!(
                event = "size_overridden",
                session = %self.session,
                id = id,
                namespace = %result.request.namespace,
                requested_size = %requested,
                recommended_size = %result.recommended_size,
                "Unknown size override, computed size kept"
            );
        }
    }

    /// Log the session being cleared
    pub fn log_reset(&self, cleared: usize) {
        info!(
            event = "session_reset",
            session = %self.session,
            cleared = cleared,
            "Estimate session reset"
        );
    }

    /// Log the session being finalized into a summary
    pub fn log_finalized(&self, clusters: usize, namespaces: usize, total_monthly: f64) {
        info!(
            event = "session_finalized",
            session = %self.session,
            clusters = clusters,
            namespaces = namespaces,
            total_monthly = total_monthly,
            "Estimate finalized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::CostCalculator;
    use crate::models::NamespaceRequest;

    #[test]
    fn test_metrics_record_results() {
        // Global registry: other tests may record too, so compare deltas
        let metrics = EstimatorMetrics::new();
        let calc = CostCalculator::default();

        let before = metrics.calculations_total();
        let errors_before = metrics.calculation_errors_total();

        let ok = calc.calculate_namespace_cost(&NamespaceRequest::new(3u32, 100u32));
        let bad = calc.calculate_namespace_cost(&NamespaceRequest::default());
        metrics.record_result(&ok, false);
        metrics.record_result(&bad, false);
        metrics.set_session_namespaces(2);

        assert!(metrics.calculations_total() >= before + 2);
        assert!(metrics.calculation_errors_total() >= errors_before + 1);

        let text = metrics.render().unwrap();
        assert!(text.contains("cost_estimator_calculations_total"));
        assert!(text.contains("cost_estimator_tier_selections_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-session");
        assert_eq!(logger.session, "test-session");
    }
}
