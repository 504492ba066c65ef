//! In-memory estimate session
//!
//! The session is the only mutable state in the estimator. It owns the ordered
//! list of priced namespaces and is changed by three discrete actions: add,
//! override and reset. The calculator it wraps stays stateless.

use crate::aggregation::{self, GroupBy, GroupRollup, RollupTotals};
use crate::calculator::{BatchSummary, CostCalculator};
use crate::models::{NamespaceRequest, NamespaceResult};
use crate::observability::{EstimatorMetrics, StructuredLogger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kubernetes version printed on the finalized summary
pub const DEFAULT_EKS_VERSION: &str = "v1.32";

/// Pod disruption budget policy printed on the finalized summary
pub const DEFAULT_PDB_POLICY: &str = "minUnavailable = 1";

/// Shown in place of a tag that was left blank
pub const NOT_SPECIFIED: &str = "Not specified";

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Environment is required")]
    MissingEnvironment,

    #[error("Cluster is required")]
    MissingCluster,

    #[error("Namespace is required")]
    MissingNamespace,

    #[error("Autoscale minimum {min} cannot be greater than maximum {max}")]
    InvalidAutoscaleRange { min: u32, max: u32 },

    #[error("No namespace entry with id {0}")]
    UnknownEntry(u64),

    #[error("No namespaces added yet")]
    Empty,
}

impl SessionError {
    /// Whether `add` refused the request itself
    pub fn is_rejected_request(&self) -> bool {
        matches!(
            self,
            SessionError::MissingEnvironment
                | SessionError::MissingCluster
                | SessionError::MissingNamespace
                | SessionError::InvalidAutoscaleRange { .. }
        )
    }
}

/// Ownership tags attached to a finalized estimate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectTags {
    pub tribe: Option<String>,
    pub squad: Option<String>,
    pub approver: Option<String>,
    pub platform: Option<String>,
    pub product_owner: Option<String>,
    pub system_owner: Option<String>,
    pub sr_tag: Option<String>,
    pub description: Option<String>,
}

impl ProjectTags {
    /// Labelled tag values, blank ones shown as "Not specified"
    pub fn labelled(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Tribe", shown(&self.tribe)),
            ("Squad", shown(&self.squad)),
            ("Approver", shown(&self.approver)),
            ("Platform", shown(&self.platform)),
            ("Product Owner", shown(&self.product_owner)),
            ("System Owner", shown(&self.system_owner)),
            ("SR", shown(&self.sr_tag)),
            ("Description", shown(&self.description)),
        ]
    }
}

fn shown(value: &Option<String>) -> &str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_SPECIFIED)
}

/// Cluster settings and tags printed alongside the cost summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportMetadata {
    pub eks_version: String,
    pub pdb_policy: String,
    pub tags: ProjectTags,
}

impl Default for ReportMetadata {
    fn default() -> Self {
        Self {
            eks_version: DEFAULT_EKS_VERSION.to_string(),
            pdb_policy: DEFAULT_PDB_POLICY.to_string(),
            tags: ProjectTags::default(),
        }
    }
}

/// A priced namespace with its session identifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEntry {
    pub id: u64,
    #[serde(flatten)]
    pub result: NamespaceResult,
}

/// Per-cluster line of the finalized summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub cluster: String,
    pub namespaces: Vec<String>,
    pub totals: RollupTotals,
}

/// Finalized cost summary grouped by cluster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizeReport {
    pub generated_at: DateTime<Utc>,
    pub clusters: Vec<ClusterSummary>,
    pub total: RollupTotals,
    pub error_count: usize,
    pub metadata: ReportMetadata,
}

/// Ordered collection of priced namespaces
pub struct EstimateSession {
    calculator: CostCalculator,
    entries: Vec<SessionEntry>,
    next_id: u64,
    metrics: EstimatorMetrics,
    logger: StructuredLogger,
    metadata: ReportMetadata,
}

impl EstimateSession {
    pub fn new(calculator: CostCalculator) -> Self {
        Self::with_label(calculator, "default")
    }

    /// Session whose log events carry `label`
    pub fn with_label(calculator: CostCalculator, label: impl Into<String>) -> Self {
        Self {
            calculator,
            entries: Vec::new(),
            next_id: 1,
            metrics: EstimatorMetrics::new(),
            logger: StructuredLogger::new(label),
            metadata: ReportMetadata::default(),
        }
    }

    /// Attach cluster settings and tags to the finalized report
    pub fn with_metadata(mut self, metadata: ReportMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn calculator(&self) -> &CostCalculator {
        &self.calculator
    }

    /// Price a form snapshot and append it, returning its id.
    ///
    /// Environment, cluster and namespace must be non-blank and the
    /// autoscale range must not be inverted; a refused request adds nothing.
    pub fn add(&mut self, request: NamespaceRequest) -> Result<u64, SessionError> {
        validate(&request)?;

        let fell_back = self.calculator.has_unknown_override(&request);
        let result = self.calculator.calculate_namespace_cost(&request);
        let id = self.next_id;
        self.next_id += 1;

        self.metrics.record_result(&result, fell_back);
        self.logger.log_namespace_added(id, &result);
        self.entries.push(SessionEntry { id, result });
        self.metrics.set_session_namespaces(self.entries.len());

        Ok(id)
    }

    /// Re-price entry `id` with a new size override, keeping its id and position
    pub fn override_size(&mut self, id: u64, size: &str) -> Result<&SessionEntry, SessionError> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(SessionError::UnknownEntry(id))?;

        let mut request = self.entries[idx].result.request.clone();
        request.override_size = Some(size.to_string());

        let fell_back = self.calculator.has_unknown_override(&request);
        let result = self.calculator.calculate_namespace_cost(&request);
        self.metrics.record_result(&result, fell_back);
        self.logger.log_size_override(id, size, &result, fell_back);

        self.entries[idx].result = result;
        Ok(&self.entries[idx])
    }

    /// Drop every entry. Ids keep increasing across resets.
    pub fn reset(&mut self) {
        let cleared = self.entries.len();
        self.entries.clear();
        self.metrics.set_session_namespaces(0);
        self.logger.log_reset(cleared);
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn get(&self, id: u64) -> Option<&SessionEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the results in insertion order
    pub fn results(&self) -> Vec<NamespaceResult> {
        self.entries.iter().map(|e| e.result.clone()).collect()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_results(self.results())
    }

    pub fn rollup<'a>(
        &self,
        results: &'a [NamespaceResult],
        group_by: GroupBy,
    ) -> Vec<GroupRollup<'a>> {
        aggregation::rollup(results, group_by, self.calculator.pricing())
    }

    /// Cluster summary with node estimates and the grand total
    pub fn finalize(&self) -> Result<FinalizeReport, SessionError> {
        if self.entries.is_empty() {
            return Err(SessionError::Empty);
        }

        let results = self.results();
        let pricing = self.calculator.pricing();
        let clusters: Vec<ClusterSummary> = aggregation::rollup(&results, GroupBy::Cluster, pricing)
            .into_iter()
            .map(|group| ClusterSummary {
                cluster: group.key,
                namespaces: group
                    .members
                    .iter()
                    .map(|r| r.request.namespace.clone())
                    .collect(),
                totals: group.totals,
            })
            .collect();
        let total = aggregation::grand_total(&results, pricing);
        let error_count = results.iter().filter(|r| r.is_error()).count();

        self.logger
            .log_finalized(clusters.len(), total.namespace_count, total.monthly_cost);

        Ok(FinalizeReport {
            generated_at: Utc::now(),
            clusters,
            total,
            error_count,
            metadata: self.metadata.clone(),
        })
    }
}

fn validate(request: &NamespaceRequest) -> Result<(), SessionError> {
    if request.environment.trim().is_empty() {
        return Err(SessionError::MissingEnvironment);
    }
    if request.cluster.trim().is_empty() {
        return Err(SessionError::MissingCluster);
    }
    if request.namespace.trim().is_empty() {
        return Err(SessionError::MissingNamespace);
    }
    if request.autoscale_min > request.autoscale_max {
        return Err(SessionError::InvalidAutoscaleRange {
            min: request.autoscale_min,
            max: request.autoscale_max,
        });
    }
    Ok(())
}

impl Default for EstimateSession {
    fn default() -> Self {
        Self::new(CostCalculator::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Quantity;
    use crate::pricing::TierName;

    fn request(env: &str, cluster: &str, ns: &str, pods: u32, cpu: u32) -> NamespaceRequest {
        NamespaceRequest::new(pods, cpu).with_location(env, cluster, ns)
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let mut session = EstimateSession::default();
        let first = session.add(request("prod", "eks-a", "orders", 3, 100)).unwrap();
        let second = session.add(request("dev", "eks-a", "search", 10, 6400)).unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(session.len(), 2);
        assert_eq!(session.entries()[1].result.recommended_size, TierName::XL);
    }

    #[test]
    fn test_add_requires_location() {
        let mut session = EstimateSession::default();
        let cases = [
            (request(" ", "eks-a", "orders", 3, 100), SessionError::MissingEnvironment),
            (request("prod", "", "orders", 3, 100), SessionError::MissingCluster),
            (request("prod", "eks-a", "", 3, 100), SessionError::MissingNamespace),
        ];
        for (req, expected) in cases {
            let err = session.add(req).unwrap_err();
            assert!(err.is_rejected_request());
            assert_eq!(err, expected);
        }
        assert!(session.is_empty());

        // Ids are only consumed by accepted requests
        assert_eq!(session.add(request("prod", "eks-a", "orders", 3, 100)).unwrap(), 1);
    }

    #[test]
    fn test_add_rejects_inverted_autoscale_range() {
        let mut session = EstimateSession::default();
        let mut req = request("prod", "eks-a", "orders", 3, 100);
        req.autoscale_min = 10;
        req.autoscale_max = 3;

        let err = session.add(req.clone()).unwrap_err();
        assert_eq!(err, SessionError::InvalidAutoscaleRange { min: 10, max: 3 });
        assert!(session.is_empty());

        req.autoscale_max = 10;
        assert!(session.add(req).is_ok());
    }

    #[test]
    fn test_error_results_are_kept() {
        let mut session = EstimateSession::default();
        let bad = NamespaceRequest {
            environment: "dev".to_string(),
            cluster: "eks-a".to_string(),
            namespace: "broken".to_string(),
            pod_count: Some(Quantity::from("abc")),
            cpu_request_millicores: Some(Quantity::Number(100.0)),
            ..Default::default()
        };
        let id = session.add(bad).unwrap();

        let entry = session.get(id).unwrap();
        assert!(entry.result.is_error());
        assert_eq!(entry.result.monthly_cost, 0.0);
        assert_eq!(session.summary().totals.error_count, 1);
    }

    #[test]
    fn test_override_recomputes_in_place() {
        let mut session = EstimateSession::default();
        session.add(request("prod", "eks-a", "orders", 3, 100)).unwrap();
        let id = session.add(request("prod", "eks-a", "search", 3, 100)).unwrap();

        let entry = session.override_size(id, "L").unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.result.computed_size, TierName::S);
        assert_eq!(entry.result.recommended_size, TierName::L);
        assert_eq!(entry.result.effective_size, TierName::L);
        assert!((entry.result.monthly_cost - 1102.56).abs() < 0.005);

        // Position and id unchanged
        assert_eq!(session.entries()[1].id, id);
        assert_eq!(session.entries()[1].result.request.namespace, "search");
    }

    #[test]
    fn test_unknown_override_keeps_recommendation() {
        let mut session = EstimateSession::default();
        let id = session.add(request("prod", "eks-a", "orders", 3, 100)).unwrap();

        let entry = session.override_size(id, "XXL").unwrap();
        assert_eq!(entry.result.recommended_size, TierName::S);
        assert_eq!(entry.result.effective_size, TierName::S);
        assert!(entry.result.calculation_error.is_none());
    }

    #[test]
    fn test_override_unknown_entry() {
        let mut session = EstimateSession::default();
        assert_eq!(
            session.override_size(42, "M").unwrap_err(),
            SessionError::UnknownEntry(42)
        );
    }

    #[test]
    fn test_reset_clears_entries() {
        let mut session = EstimateSession::default();
        session.add(request("prod", "eks-a", "orders", 3, 100)).unwrap();
        session.reset();

        assert!(session.is_empty());
        assert_eq!(session.finalize().unwrap_err(), SessionError::Empty);

        let id = session.add(request("prod", "eks-a", "orders", 3, 100)).unwrap();
        assert_eq!(id, 2);
    }

    #[test]
    fn test_finalize_groups_by_cluster() {
        let mut session = EstimateSession::default();
        session.add(request("prod", "eks-a", "orders", 3, 100)).unwrap();
        session.add(request("prod", "eks-b", "batch", 10, 6400)).unwrap();
        session.add(request("dev", "eks-a", "search", 20, 1000)).unwrap();

        let report = session.finalize().unwrap();
        assert_eq!(report.clusters.len(), 2);
        assert_eq!(report.clusters[0].cluster, "eks-a");
        assert_eq!(report.clusters[0].namespaces, vec!["orders", "search"]);
        assert_eq!(report.clusters[0].totals.buffered_cpu_cores, 27.0);
        assert_eq!(report.clusters[1].totals.node_count, 2);
        assert_eq!(report.total.namespace_count, 3);
        assert_eq!(report.error_count, 0);
        assert!((report.total.monthly_cost - (413.46 + 2205.12 + 1102.56)).abs() < 0.005);
        assert_eq!(report.metadata.eks_version, DEFAULT_EKS_VERSION);
        assert_eq!(report.metadata.pdb_policy, DEFAULT_PDB_POLICY);
    }

    #[test]
    fn test_finalize_carries_metadata() {
        let metadata = ReportMetadata {
            eks_version: "v1.33".to_string(),
            tags: ProjectTags {
                squad: Some("payments".to_string()),
                approver: Some("  ".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = EstimateSession::default().with_metadata(metadata);
        session.add(request("prod", "eks-a", "orders", 3, 100)).unwrap();

        let report = session.finalize().unwrap();
        assert_eq!(report.metadata.eks_version, "v1.33");
        assert_eq!(report.metadata.pdb_policy, DEFAULT_PDB_POLICY);

        let tags = report.metadata.tags.labelled();
        assert_eq!(tags.len(), 8);
        assert_eq!(tags[0], ("Tribe", NOT_SPECIFIED));
        assert_eq!(tags[1], ("Squad", "payments"));
        assert_eq!(tags[2], ("Approver", NOT_SPECIFIED));
    }

    #[test]
    fn test_rollup_by_environment() {
        let mut session = EstimateSession::default();
        session.add(request("prod", "eks-a", "orders", 3, 100)).unwrap();
        session.add(request("dev", "eks-a", "search", 20, 1000)).unwrap();

        let results = session.results();
        let groups = session.rollup(&results, GroupBy::Environment);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].key, "dev");
    }
}
