//! Per-environment form defaults
//!
//! Production gets three replicas and a wide autoscaling range; every other
//! environment shares the smaller non-prod profile.

use crate::models::{NamespaceRequest, Quantity};
use serde::Serialize;

/// Default resource parameters for an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnvironmentDefaults {
    pub pod_count: u32,
    pub cpu_request_millicores: u32,
    pub memory_request_mb: u32,
    pub cpu_limit_millicores: u32,
    pub memory_limit_mb: u32,
    pub autoscale_min: u32,
    pub autoscale_max: u32,
    pub cpu_trigger_percent: &'static str,
    pub istio_cpu_request: u32,
    pub istio_cpu_limit: u32,
    pub istio_mem_request: u32,
    pub istio_mem_limit: u32,
}

pub const PROD_DEFAULTS: EnvironmentDefaults = EnvironmentDefaults {
    pod_count: 3,
    cpu_request_millicores: 100,
    memory_request_mb: 2000,
    cpu_limit_millicores: 1000,
    memory_limit_mb: 2000,
    autoscale_min: 3,
    autoscale_max: 64,
    cpu_trigger_percent: "60%",
    istio_cpu_request: 250,
    istio_cpu_limit: 1000,
    istio_mem_request: 1000,
    istio_mem_limit: 2000,
};

pub const NONPROD_DEFAULTS: EnvironmentDefaults = EnvironmentDefaults {
    pod_count: 1,
    cpu_request_millicores: 100,
    memory_request_mb: 1000,
    cpu_limit_millicores: 1000,
    memory_limit_mb: 1000,
    autoscale_min: 1,
    autoscale_max: 3,
    cpu_trigger_percent: "40%",
    istio_cpu_request: 250,
    istio_cpu_limit: 1000,
    istio_mem_request: 1000,
    istio_mem_limit: 1000,
};

/// Environments with a defaults profile
pub const KNOWN_ENVIRONMENTS: [&str; 7] = ["prod", "nonprod", "uat", "sit", "test", "sandbox", "dev"];

impl EnvironmentDefaults {
    /// Defaults for a named environment, `None` when the name is unknown
    pub fn for_environment(environment: &str) -> Option<Self> {
        match environment.trim().to_ascii_lowercase().as_str() {
            "prod" => Some(PROD_DEFAULTS),
            "nonprod" | "uat" | "sit" | "test" | "sandbox" | "dev" => Some(NONPROD_DEFAULTS),
            _ => None,
        }
    }
}

impl NamespaceRequest {
    /// Request pre-filled from an environment's defaults.
    ///
    /// Unknown environments fall back to the non-prod profile.
    pub fn from_defaults(
        environment: impl Into<String>,
        cluster: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        let environment = environment.into();
        let d = EnvironmentDefaults::for_environment(&environment).unwrap_or(NONPROD_DEFAULTS);

        Self {
            environment,
            cluster: cluster.into(),
            namespace: namespace.into(),
            pod_count: Some(Quantity::from(d.pod_count)),
            cpu_request_millicores: Some(Quantity::from(d.cpu_request_millicores)),
            memory_request_mb: d.memory_request_mb,
            cpu_limit_millicores: d.cpu_limit_millicores,
            memory_limit_mb: d.memory_limit_mb,
            autoscale_min: d.autoscale_min,
            autoscale_max: d.autoscale_max,
            cpu_trigger_percent: Some(Quantity::from(d.cpu_trigger_percent)),
            istio_enabled: false,
            istio_cpu_request: d.istio_cpu_request,
            istio_cpu_limit: d.istio_cpu_limit,
            istio_mem_request: d.istio_mem_request,
            istio_mem_limit: d.istio_mem_limit,
            override_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prod_profile() {
        let d = EnvironmentDefaults::for_environment("prod").unwrap();
        assert_eq!(d.pod_count, 3);
        assert_eq!(d.autoscale_max, 64);
        assert_eq!(d.cpu_trigger_percent, "60%");
        assert_eq!(d.istio_mem_limit, 2000);
    }

    #[test]
    fn test_nonprod_copies_share_profile() {
        for env in ["nonprod", "uat", "sit", "test", "sandbox", "dev"] {
            assert_eq!(
                EnvironmentDefaults::for_environment(env),
                Some(NONPROD_DEFAULTS),
                "environment {}",
                env
            );
        }
        assert!(EnvironmentDefaults::for_environment("preprod").is_none());
    }

    #[test]
    fn test_request_from_defaults() {
        let req = NamespaceRequest::from_defaults("prod", "eks-a", "orders");
        assert_eq!(req.pod_count, Some(Quantity::Number(3.0)));
        assert_eq!(req.cpu_request_millicores, Some(Quantity::Number(100.0)));
        assert_eq!(req.memory_request_mb, 2000);
        assert_eq!(req.namespace, "orders");

        let unknown = NamespaceRequest::from_defaults("lab", "c", "n");
        assert_eq!(unknown.autoscale_max, 3);
    }
}
