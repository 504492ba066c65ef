//! Core data models for the cost estimator

use crate::pricing::TierName;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

/// Loosely-typed numeric form value
///
/// Form inputs arrive either as numbers or as raw text. Coercion happens
/// inside the calculator so a bad value yields an error-flagged result
/// instead of a rejected request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(f64),
    Text(String),
}

impl Quantity {
    /// Numeric value, or `None` when the value is not a finite number.
    ///
    /// Blank text counts as zero. Text such as "inf" or "NaN" parses as a
    /// float but is still rejected.
    pub fn coerce(&self) -> Option<f64> {
        let value = match self {
            Quantity::Number(n) => *n,
            Quantity::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().ok()?
                }
            }
        };

        value.is_finite().then_some(value)
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Quantity::Number(value as f64)
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Quantity::Number(value)
    }
}

impl From<&str> for Quantity {
    fn from(value: &str) -> Self {
        Quantity::Text(value.to_string())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Number(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Quantity::Number(n) => write!(f, "{}", n),
            Quantity::Text(s) => f.write_str(s),
        }
    }
}

/// Resource parameters for one namespace, as captured from the input form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceRequest {
    #[serde(default, alias = "env")]
    pub environment: String,
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub namespace: String,

    /// Number of pods (mandatory)
    #[serde(default, alias = "pods")]
    pub pod_count: Option<Quantity>,
    /// Per-pod CPU request in millicores (mandatory)
    #[serde(default, alias = "cpu_req")]
    pub cpu_request_millicores: Option<Quantity>,
    #[serde(default, alias = "mem_req", deserialize_with = "deserialize_count")]
    pub memory_request_mb: u32,
    #[serde(default, alias = "cpu_lim", deserialize_with = "deserialize_count")]
    pub cpu_limit_millicores: u32,
    #[serde(default, alias = "mem_lim", deserialize_with = "deserialize_count")]
    pub memory_limit_mb: u32,

    #[serde(default, alias = "hpa_min", deserialize_with = "deserialize_count")]
    pub autoscale_min: u32,
    #[serde(default, alias = "hpa_max", deserialize_with = "deserialize_count")]
    pub autoscale_max: u32,
    /// HPA CPU utilization trigger, e.g. "60%"
    #[serde(default, alias = "cpu_trigger")]
    pub cpu_trigger_percent: Option<Quantity>,

    #[serde(default, alias = "istio", deserialize_with = "deserialize_flag")]
    pub istio_enabled: bool,
    #[serde(default, alias = "istio_cpu_req", deserialize_with = "deserialize_count")]
    pub istio_cpu_request: u32,
    #[serde(default, alias = "istio_cpu_lim", deserialize_with = "deserialize_count")]
    pub istio_cpu_limit: u32,
    #[serde(default, alias = "istio_mem_req", deserialize_with = "deserialize_count")]
    pub istio_mem_request: u32,
    #[serde(default, alias = "istio_mem_lim", deserialize_with = "deserialize_count")]
    pub istio_mem_limit: u32,

    /// User-chosen size name; may not name a real tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_size: Option<String>,
}

impl NamespaceRequest {
    /// Request carrying only the two mandatory fields
    pub fn new(pod_count: impl Into<Quantity>, cpu_request_millicores: impl Into<Quantity>) -> Self {
        Self {
            pod_count: Some(pod_count.into()),
            cpu_request_millicores: Some(cpu_request_millicores.into()),
            ..Default::default()
        }
    }

    pub fn with_location(
        mut self,
        environment: impl Into<String>,
        cluster: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        self.environment = environment.into();
        self.cluster = cluster.into();
        self.namespace = namespace.into();
        self
    }

    pub fn with_override(mut self, size: impl Into<String>) -> Self {
        self.override_size = Some(size.into());
        self
    }
}

/// Accepts `true`/`false` as well as the form's "Yes"/"No" strings
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
        Number(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Number(n) => n != 0,
        Flag::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "y" | "yes" | "true" | "on" | "1"
        ),
    })
}

/// Whole-number form field. Text is parsed, fractions are truncated, and
/// anything negative or unusable becomes 0 with a warning.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Value(Quantity),
        Other(IgnoredAny),
    }

    let raw = Option::<Count>::deserialize(deserializer)?;
    let value = match &raw {
        None => return Ok(0),
        Some(Count::Value(q)) => q.coerce(),
        Some(Count::Other(_)) => None,
    };

    match value {
        Some(v) if (0.0..=u32::MAX as f64).contains(&v) => Ok(v.trunc() as u32),
        _ => {
            let shown = match &raw {
                Some(Count::Value(q)) => q.to_string(),
                _ => "non-numeric value".to_string(),
            };
            warn!(value = %shown, "Invalid number in namespace field, using 0");
            Ok(0)
        }
    }
}

/// A namespace request enriched with its computed sizing and cost
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespaceResult {
    #[serde(flatten)]
    pub request: NamespaceRequest,
    pub total_cpu_cores: f64,
    pub buffered_cpu_cores: f64,
    /// Cheapest tier covering the buffered demand
    pub computed_size: TierName,
    /// A valid override when one was given, otherwise `computed_size`
    pub recommended_size: TierName,
    /// Size the costs come from; always equal to `recommended_size`
    pub effective_size: TierName,
    pub monthly_cost: f64,
    pub annual_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation_error: Option<String>,
}

impl NamespaceResult {
    pub fn is_error(&self) -> bool {
        self.calculation_error.is_some()
    }

    /// Whether a valid override replaced the computed size
    pub fn is_overridden(&self) -> bool {
        self.recommended_size != self.computed_size
    }
}
