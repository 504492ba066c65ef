//! Reading namespace batches and override specs

use anyhow::{bail, Context, Result};
use estimator_lib::{EstimateSession, NamespaceRequest};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// A `ID=SIZE` override given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideSpec {
    pub id: u64,
    pub size: String,
}

impl FromStr for OverrideSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let Some((id, size)) = s.split_once('=') else {
            bail!("Override must look like ID=SIZE, got '{}'", s);
        };
        let id = id
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Invalid entry id in override '{}'", s))?;
        let size = size.trim();
        if size.is_empty() {
            bail!("Override '{}' has no size", s);
        }
        Ok(Self {
            id,
            size: size.to_string(),
        })
    }
}

/// Read a JSON array of namespace requests
pub fn read_requests(path: &Path) -> Result<Vec<NamespaceRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse namespace list in {}", path.display()))
}

/// Add every request to the session, then apply overrides.
///
/// Entries the session refuses (blank environment, cluster or namespace, or
/// an inverted autoscale range) are skipped with a warning.
pub fn load_session(
    session: &mut EstimateSession,
    requests: Vec<NamespaceRequest>,
    overrides: &[OverrideSpec],
) -> Result<()> {
    for (idx, request) in requests.into_iter().enumerate() {
        match session.add(request) {
            Ok(_) => {}
            Err(e) if e.is_rejected_request() => {
                warn!(entry = idx + 1, reason = %e, "Skipping namespace entry");
            }
            Err(e) => return Err(e.into()),
        }
    }

    for spec in overrides {
        session
            .override_size(spec.id, &spec.size)
            .with_context(|| format!("Cannot apply override {}={}", spec.id, spec.size))?;
    }

    Ok(())
}
