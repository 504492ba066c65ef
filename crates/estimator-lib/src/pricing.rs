//! T-shirt size pricing tiers
//!
//! A pricing table is an ordered list of size tiers, each with a CPU capacity
//! ceiling (cores) and a fixed monthly price (USD). Tier selection scans the
//! table in ascending capacity order, so the ordering is validated whenever a
//! table is constructed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Named pricing bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TierName {
    S,
    M,
    L,
    XL,
}

impl TierName {
    pub const ALL: [TierName; 4] = [TierName::S, TierName::M, TierName::L, TierName::XL];

    pub fn as_str(&self) -> &'static str {
        match self {
            TierName::S => "S",
            TierName::M => "M",
            TierName::L => "L",
            TierName::XL => "XL",
        }
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TierName {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Ok(TierName::S),
            "M" => Ok(TierName::M),
            "L" => Ok(TierName::L),
            "XL" => Ok(TierName::XL),
            _ => Err(PricingError::UnknownTier(s.to_string())),
        }
    }
}

/// A single pricing tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeTier {
    pub name: TierName,
    /// CPU capacity ceiling in cores
    pub cpu_capacity: f64,
    /// Monthly price in USD
    pub monthly_price: f64,
}

impl SizeTier {
    pub const fn new(name: TierName, cpu_capacity: f64, monthly_price: f64) -> Self {
        Self {
            name,
            cpu_capacity,
            monthly_price,
        }
    }
}

/// Canonical business pricing
pub const STANDARD_TIERS: [SizeTier; 4] = [
    SizeTier::new(TierName::S, 8.0, 413.46),
    SizeTier::new(TierName::M, 16.0, 583.84),
    SizeTier::new(TierName::L, 32.0, 1102.56),
    SizeTier::new(TierName::XL, 64.0, 2205.12),
];

/// Errors raised while building or querying a pricing table
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("pricing table must contain at least one tier")]
    Empty,

    #[error("unknown size tier '{0}'")]
    UnknownTier(String),

    #[error("size tier {0} appears more than once")]
    DuplicateTier(TierName),

    #[error("size tier {name} has invalid CPU capacity {capacity}")]
    InvalidCapacity { name: TierName, capacity: f64 },

    #[error("size tier {name} has invalid monthly price {price}")]
    InvalidPrice { name: TierName, price: f64 },

    #[error("size tier {name} ({capacity} cores) must be larger than the tier before it ({previous} cores)")]
    NotAscending {
        name: TierName,
        capacity: f64,
        previous: f64,
    },
}

/// Selector option for size pickers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeOption {
    pub value: TierName,
    pub label: String,
    pub cpu_capacity: f64,
    pub monthly_price: f64,
}

/// Immutable, ascending-capacity pricing table
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    tiers: Vec<SizeTier>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl PricingTable {
    /// The canonical S/M/L/XL table
    pub fn standard() -> Self {
        Self {
            tiers: STANDARD_TIERS.to_vec(),
        }
    }

    /// Build a custom table, validating ordering and values
    pub fn new(tiers: Vec<SizeTier>) -> Result<Self, PricingError> {
        if tiers.is_empty() {
            return Err(PricingError::Empty);
        }

        let mut previous: Option<f64> = None;
        for (idx, tier) in tiers.iter().enumerate() {
            if tiers[..idx].iter().any(|t| t.name == tier.name) {
                return Err(PricingError::DuplicateTier(tier.name));
            }
            if !tier.cpu_capacity.is_finite() || tier.cpu_capacity <= 0.0 {
                return Err(PricingError::InvalidCapacity {
                    name: tier.name,
                    capacity: tier.cpu_capacity,
                });
            }
            if !tier.monthly_price.is_finite() || tier.monthly_price < 0.0 {
                return Err(PricingError::InvalidPrice {
                    name: tier.name,
                    price: tier.monthly_price,
                });
            }
            if let Some(prev) = previous {
                if tier.cpu_capacity <= prev {
                    return Err(PricingError::NotAscending {
                        name: tier.name,
                        capacity: tier.cpu_capacity,
                        previous: prev,
                    });
                }
            }
            previous = Some(tier.cpu_capacity);
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[SizeTier] {
        &self.tiers
    }

    /// Largest-capacity tier, used as the fallback for invalid input
    pub fn default_tier(&self) -> &SizeTier {
        // Construction guarantees at least one tier
        &self.tiers[self.tiers.len() - 1]
    }

    pub fn smallest_tier(&self) -> &SizeTier {
        &self.tiers[0]
    }

    pub fn get(&self, name: TierName) -> Option<&SizeTier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// Resolve a free-form size name against this table
    pub fn lookup(&self, name: &str) -> Option<&SizeTier> {
        name.parse::<TierName>().ok().and_then(|n| self.get(n))
    }

    /// CPU cores one node is assumed to provide (one largest-tier slot)
    pub fn cpu_per_node(&self) -> f64 {
        self.default_tier().cpu_capacity
    }

    /// Cheapest tier whose capacity covers `buffered_cpu`
    ///
    /// Demand above the largest capacity still returns the largest tier, so
    /// the returned tier is not guaranteed to fit extreme inputs. Negative or
    /// non-finite input returns [`PricingTable::default_tier`].
    pub fn select_tier(&self, buffered_cpu: f64) -> TierName {
        if !buffered_cpu.is_finite() || buffered_cpu < 0.0 {
            warn!(
                buffered_cpu = buffered_cpu,
                fallback = %self.default_tier().name,
                "Invalid buffered CPU value, using fallback size"
            );
            return self.default_tier().name;
        }

        if buffered_cpu == 0.0 {
            return self.smallest_tier().name;
        }

        self.tiers
            .iter()
            .find(|t| buffered_cpu <= t.cpu_capacity)
            .unwrap_or_else(|| self.default_tier())
            .name
    }

    pub fn size_options(&self) -> Vec<SizeOption> {
        self.tiers
            .iter()
            .map(|t| SizeOption {
                value: t.name,
                label: format!("{} (up to {} CPU cores)", t.name, t.cpu_capacity),
                cpu_capacity: t.cpu_capacity,
                monthly_price: t.monthly_price,
            })
            .collect()
    }
}
