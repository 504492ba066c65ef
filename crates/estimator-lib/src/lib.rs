//! Namespace cost estimator library
//!
//! This crate provides the core functionality for:
//! - T-shirt size pricing tiers and cheapest-fit tier selection
//! - Per-namespace CPU demand, buffering and cost calculation
//! - Environment and cluster rollups for summary views
//! - An in-memory estimate session (add, override, reset, finalize)
//! - Per-environment form defaults
//! - Metrics and structured logging

pub mod aggregation;
pub mod calculator;
pub mod defaults;
pub mod models;
pub mod observability;
pub mod pricing;
pub mod session;

pub use aggregation::{GroupBy, GroupRollup, RollupTotals};
pub use calculator::{BatchSummary, BatchTotals, CalculationError, CostCalculator};
pub use defaults::EnvironmentDefaults;
pub use models::*;
pub use observability::{EstimatorMetrics, StructuredLogger};
pub use pricing::{PricingError, PricingTable, SizeTier, TierName};
pub use session::{
    EstimateSession, FinalizeReport, ProjectTags, ReportMetadata, SessionEntry, SessionError,
};
