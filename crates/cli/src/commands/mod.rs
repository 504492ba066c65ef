//! CLI command implementations

pub mod estimate;
pub mod finalize;
pub mod tiers;
