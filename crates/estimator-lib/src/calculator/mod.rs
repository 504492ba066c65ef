//! Namespace sizing and cost calculation
//!
//! This module provides:
//! - CPU demand conversion from per-pod millicore requests
//! - The 30% scheduling buffer applied before tier selection
//! - Per-namespace cost calculation that never fails the caller
//! - Batch calculation with totals for summary views

mod batch;
mod cost;


pub use self::batch::{BatchSummary, BatchTotals};
pub use self::cost::{
    apply_buffer, compute_total_cpu, round_cents, CalculationError, CostCalculator,
    BUFFER_MULTIPLIER, MILLICORES_PER_CORE,
};
