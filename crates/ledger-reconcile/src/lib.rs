//! # ledger-reconcile
//!
//! Golden-reference reconciliation (§4.10): resolves which external
//! statement is authoritative for a given metric and asset class, then
//! cross-correlates its holdings against the system's own computed
//! holdings, recording a reconciliation event and, for anything short
//! of an exact match, a suspense item that tracks the discrepancy
//! through to resolution or write-off.

pub mod correlator;
pub mod truth_resolver;

pub use correlator::{
    load_golden_holdings, load_system_holdings, reconcile, transition_suspense_item, GoldenHolding, ReconciliationEvent, ReconciliationRun, SystemHolding, ABSOLUTE_TOLERANCE, CRITICAL_THRESHOLD,
    ERROR_THRESHOLD, PERCENTAGE_TOLERANCE, WARNING_THRESHOLD,
};
pub use truth_resolver::{primary_source, source_priority, ConfigOverrides, Metric, Source};
