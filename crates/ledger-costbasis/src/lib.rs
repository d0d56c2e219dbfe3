//! Per-`(user, asset_type, symbol)` lot queue (§4.3): FIFO/average cost
//! basis, holding-period classification, and 31-Jan-2018 equity
//! grandfathering.

pub mod gains;
pub mod grandfathering;
pub mod lot;
pub mod matched;
pub mod method;
pub mod tracker;

pub use gains::record_event as record_gain_event;
pub use grandfathering::{cost_of_acquisition, cutoff_date, ltcg_regime_start, GrandfatheredCoa};
pub use lot::Lot;
pub use matched::{CostBasisResult, MatchedLot};
pub use method::CostBasisMethod;
pub use tracker::{calculate_cost_basis, deplete_lots, record_purchase, validate_ledger_sync};
