//! The result of a non-mutating cost-basis calculation (§4.3).

use chrono::NaiveDate;
use ledger_domain::{HoldingPeriod, LotId, Money, Units};

/// The portion of one lot consumed by a sell.
#[derive(Debug, Clone, Copy)]
pub struct MatchedLot {
    pub lot_id: LotId,
    pub units_matched: Units,
    pub cost_matched: Money,
    pub acquisition_date: NaiveDate,
}

/// Everything [`crate::tracker::calculate_cost_basis`] returns: which
/// lots were touched, the aggregate cost, and the holding-period/LTCG
/// classification taken from the *earliest* matched lot (the
/// conservative choice when a sell spans lots of different ages).
#[derive(Debug, Clone)]
pub struct CostBasisResult {
    pub matched_lots: Vec<MatchedLot>,
    pub total_cost_basis: Money,
    pub weighted_cost_per_unit: Money,
    pub holding_period_days: i64,
    pub holding_period: HoldingPeriod,
}

impl CostBasisResult {
    pub fn is_long_term(&self) -> bool {
        self.holding_period.is_long_term()
    }
}
