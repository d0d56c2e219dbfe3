//! Inputs to the transaction service (§4.4).

use chrono::NaiveDate;
use ledger_costbasis::GrandfatheredCoa;
use ledger_domain::{AssetClass, Money, OnConflict, UserId, Units};
use ledger_journal::JournalLeg;
use rusqlite::types::Value;

/// One denormalized asset row to upsert alongside (or instead of) a
/// journal posting.
pub struct AssetRecord {
    pub table: &'static str,
    pub columns: Vec<(&'static str, Value)>,
    pub conflict_target: Vec<&'static str>,
    pub on_conflict: OnConflict,
}

/// An instruction to deplete cost-basis lots in the same transaction as
/// the journal insert, for a sell/redemption/withdrawal event. The
/// caller computes the (non-mutating) `CostBasisResult` beforehand via
/// `ledger_costbasis::calculate_cost_basis`.
pub struct Depletion {
    pub result: ledger_costbasis::CostBasisResult,
}

/// An instruction to open a new cost-basis lot in the same transaction
/// as a purchase/acquisition journal posting.
pub struct LotPurchase {
    pub asset_type: AssetClass,
    pub symbol: String,
    pub acquisition_date: NaiveDate,
    pub units: Units,
    pub total_cost: Money,
    pub reference: Option<String>,
    pub currency: String,
}

/// An instruction to persist a `capital_gains_events` row for the same
/// disposal this request's journal and depletion cover.
pub struct GainEvent {
    pub asset_type: AssetClass,
    pub symbol: String,
    pub folio_or_account: Option<String>,
    pub sale_date: NaiveDate,
    pub units_sold: Units,
    pub sale_value: Money,
    pub grandfathered: Option<GrandfatheredCoa>,
}

/// The full input to [`crate::service::record`]: a balanced set of
/// journal legs plus the asset rows it corresponds to.
pub struct RecordRequest {
    pub user_id: UserId,
    pub txn_date: NaiveDate,
    pub description: String,
    pub source: String,
    pub idempotency_key: String,
    pub reference_type: String,
    pub legs: Vec<JournalLeg>,
    pub asset_records: Vec<AssetRecord>,
    pub deplete: Option<Depletion>,
    pub lot_purchase: Option<LotPurchase>,
    pub gain_event: Option<GainEvent>,
}
