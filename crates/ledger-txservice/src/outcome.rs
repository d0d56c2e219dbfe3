//! Result of a transaction-service call (§4.4).

use ledger_domain::JournalId;

#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub journal_id: Option<JournalId>,
    pub asset_row_ids: Vec<i64>,
    pub is_duplicate: bool,
}
