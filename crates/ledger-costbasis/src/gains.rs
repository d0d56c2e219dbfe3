//! Persists one `capital_gains_events` row per disposal (SPEC_FULL §11.5).
//! `ledger-tax`'s income aggregator reads this table, and it is the
//! source of the capital-gains CSV export's per-disposal rows — neither
//! exists without a durable record of each sale's realized gain, since
//! cost-basis lots only carry current `units_remaining`, not history.

use chrono::NaiveDate;
use ledger_domain::{AssetClass, FinancialYear, JournalId, LedgerResult, Money, UserId, Units};
use rusqlite::Transaction;

use crate::grandfathering::GrandfatheredCoa;
use crate::lot::asset_type_to_str;
use crate::matched::CostBasisResult;

/// Records the realized gain for one sale. `cost_basis` is the
/// grandfathering-adjusted cost of acquisition when `grandfathered` is
/// `Some`, otherwise `result.total_cost_basis`.
#[allow(clippy::too_many_arguments)]
pub fn record_event(
    tx: &Transaction<'_>,
    user_id: UserId,
    journal_id: Option<JournalId>,
    asset_type: AssetClass,
    symbol: &str,
    folio_or_account: Option<&str>,
    sale_date: NaiveDate,
    units_sold: Units,
    sale_value: Money,
    result: &CostBasisResult,
    grandfathered: Option<GrandfatheredCoa>,
) -> LedgerResult<i64> {
    let cost_basis = grandfathered
        .map(|g| g.cost_of_acquisition)
        .unwrap_or(result.total_cost_basis);
    let gain = sale_value - cost_basis;
    let fy = FinancialYear::of(sale_date);

    tx.execute(
        "INSERT INTO capital_gains_events
            (user_id, journal_id, asset_type, symbol, folio_or_account, sale_date, units,
             sale_value, cost_basis, gain, term, is_grandfathered, fmv_missing, financial_year, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        rusqlite::params![
            user_id.0,
            journal_id.map(|j| j.0),
            asset_type_to_str(asset_type),
            symbol,
            folio_or_account,
            sale_date.to_string(),
            units_sold.raw().to_string(),
            sale_value.raw().to_string(),
            cost_basis.raw().to_string(),
            gain.raw().to_string(),
            result.holding_period.code(),
            grandfathered.map(|g| g.is_grandfathered).unwrap_or(false) as i64,
            grandfathered.map(|g| g.fmv_missing).unwrap_or(false) as i64,
            fy.to_string(),
            chrono::Utc::now().to_rfc3339(),
        ],
    )
    .map_err(ledger_store::from_rusqlite)?;
    Ok(tx.last_insert_rowid())
}
