//! The single write path (§4.4). Every mutation to a tracked table goes
//! through [`record`] or [`record_asset_only`]; parsers and the batch
//! ingester are not permitted to write tables directly (§3 Lifecycle).

use ledger_domain::{LedgerResult, UserId};
use ledger_journal::Journal;
use ledger_store::{AuditAction, Store};
use rusqlite::types::Value;
use serde_json::Value as JsonValue;

use crate::outcome::RecordOutcome;
use crate::request::{AssetRecord, RecordRequest};

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) => JsonValue::from(*i),
        Value::Real(r) => JsonValue::from(*r),
        Value::Text(s) => JsonValue::from(s.clone()),
        Value::Blob(_) => JsonValue::String("<blob>".to_string()),
    }
}

fn record_as_json(record: &AssetRecord) -> JsonValue {
    JsonValue::Object(
        record
            .columns
            .iter()
            .map(|(name, value)| (name.to_string(), value_to_json(value)))
            .collect(),
    )
}

/// Records a journal plus its asset rows, and optionally depletes
/// cost-basis lots, all in one transaction:
///
/// 1. If `(user_id, idempotency_key)` already has a journal, return it
///    with `is_duplicate = true` and write nothing.
/// 2. Validate journal balance (done by [`Journal::new`] already, but
///    re-checked here since callers may have mutated legs).
/// 3. Insert journal and journal entries.
/// 4. Upsert every asset record, honoring its `on_conflict` policy.
/// 5. Deplete cost-basis lots if requested.
/// 6. Append one audit-log entry per insert.
pub fn record(store: &Store, request: RecordRequest) -> LedgerResult<RecordOutcome> {
    let journal = Journal::new(
        request.user_id,
        request.txn_date,
        request.description.clone(),
        request.source.clone(),
        request.idempotency_key.clone(),
        request.reference_type.clone(),
        request.legs,
    )?;

    store.with_tx(|tx| {
        if let Some(existing) =
            ledger_store::find_journal_by_key(tx, request.user_id, &journal.idempotency_key)?
        {
            return Ok(RecordOutcome {
                journal_id: Some(existing),
                asset_row_ids: Vec::new(),
                is_duplicate: true,
            });
        }

        let post_outcome = ledger_journal::post_in_tx(tx, &journal)?;
        let journal_id = post_outcome.journal_id();

        let mut asset_row_ids = Vec::with_capacity(request.asset_records.len());
        for asset_record in &request.asset_records {
            let upsert_outcome = ledger_store::upsert(
                tx,
                asset_record.table,
                &asset_record.columns,
                &asset_record.conflict_target,
                asset_record.on_conflict,
            )?;
            asset_row_ids.push(upsert_outcome.rowid);
            if upsert_outcome.inserted {
                ledger_store::record_audit(
                    tx,
                    request.user_id,
                    asset_record.table,
                    upsert_outcome.rowid,
                    AuditAction::Insert,
                    None::<&JsonValue>,
                    Some(&record_as_json(asset_record)),
                    &request.source,
                )?;
            }
        }

        if let Some(depletion) = &request.deplete {
            ledger_costbasis::deplete_lots(tx, &depletion.result)?;
        }

        if let Some(purchase) = &request.lot_purchase {
            ledger_costbasis::record_purchase(
                tx,
                request.user_id,
                purchase.asset_type,
                &purchase.symbol,
                purchase.acquisition_date,
                purchase.units,
                purchase.total_cost,
                purchase.reference.as_deref(),
                &purchase.currency,
            )?;
        }

        if let Some(gain) = &request.gain_event {
            let depletion_result = request
                .deplete
                .as_ref()
                .ok_or_else(|| ledger_domain::LedgerError::invalid("a gain event requires a depletion result"))?;
            ledger_costbasis::record_gain_event(
                tx,
                request.user_id,
                Some(journal_id),
                gain.asset_type,
                &gain.symbol,
                gain.folio_or_account.as_deref(),
                gain.sale_date,
                gain.units_sold,
                gain.sale_value,
                &depletion_result.result,
                gain.grandfathered,
            )?;
        }

        Ok(RecordOutcome {
            journal_id: Some(journal_id),
            asset_row_ids,
            is_duplicate: false,
        })
    })
}

/// Writes asset rows with no enclosing journal — used for reference
/// data such as broker/holding snapshots (§4.4). Idempotency here comes
/// entirely from each row's natural-key upsert; there is no journal
/// row to dedupe against.
pub fn record_asset_only(
    store: &Store,
    user_id: UserId,
    asset_records: Vec<AssetRecord>,
    source: &str,
) -> LedgerResult<RecordOutcome> {
    store.with_tx(|tx| {
        let mut asset_row_ids = Vec::with_capacity(asset_records.len());
        for asset_record in &asset_records {
            let upsert_outcome = ledger_store::upsert(
                tx,
                asset_record.table,
                &asset_record.columns,
                &asset_record.conflict_target,
                asset_record.on_conflict,
            )?;
            asset_row_ids.push(upsert_outcome.rowid);
            if upsert_outcome.inserted {
                ledger_store::record_audit(
                    tx,
                    user_id,
                    asset_record.table,
                    upsert_outcome.rowid,
                    AuditAction::Insert,
                    None::<&JsonValue>,
                    Some(&record_as_json(asset_record)),
                    source,
                )?;
            }
        }
        Ok(RecordOutcome {
            journal_id: None,
            asset_row_ids,
            is_duplicate: false,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledger_domain::{AccountCode, Money, OnConflict};
    use ledger_journal::JournalLeg;
    use rust_decimal_macros::dec;

    fn mf_columns(folio: &str) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::Integer(1)),
            ("folio", Value::Text(folio.to_string())),
            ("scheme", Value::Text("SCHEME-A".to_string())),
            ("txn_date", Value::Text("2024-04-15".to_string())),
            ("amount", Value::Text("1000.00".to_string())),
            ("units", Value::Text("20.0000".to_string())),
            ("txn_type", Value::Text("PURCHASE".to_string())),
            ("source", Value::Text("CAMS".to_string())),
        ]
    }

    fn sample_request(key: &str, folio: &str) -> RecordRequest {
        RecordRequest {
            user_id: ledger_domain::UserId(1),
            txn_date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            description: "MF purchase".to_string(),
            source: "CAMS".to_string(),
            idempotency_key: key.to_string(),
            reference_type: "mf_transactions".to_string(),
            legs: vec![
                JournalLeg::debit(AccountCode::new("1201:SCHEME-A"), Money::new(dec!(1000.00)), None),
                JournalLeg::credit(AccountCode::new("1101"), Money::new(dec!(1000.00)), None),
            ],
            asset_records: vec![AssetRecord {
                table: "mf_transactions",
                columns: mf_columns(folio),
                conflict_target: vec!["user_id", "folio", "scheme", "txn_date", "amount", "units", "txn_type"],
                on_conflict: OnConflict::Ignore,
            }],
            deplete: None,
            lot_purchase: None,
            gain_event: None,
        }
    }

    #[test]
    fn record_writes_journal_and_asset_row_together() {
        let store = Store::open_in_memory().unwrap();
        let outcome = record(&store, sample_request("cams:F1:2024-04-15:1000", "F1")).unwrap();
        assert!(!outcome.is_duplicate);
        assert!(outcome.journal_id.is_some());
        assert_eq!(outcome.asset_row_ids.len(), 1);

        let conn = store.conn().unwrap();
        let journals: i64 = conn.query_row("SELECT COUNT(*) FROM journals", [], |r| r.get(0)).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM mf_transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(journals, 1);
        assert_eq!(rows, 1);
    }

    #[test]
    fn re_recording_the_same_idempotency_key_changes_nothing() {
        let store = Store::open_in_memory().unwrap();
        record(&store, sample_request("cams:F1:2024-04-15:1000", "F1")).unwrap();
        let second = record(&store, sample_request("cams:F1:2024-04-15:1000", "F1")).unwrap();
        assert!(second.is_duplicate);

        let conn = store.conn().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM mf_transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn record_opens_a_cost_basis_lot_alongside_the_purchase_journal() {
        use crate::request::LotPurchase;
        use ledger_domain::AssetClass;

        let store = Store::open_in_memory().unwrap();
        let mut request = sample_request("cams:F1:2024-04-15:1000", "F1");
        request.lot_purchase = Some(LotPurchase {
            asset_type: AssetClass::EquityMutualFund,
            symbol: "SCHEME-A".to_string(),
            acquisition_date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            units: ledger_domain::Units::new(dec!(20.0000)),
            total_cost: Money::new(dec!(1000.00)),
            reference: Some("F1".to_string()),
            currency: "INR".to_string(),
        });

        record(&store, request).unwrap();

        let conn = store.conn().unwrap();
        let lots: i64 = conn
            .query_row("SELECT COUNT(*) FROM cost_basis_lots", [], |r| r.get(0))
            .unwrap();
        assert_eq!(lots, 1);
    }

    #[test]
    fn record_depletes_lots_and_writes_a_gain_event_together() {
        use crate::request::{Depletion, GainEvent};
        use ledger_costbasis::{calculate_cost_basis, record_purchase, CostBasisMethod};
        use ledger_domain::AssetClass;

        let store = Store::open_in_memory().unwrap();
        let depletion_result = store
            .with_tx(|tx| {
                record_purchase(
                    tx,
                    ledger_domain::UserId(1),
                    AssetClass::IndianStock,
                    "INFY",
                    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                    ledger_domain::Units::new(dec!(100)),
                    Money::new(dec!(1000)),
                    None,
                    "INR",
                )?;
                calculate_cost_basis(
                    tx,
                    ledger_domain::UserId(1),
                    AssetClass::IndianStock,
                    "INFY",
                    ledger_domain::Units::new(dec!(100)),
                    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                    CostBasisMethod::Fifo,
                )
            })
            .unwrap();

        let mut request = sample_request("zerodha:INFY:2024-06-01:sell", "F1");
        request.legs = vec![
            JournalLeg::debit(AccountCode::new("1101"), Money::new(dec!(1500.00)), None),
            JournalLeg::credit(AccountCode::new("1203:INFY"), Money::new(dec!(1000.00)), None),
            JournalLeg::credit(AccountCode::new("4202"), Money::new(dec!(500.00)), None),
        ];
        request.deplete = Some(Depletion { result: depletion_result });
        request.gain_event = Some(GainEvent {
            asset_type: AssetClass::IndianStock,
            symbol: "INFY".to_string(),
            folio_or_account: None,
            sale_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            units_sold: ledger_domain::Units::new(dec!(100)),
            sale_value: Money::new(dec!(1500)),
            grandfathered: None,
        });

        record(&store, request).unwrap();

        let conn = store.conn().unwrap();
        let remaining: String = conn
            .query_row("SELECT units_remaining FROM cost_basis_lots WHERE symbol = 'INFY'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining.parse::<rust_decimal::Decimal>().unwrap(), dec!(0));

        let gains: i64 = conn
            .query_row("SELECT COUNT(*) FROM capital_gains_events", [], |r| r.get(0))
            .unwrap();
        assert_eq!(gains, 1);
    }

    #[test]
    fn record_asset_only_writes_no_journal() {
        let store = Store::open_in_memory().unwrap();
        let outcome = record_asset_only(
            &store,
            ledger_domain::UserId(1),
            vec![AssetRecord {
                table: "mf_transactions",
                columns: mf_columns("F2"),
                conflict_target: vec!["user_id", "folio", "scheme", "txn_date", "amount", "units", "txn_type"],
                on_conflict: OnConflict::Ignore,
            }],
            "CAMS",
        )
        .unwrap();
        assert!(outcome.journal_id.is_none());

        let conn = store.conn().unwrap();
        let journals: i64 = conn.query_row("SELECT COUNT(*) FROM journals", [], |r| r.get(0)).unwrap();
        assert_eq!(journals, 0);
    }
}
