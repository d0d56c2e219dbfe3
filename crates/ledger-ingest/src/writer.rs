//! Turns one neutral [`ParsedRecord`] into the write path (§4.4):
//! resolves the two-leg posting via `ledger_journal::posting_rules`,
//! builds the matching asset row, and — for disposals — computes the
//! cost-basis depletion and grandfathering outside the commit
//! transaction (this crate is single-writer per §5, so a read taken
//! just before `record()`'s transaction opens is never stale) and folds
//! both into the same `RecordRequest` the transaction service commits
//! atomically.

use ledger_domain::{AssetClass, LedgerError, LedgerResult, Money, OnConflict, TxnKind, UserId, Units};
use ledger_journal::{resolve_simple_posting, JournalLeg};
use ledger_parsers::classify::{classify_scheme, SchemeClass};
use ledger_parsers::{BankTransactionRecord, MfTransactionRecord, PpfTransactionRecord, StockTradeRecord, TxnTypeHint};
use ledger_store::Store;
use ledger_txservice::{AssetRecord, Depletion, GainEvent, LotPurchase, RecordRequest};
use rusqlite::types::Value;

/// Per-batch parameters a single write-path call needs but that don't
/// belong on the neutral parsed record itself.
pub struct IngestContext {
    pub user_id: UserId,
    pub source: &'static str,
    pub cost_basis_method: ledger_costbasis::CostBasisMethod,
}

fn mf_asset_class(scheme: &str) -> AssetClass {
    match classify_scheme(scheme) {
        SchemeClass::Equity => AssetClass::EquityMutualFund,
        SchemeClass::Debt | SchemeClass::Hybrid | SchemeClass::Other => AssetClass::DebtMutualFund,
    }
}

fn text(s: impl Into<String>) -> Value {
    Value::Text(s.into())
}

/// Computes (outside the write transaction) what selling `units` of
/// `(asset_type, symbol)` as of `sale_date` would consume, and — for
/// grandfathering-eligible classes — the cost-of-acquisition override.
/// CAMS/Karvy's "Grandfathered NAV" column never reaches the neutral
/// parsed record (§4.5 drops it along with the rest of the file's
/// presentation-only columns), so the FMV input here is always `None`;
/// `cost_of_acquisition` already has a defined, tested fallback for
/// that case (flags `fmv_missing`).
fn compute_disposal(
    store: &Store,
    user_id: UserId,
    asset_type: AssetClass,
    symbol: &str,
    units_sold: Units,
    sale_date: chrono::NaiveDate,
    sale_value: Money,
    method: ledger_costbasis::CostBasisMethod,
) -> LedgerResult<(ledger_costbasis::CostBasisResult, Option<ledger_costbasis::GrandfatheredCoa>)> {
    let result = store.with_tx(|tx| {
        ledger_costbasis::calculate_cost_basis(tx, user_id, asset_type, symbol, units_sold, sale_date, method)
    })?;

    let grandfathered = if asset_type.is_grandfathering_eligible() {
        let earliest = result
            .matched_lots
            .iter()
            .map(|m| m.acquisition_date)
            .min()
            .unwrap_or(sale_date);
        Some(ledger_costbasis::cost_of_acquisition(earliest, sale_date, result.total_cost_basis, sale_value, None))
    } else {
        None
    };

    Ok((result, grandfathered))
}

pub fn write_mf_transaction(store: &Store, ctx: &IngestContext, record: &MfTransactionRecord) -> LedgerResult<ledger_txservice::RecordOutcome> {
    let asset_class = mf_asset_class(&record.scheme);
    let amount = Money::new(record.amount.abs());
    let units = Units::new(record.units.abs());

    let (txn_kind, lot_purchase, deplete, gain_event) = match &record.txn_type {
        TxnTypeHint::Purchase | TxnTypeHint::SwitchIn => (
            TxnKind::MfPurchase,
            Some(LotPurchase {
                asset_type: asset_class,
                symbol: record.scheme.clone(),
                acquisition_date: record.txn_date,
                units,
                total_cost: amount,
                reference: Some(record.folio.clone()),
                currency: "INR".to_string(),
            }),
            None,
            None,
        ),
        TxnTypeHint::Redemption | TxnTypeHint::SwitchOut => {
            let (result, grandfathered) =
                compute_disposal(store, ctx.user_id, asset_class, &record.scheme, units, record.txn_date, amount, ctx.cost_basis_method)?;
            let gain_event = GainEvent {
                asset_type: asset_class,
                symbol: record.scheme.clone(),
                folio_or_account: Some(record.folio.clone()),
                sale_date: record.txn_date,
                units_sold: units,
                sale_value: amount,
                grandfathered,
            };
            (TxnKind::MfRedemption, None, Some(Depletion { result }), Some(gain_event))
        }
        TxnTypeHint::Dividend | TxnTypeHint::DividendReinvest => (TxnKind::Dividend, None, None, None),
        other => return Err(LedgerError::invalid(format!("unsupported MF transaction type {other:?}"))),
    };

    let (debit, credit) = resolve_simple_posting(txn_kind, asset_class, Some(&record.scheme))?;
    let idempotency_key = format!(
        "CAMS:{}:{}:{}:{}:{}:{:?}",
        record.folio, record.scheme, record.txn_date, record.amount, record.units, record.txn_type
    );

    let request = RecordRequest {
        user_id: ctx.user_id,
        txn_date: record.txn_date,
        description: format!("{:?} {}", record.txn_type, record.scheme),
        source: ctx.source.to_string(),
        idempotency_key,
        reference_type: "mf_transactions".to_string(),
        legs: vec![JournalLeg::debit(debit, amount, None), JournalLeg::credit(credit, amount, None)],
        asset_records: vec![AssetRecord {
            table: "mf_transactions",
            columns: vec![
                ("user_id", Value::Integer(ctx.user_id.0)),
                ("folio", text(record.folio.clone())),
                ("scheme", text(record.scheme.clone())),
                ("txn_date", text(record.txn_date.to_string())),
                ("amount", text(record.amount.to_string())),
                ("units", text(record.units.to_string())),
                ("txn_type", text(format!("{:?}", record.txn_type))),
                ("nav", record.nav.map(|n| text(n.to_string())).unwrap_or(Value::Null)),
                ("source", text(ctx.source)),
            ],
            conflict_target: vec!["user_id", "folio", "scheme", "txn_date", "amount", "units", "txn_type"],
            on_conflict: OnConflict::Ignore,
        }],
        deplete,
        lot_purchase,
        gain_event,
    };

    ledger_txservice::record(store, request)
}

pub fn write_stock_trade(store: &Store, ctx: &IngestContext, record: &StockTradeRecord) -> LedgerResult<ledger_txservice::RecordOutcome> {
    let asset_class = AssetClass::IndianStock;
    let quantity = Units::new(record.quantity.abs());
    let amount = Money::new(record.quantity.abs() * record.price);

    let (txn_kind, lot_purchase, deplete, gain_event) = match &record.trade_type {
        TxnTypeHint::Buy => (
            TxnKind::StockBuy,
            Some(LotPurchase {
                asset_type: asset_class,
                symbol: record.symbol.clone(),
                acquisition_date: record.trade_date,
                units: quantity,
                total_cost: amount,
                reference: record.isin.clone(),
                currency: "INR".to_string(),
            }),
            None,
            None,
        ),
        TxnTypeHint::Sell => {
            let (result, grandfathered) =
                compute_disposal(store, ctx.user_id, asset_class, &record.symbol, quantity, record.trade_date, amount, ctx.cost_basis_method)?;
            let gain_event = GainEvent {
                asset_type: asset_class,
                symbol: record.symbol.clone(),
                folio_or_account: None,
                sale_date: record.trade_date,
                units_sold: quantity,
                sale_value: amount,
                grandfathered,
            };
            (TxnKind::StockSell, None, Some(Depletion { result }), Some(gain_event))
        }
        other => return Err(LedgerError::invalid(format!("unsupported stock trade type {other:?}"))),
    };

    let (debit, credit) = resolve_simple_posting(txn_kind, asset_class, Some(&record.symbol))?;
    let idempotency_key = format!(
        "STOCK:{}:{}:{:?}:{}:{}",
        record.symbol, record.trade_date, record.trade_type, record.quantity, record.price
    );

    let request = RecordRequest {
        user_id: ctx.user_id,
        txn_date: record.trade_date,
        description: format!("{:?} {}", record.trade_type, record.symbol),
        source: ctx.source.to_string(),
        idempotency_key,
        reference_type: "stock_trades".to_string(),
        legs: vec![JournalLeg::debit(debit, amount, None), JournalLeg::credit(credit, amount, None)],
        asset_records: vec![AssetRecord {
            table: "stock_trades",
            columns: vec![
                ("user_id", Value::Integer(ctx.user_id.0)),
                ("symbol", text(record.symbol.clone())),
                ("trade_date", text(record.trade_date.to_string())),
                ("trade_type", text(format!("{:?}", record.trade_type))),
                ("quantity", text(record.quantity.to_string())),
                ("price", text(record.price.to_string())),
                (
                    "purchase_date",
                    record.purchase_date.map(|d| text(d.to_string())).unwrap_or(Value::Null),
                ),
                ("source", text(ctx.source)),
            ],
            conflict_target: vec!["user_id", "symbol", "trade_date", "trade_type", "quantity", "price"],
            on_conflict: OnConflict::Ignore,
        }],
        deplete,
        lot_purchase,
        gain_event,
    };

    ledger_txservice::record(store, request)
}

pub fn write_ppf_transaction(store: &Store, ctx: &IngestContext, record: &PpfTransactionRecord) -> LedgerResult<ledger_txservice::RecordOutcome> {
    let txn_kind = match &record.txn_type {
        TxnTypeHint::Deposit => TxnKind::PpfDeposit,
        TxnTypeHint::Withdrawal => TxnKind::PpfWithdrawal,
        other => return Err(LedgerError::invalid(format!("unsupported PPF transaction type {other:?}"))),
    };
    let amount = Money::new(record.amount.abs());
    let (debit, credit) = resolve_simple_posting(txn_kind, AssetClass::Ppf, Some(&record.account_number))?;
    let idempotency_key = format!(
        "PPF:{}:{}:{}:{:?}",
        record.account_number, record.txn_date, record.amount, record.txn_type
    );

    let request = RecordRequest {
        user_id: ctx.user_id,
        txn_date: record.txn_date,
        description: format!("PPF {:?}", record.txn_type),
        source: ctx.source.to_string(),
        idempotency_key,
        reference_type: "ppf_transactions".to_string(),
        legs: vec![JournalLeg::debit(debit, amount, None), JournalLeg::credit(credit, amount, None)],
        asset_records: vec![AssetRecord {
            table: "ppf_transactions",
            columns: vec![
                ("user_id", Value::Integer(ctx.user_id.0)),
                ("account_number", text(record.account_number.clone())),
                ("txn_date", text(record.txn_date.to_string())),
                ("amount", text(record.amount.to_string())),
                ("txn_type", text(format!("{:?}", record.txn_type))),
                (
                    "balance_after",
                    record.balance_after.map(|b| text(b.to_string())).unwrap_or(Value::Null),
                ),
                ("source", text(ctx.source)),
            ],
            conflict_target: vec!["user_id", "account_number", "txn_date", "amount", "txn_type"],
            on_conflict: OnConflict::Ignore,
        }],
        deplete: None,
        lot_purchase: None,
        gain_event: None,
    };

    ledger_txservice::record(store, request)
}

/// Bank rows carry no business-event kind of their own — they're raw
/// statement lines kept for reconciliation against the cash movements
/// other writers post, not a journal-worthy event in their own right
/// (`AssetClass::Bank` has no holding account in the chart). Recorded
/// with [`ledger_txservice::record_asset_only`].
pub fn write_bank_transaction(store: &Store, ctx: &IngestContext, record: &BankTransactionRecord) -> LedgerResult<ledger_txservice::RecordOutcome> {
    ledger_txservice::record_asset_only(
        store,
        ctx.user_id,
        vec![AssetRecord {
            table: "bank_transactions",
            columns: vec![
                ("user_id", Value::Integer(ctx.user_id.0)),
                ("bank", text(record.bank.clone())),
                (
                    "account_number",
                    record.account_number.clone().map(text).unwrap_or(Value::Null),
                ),
                ("txn_date", text(record.txn_date.to_string())),
                ("raw_description", text(record.raw_description.clone())),
                ("amount", text(record.amount.to_string())),
                (
                    "balance_after",
                    record.balance_after.map(|b| text(b.to_string())).unwrap_or(Value::Null),
                ),
                ("natural_key_hash", text(record.natural_key_hash.clone())),
                ("source", text(ctx.source)),
            ],
            conflict_target: vec!["user_id", "natural_key_hash"],
            on_conflict: OnConflict::Ignore,
        }],
        ctx.source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ctx() -> IngestContext {
        IngestContext {
            user_id: UserId(1),
            source: "test",
            cost_basis_method: ledger_costbasis::CostBasisMethod::Fifo,
        }
    }

    fn buy(trade_date: NaiveDate, quantity: rust_decimal::Decimal, price: rust_decimal::Decimal) -> StockTradeRecord {
        StockTradeRecord {
            symbol: "INFY".to_string(),
            isin: None,
            trade_date,
            trade_type: TxnTypeHint::Buy,
            quantity,
            price,
            purchase_date: None,
        }
    }

    fn sell(trade_date: NaiveDate, quantity: rust_decimal::Decimal, price: rust_decimal::Decimal) -> StockTradeRecord {
        StockTradeRecord {
            symbol: "INFY".to_string(),
            isin: None,
            trade_date,
            trade_type: TxnTypeHint::Sell,
            quantity,
            price,
            purchase_date: None,
        }
    }

    /// A disposal whose lot was acquired before the grandfathering
    /// cutoff and sold before the LTCG regime began is exempt: COA is
    /// defined to equal the sale proceeds themselves, so `gain` must
    /// land at zero regardless of what the lot actually cost. Passing
    /// the matched lots' cost (rather than the real sale proceeds) into
    /// `cost_of_acquisition`'s `sale_value` parameter would instead
    /// floor the gain near zero only by accident, or tax it outright
    /// once price and cost diverge — this pins the real sale proceeds
    /// to the recorded `capital_gains_events` row.
    #[test]
    fn pre_regime_disposal_of_a_grandfathered_lot_is_recorded_with_zero_gain() {
        let store = Store::open_in_memory().unwrap();
        let ctx = ctx();

        write_stock_trade(
            &store,
            &ctx,
            &buy(NaiveDate::from_ymd_opt(2015, 6, 1).unwrap(), dec!(100), dec!(50)),
        )
        .unwrap();

        let sale_price = dec!(80);
        write_stock_trade(
            &store,
            &ctx,
            &sell(NaiveDate::from_ymd_opt(2018, 2, 1).unwrap(), dec!(100), sale_price),
        )
        .unwrap();

        store
            .with_tx(|tx| {
                let sale_value: String =
                    tx.query_row("SELECT sale_value FROM capital_gains_events WHERE symbol = 'INFY'", [], |r| r.get(0))
                        .map_err(|e| LedgerError::StorageError(e.to_string()))?;
                let cost_basis: String =
                    tx.query_row("SELECT cost_basis FROM capital_gains_events WHERE symbol = 'INFY'", [], |r| r.get(0))
                        .map_err(|e| LedgerError::StorageError(e.to_string()))?;
                let gain: String =
                    tx.query_row("SELECT gain FROM capital_gains_events WHERE symbol = 'INFY'", [], |r| r.get(0))
                        .map_err(|e| LedgerError::StorageError(e.to_string()))?;

                assert_eq!(sale_value, (dec!(100) * sale_price).to_string());
                assert_eq!(cost_basis, sale_value, "pre-regime disposal must float COA up to the sale proceeds");
                assert_eq!(gain, "0", "a pre-1-Apr-2018 grandfathered disposal is exempt and must realize zero gain");
                Ok(())
            })
            .unwrap();
    }

    /// Once the LTCG regime has started, the same lot's disposal is no
    /// longer automatically exempt — COA is the higher of purchase cost
    /// and `min(FMV, sale_value)`, and with no FMV on file this falls
    /// back to purchase cost, flagging `fmv_missing`. A non-zero gain
    /// here is the expected, taxable outcome, unlike the pre-regime
    /// case above.
    #[test]
    fn post_regime_disposal_without_fmv_falls_back_to_purchase_cost() {
        let store = Store::open_in_memory().unwrap();
        let ctx = ctx();

        write_stock_trade(
            &store,
            &ctx,
            &buy(NaiveDate::from_ymd_opt(2015, 6, 1).unwrap(), dec!(100), dec!(50)),
        )
        .unwrap();

        write_stock_trade(
            &store,
            &ctx,
            &sell(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), dec!(100), dec!(80)),
        )
        .unwrap();

        store
            .with_tx(|tx| {
                let cost_basis: String =
                    tx.query_row("SELECT cost_basis FROM capital_gains_events WHERE symbol = 'INFY'", [], |r| r.get(0))
                        .map_err(|e| LedgerError::StorageError(e.to_string()))?;
                let gain: String =
                    tx.query_row("SELECT gain FROM capital_gains_events WHERE symbol = 'INFY'", [], |r| r.get(0))
                        .map_err(|e| LedgerError::StorageError(e.to_string()))?;
                let fmv_missing: i64 =
                    tx.query_row("SELECT fmv_missing FROM capital_gains_events WHERE symbol = 'INFY'", [], |r| r.get(0))
                        .map_err(|e| LedgerError::StorageError(e.to_string()))?;

                assert_eq!(cost_basis, (dec!(100) * dec!(50)).to_string());
                assert_eq!(gain, (dec!(100) * dec!(30)).to_string());
                assert_eq!(fmv_missing, 1);
                Ok(())
            })
            .unwrap();
    }
}
