//! Cross Correlator (§4.10): matches a golden-reference statement's
//! holdings against the system's own computed holdings and records one
//! [`ReconciliationEvent`] per pairing, opening a suspense item for every
//! mismatch.
//!
//! Grounded on
//! `examples/original_source/src/pfas/services/golden_reference/cross_correlator.py`'s
//! `CrossCorrelator` class and its `ReconciliationConfig` tolerance
//! constants, transcribed verbatim below. The match cascade is
//! ISIN → folio → symbol → name, but the system side never carries an
//! ISIN (`mf_transactions`/`stock_trades` parse it but do not persist
//! it — see `DESIGN.md`), so in practice every match degrades straight
//! to folio/symbol/name; this is the fallback the cascade already
//! anticipates for a holding with no ISIN, not a bug in the cascade.

use std::collections::HashMap;

use chrono::NaiveDate;
use ledger_domain::{LedgerError, LedgerResult, MatchResult, Money, Severity, SuspenseStatus, UserId};
use ledger_store::from_rusqlite;
use rust_decimal::Decimal;
use rusqlite::Transaction;

/// `ReconciliationConfig` from the original, unchanged.
pub const ABSOLUTE_TOLERANCE: &str = "0.01";
pub const PERCENTAGE_TOLERANCE: &str = "0.001";
pub const WARNING_THRESHOLD: &str = "100";
pub const ERROR_THRESHOLD: &str = "1000";
pub const CRITICAL_THRESHOLD: &str = "10000";

fn dec(s: &str) -> Decimal {
    s.parse().expect("hard-coded tolerance constant")
}

#[derive(Debug, Clone)]
pub struct GoldenHolding {
    pub id: i64,
    pub isin: Option<String>,
    pub folio_number: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub quantity: Decimal,
    pub market_value: Option<Money>,
}

#[derive(Debug, Clone)]
pub struct SystemHolding {
    pub folio: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub quantity: Decimal,
    pub value: Money,
}

#[derive(Debug, Clone)]
pub struct ReconciliationEvent {
    pub id: i64,
    pub match_key: String,
    pub match_result: MatchResult,
    pub severity: Severity,
    pub system_quantity: Option<Decimal>,
    pub golden_quantity: Option<Decimal>,
    pub difference: Option<Money>,
}

fn match_result_str(m: MatchResult) -> &'static str {
    match m {
        MatchResult::Exact => "EXACT",
        MatchResult::WithinTolerance => "WITHIN_TOLERANCE",
        MatchResult::Mismatch => "MISMATCH",
        MatchResult::MissingGolden => "MISSING_GOLDEN",
        MatchResult::MissingSystem => "MISSING_SYSTEM",
    }
}

fn severity_str(s: Severity) -> &'static str {
    match s {
        Severity::Info => "INFO",
        Severity::Warning => "WARNING",
        Severity::Error => "ERROR",
        Severity::Critical => "CRITICAL",
    }
}

fn suspense_status_str(s: SuspenseStatus) -> &'static str {
    match s {
        SuspenseStatus::Open => "OPEN",
        SuspenseStatus::InProgress => "IN_PROGRESS",
        SuspenseStatus::Resolved => "RESOLVED",
        SuspenseStatus::WrittenOff => "WRITTEN_OFF",
    }
}

fn parse_suspense_status(s: &str) -> Option<SuspenseStatus> {
    match s {
        "OPEN" => Some(SuspenseStatus::Open),
        "IN_PROGRESS" => Some(SuspenseStatus::InProgress),
        "RESOLVED" => Some(SuspenseStatus::Resolved),
        "WRITTEN_OFF" => Some(SuspenseStatus::WrittenOff),
        _ => None,
    }
}

pub fn load_golden_holdings(tx: &Transaction<'_>, golden_ref_id: i64) -> LedgerResult<Vec<GoldenHolding>> {
    let mut stmt = tx
        .prepare("SELECT id, isin, folio_number, symbol, name, quantity, market_value FROM golden_holdings WHERE golden_ref_id = ?1")
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(rusqlite::params![golden_ref_id], |row| {
            let id: i64 = row.get(0)?;
            let isin: Option<String> = row.get(1)?;
            let folio_number: Option<String> = row.get(2)?;
            let symbol: Option<String> = row.get(3)?;
            let name: Option<String> = row.get(4)?;
            let quantity: String = row.get(5)?;
            let market_value: Option<String> = row.get(6)?;
            Ok((id, isin, folio_number, symbol, name, quantity, market_value))
        })
        .map_err(from_rusqlite)?;

    let mut holdings = Vec::new();
    for row in rows {
        let (id, isin, folio_number, symbol, name, quantity, market_value) = row.map_err(from_rusqlite)?;
        holdings.push(GoldenHolding {
            id,
            isin,
            folio_number,
            symbol,
            name,
            quantity: quantity.parse().unwrap_or_default(),
            market_value: market_value.and_then(|v| v.parse().ok()).map(Money::new),
        });
    }
    Ok(holdings)
}

/// The system's own holdings as of `as_of`, keyed the way
/// [`GoldenHolding`] is: MF rows carry a folio, stock rows a symbol.
/// This intentionally duplicates `ledger_valuation::balance_sheet`'s
/// queries rather than depending on that crate, because the balance
/// sheet groups MF holdings by scheme alone (it has no reason to track
/// folio) while reconciliation needs folio as its primary match key.
pub fn load_system_holdings(tx: &Transaction<'_>, user_id: UserId, as_of: NaiveDate) -> LedgerResult<Vec<SystemHolding>> {
    let mut holdings = Vec::new();

    let mut stmt = tx
        .prepare(
            "SELECT folio, scheme, SUM(CASE WHEN txn_type IN ('Purchase','SwitchIn','DividendReinvest') THEN CAST(units AS REAL)
                                              WHEN txn_type IN ('Redemption','SwitchOut') THEN -CAST(units AS REAL)
                                              ELSE 0 END) AS net_units,
                    MAX(CASE WHEN nav IS NOT NULL THEN nav END) AS last_nav
             FROM mf_transactions
             WHERE user_id = ?1 AND txn_date <= ?2
             GROUP BY folio, scheme
             HAVING ABS(net_units) > 0.0001",
        )
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(rusqlite::params![user_id.0, as_of.to_string()], |row| {
            let folio: String = row.get(0)?;
            let scheme: String = row.get(1)?;
            let net_units: f64 = row.get(2)?;
            let last_nav: Option<String> = row.get(3)?;
            Ok((folio, scheme, net_units, last_nav))
        })
        .map_err(from_rusqlite)?;
    for row in rows {
        let (folio, scheme, net_units, last_nav) = row.map_err(from_rusqlite)?;
        let quantity = Decimal::try_from(net_units).unwrap_or_default();
        let nav: Decimal = last_nav.and_then(|v| v.parse().ok()).unwrap_or_default();
        holdings.push(SystemHolding { folio: Some(folio), symbol: Some(scheme.clone()), name: Some(scheme), quantity, value: Money::new(nav * quantity) });
    }

    let mut stmt = tx
        .prepare(
            "SELECT symbol, SUM(CASE WHEN trade_type = 'Buy' THEN CAST(quantity AS REAL) ELSE -CAST(quantity AS REAL) END) AS net_qty,
                    MAX(CASE WHEN price IS NOT NULL THEN price END) AS last_price
             FROM stock_trades
             WHERE user_id = ?1 AND trade_date <= ?2
             GROUP BY symbol
             HAVING ABS(net_qty) > 0.0001",
        )
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(rusqlite::params![user_id.0, as_of.to_string()], |row| {
            let symbol: String = row.get(0)?;
            let net_qty: f64 = row.get(1)?;
            let last_price: Option<String> = row.get(2)?;
            Ok((symbol, net_qty, last_price))
        })
        .map_err(from_rusqlite)?;
    for row in rows {
        let (symbol, net_qty, last_price) = row.map_err(from_rusqlite)?;
        let quantity = Decimal::try_from(net_qty).unwrap_or_default();
        let price: Decimal = last_price.and_then(|v| v.parse().ok()).unwrap_or_default();
        holdings.push(SystemHolding { folio: None, symbol: Some(symbol.clone()), name: Some(symbol), quantity, value: Money::new(price * quantity) });
    }

    Ok(holdings)
}

fn find_system_match<'a>(golden: &GoldenHolding, by_folio: &HashMap<String, &'a SystemHolding>, by_symbol: &HashMap<String, &'a SystemHolding>, by_name: &HashMap<String, &'a SystemHolding>) -> Option<&'a SystemHolding> {
    // The ISIN tier is a deliberate no-op: the system never indexes by
    // ISIN, so a golden holding with an ISIN but no folio/symbol/name
    // falls straight through to MISSING_SYSTEM, same as the original
    // cascade does for any key it has no index for.
    if let Some(folio) = &golden.folio_number {
        if let Some(h) = by_folio.get(folio) {
            return Some(h);
        }
    }
    if let Some(symbol) = &golden.symbol {
        if let Some(h) = by_symbol.get(symbol) {
            return Some(h);
        }
    }
    if let Some(name) = &golden.name {
        if let Some(h) = by_name.get(name) {
            return Some(h);
        }
    }
    None
}

fn classify(golden_value: Option<Money>, system_value: Money) -> (MatchResult, Severity, Option<Money>) {
    let Some(golden_value) = golden_value else {
        return (MatchResult::Mismatch, Severity::Warning, None);
    };
    let diff = (system_value.raw() - golden_value.raw()).abs();
    let pct_allowance = golden_value.raw().abs() * dec(PERCENTAGE_TOLERANCE);
    let allowance = dec(ABSOLUTE_TOLERANCE).max(pct_allowance);

    let result = if diff.is_zero() {
        MatchResult::Exact
    } else if diff <= allowance {
        MatchResult::WithinTolerance
    } else {
        MatchResult::Mismatch
    };

    let severity = severity_for_diff(diff);
    (result, severity, Some(Money::new(diff)))
}

fn severity_for_diff(diff: Decimal) -> Severity {
    if diff < dec(WARNING_THRESHOLD) {
        Severity::Info
    } else if diff < dec(ERROR_THRESHOLD) {
        Severity::Warning
    } else if diff < dec(CRITICAL_THRESHOLD) {
        Severity::Error
    } else {
        Severity::Critical
    }
}

fn insert_event(tx: &Transaction<'_>, user_id: UserId, golden_ref_id: i64, match_key: &str, result: MatchResult, severity: Severity, system_qty: Option<Decimal>, golden_qty: Option<Decimal>, diff: Option<Money>, created_at: &str) -> LedgerResult<i64> {
    tx.execute(
        "INSERT INTO reconciliation_events (user_id, golden_ref_id, match_key, match_result, severity, system_quantity, golden_quantity, difference, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            user_id.0,
            golden_ref_id,
            match_key,
            match_result_str(result),
            severity_str(severity),
            system_qty.map(|q| q.to_string()),
            golden_qty.map(|q| q.to_string()),
            diff.map(|d| d.raw().to_string()),
            created_at,
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(tx.last_insert_rowid())
}

fn open_suspense_item(tx: &Transaction<'_>, user_id: UserId, event_id: i64, opened_at: &str) -> LedgerResult<i64> {
    tx.execute(
        "INSERT INTO suspense_items (user_id, reconciliation_event_id, status, opened_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![user_id.0, event_id, suspense_status_str(SuspenseStatus::Open), opened_at],
    )
    .map_err(from_rusqlite)?;
    Ok(tx.last_insert_rowid())
}

#[derive(Debug, Clone)]
pub struct ReconciliationRun {
    pub events: Vec<ReconciliationEvent>,
    pub suspense_opened: usize,
}

/// Runs the full cascade match for one golden reference, writing one
/// `reconciliation_events` row per golden holding and per unmatched
/// system holding, and opening a suspense item for every non-exact
/// result.
pub fn reconcile(tx: &Transaction<'_>, user_id: UserId, golden_ref_id: i64, as_of: NaiveDate, run_at: &str) -> LedgerResult<ReconciliationRun> {
    let golden_holdings = load_golden_holdings(tx, golden_ref_id)?;
    let system_holdings = load_system_holdings(tx, user_id, as_of)?;

    let by_folio: HashMap<String, &SystemHolding> = system_holdings.iter().filter_map(|h| h.folio.clone().map(|f| (f, h))).collect();
    let by_symbol: HashMap<String, &SystemHolding> = system_holdings.iter().filter_map(|h| h.symbol.clone().map(|s| (s, h))).collect();
    let by_name: HashMap<String, &SystemHolding> = system_holdings.iter().filter_map(|h| h.name.clone().map(|n| (n, h))).collect();

    let mut matched_system_keys: std::collections::HashSet<(Option<String>, Option<String>)> = std::collections::HashSet::new();
    let mut events = Vec::new();
    let mut suspense_opened = 0usize;

    for golden in &golden_holdings {
        let key = golden
            .isin
            .clone()
            .or_else(|| golden.folio_number.clone())
            .or_else(|| golden.symbol.clone())
            .or_else(|| golden.name.clone())
            .unwrap_or_else(|| format!("golden:{}", golden.id));

        let system_match = find_system_match(golden, &by_folio, &by_symbol, &by_name);

        let (result, severity, diff, system_qty) = match system_match {
            Some(sys) => {
                matched_system_keys.insert((sys.folio.clone(), sys.symbol.clone()));
                let (result, severity, diff) = classify(golden.market_value, sys.value);
                (result, severity, diff, Some(sys.quantity))
            }
            None => (MatchResult::MissingSystem, Severity::Warning, None, None),
        };

        let event_id = insert_event(tx, user_id, golden_ref_id, &key, result, severity, system_qty, Some(golden.quantity), diff, run_at)?;
        if result != MatchResult::Exact {
            open_suspense_item(tx, user_id, event_id, run_at)?;
            suspense_opened += 1;
        }
        events.push(ReconciliationEvent { id: event_id, match_key: key, match_result: result, severity, system_quantity: system_qty, golden_quantity: Some(golden.quantity), difference: diff });
    }

    for sys in &system_holdings {
        let key = (sys.folio.clone(), sys.symbol.clone());
        if matched_system_keys.contains(&key) {
            continue;
        }
        let match_key = sys.folio.clone().or_else(|| sys.symbol.clone()).unwrap_or_default();
        let severity = severity_for_diff(sys.value.raw().abs());
        let event_id = insert_event(tx, user_id, golden_ref_id, &match_key, MatchResult::MissingGolden, severity, Some(sys.quantity), None, Some(sys.value), run_at)?;
        open_suspense_item(tx, user_id, event_id, run_at)?;
        suspense_opened += 1;
        events.push(ReconciliationEvent { id: event_id, match_key, match_result: MatchResult::MissingGolden, severity, system_quantity: Some(sys.quantity), golden_quantity: None, difference: Some(sys.value) });
    }

    Ok(ReconciliationRun { events, suspense_opened })
}

/// Advances a suspense item's status, validating the transition through
/// [`SuspenseStatus::can_transition_to`] before writing it.
pub fn transition_suspense_item(tx: &Transaction<'_>, suspense_id: i64, next: SuspenseStatus, resolved_at: Option<&str>, resolution_note: Option<&str>) -> LedgerResult<()> {
    let current: String = tx
        .query_row("SELECT status FROM suspense_items WHERE id = ?1", rusqlite::params![suspense_id], |row| row.get(0))
        .map_err(from_rusqlite)?;
    let current = parse_suspense_status(&current).ok_or_else(|| LedgerError::invalid(format!("unknown suspense status {current}")))?;

    if !current.can_transition_to(next) {
        return Err(LedgerError::invalid(format!("cannot transition suspense item {suspense_id} from {current:?} to {next:?}")));
    }

    tx.execute(
        "UPDATE suspense_items SET status = ?1, resolved_at = ?2, resolution_note = ?3 WHERE id = ?4",
        rusqlite::params![suspense_status_str(next), resolved_at, resolution_note, suspense_id],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::Store;

    fn seed_golden_ref(tx: &Transaction<'_>, user_id: UserId) -> i64 {
        tx.execute(
            "INSERT INTO golden_references (user_id, source, statement_date, imported_at) VALUES (?1, 'NSDL_CAS', '2024-03-31', '2024-04-01T00:00:00Z')",
            rusqlite::params![user_id.0],
        )
        .unwrap();
        tx.last_insert_rowid()
    }

    #[test]
    fn an_exact_match_opens_no_suspense_item() {
        let store = Store::open_in_memory().unwrap();
        let run = store
            .with_tx(|tx| {
                let user_id = UserId(1);
                let golden_ref_id = seed_golden_ref(tx, user_id);
                tx.execute(
                    "INSERT INTO golden_holdings (golden_ref_id, folio_number, symbol, name, quantity, market_value) VALUES (?1, 'F1', 'ABC FUND', 'ABC FUND', '100', '1000.00')",
                    rusqlite::params![golden_ref_id],
                )
                .unwrap();
                tx.execute(
                    "INSERT INTO mf_transactions (user_id, folio, scheme, txn_date, amount, units, txn_type, nav, source)
                     VALUES (?1, 'F1', 'ABC FUND', '2024-01-15', '1000.00', '100', 'Purchase', '10.00', 'CAMS')",
                    rusqlite::params![user_id.0],
                )
                .unwrap();
                reconcile(tx, user_id, golden_ref_id, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(), "2024-04-01T00:00:00Z")
            })
            .unwrap();

        assert_eq!(run.events.len(), 1);
        assert_eq!(run.events[0].match_result, MatchResult::Exact);
        assert_eq!(run.suspense_opened, 0);
    }

    #[test]
    fn a_large_discrepancy_opens_a_critical_suspense_item() {
        let store = Store::open_in_memory().unwrap();
        let run = store
            .with_tx(|tx| {
                let user_id = UserId(1);
                let golden_ref_id = seed_golden_ref(tx, user_id);
                tx.execute(
                    "INSERT INTO golden_holdings (golden_ref_id, folio_number, symbol, name, quantity, market_value) VALUES (?1, 'F1', 'ABC FUND', 'ABC FUND', '100', '50000.00')",
                    rusqlite::params![golden_ref_id],
                )
                .unwrap();
                tx.execute(
                    "INSERT INTO mf_transactions (user_id, folio, scheme, txn_date, amount, units, txn_type, nav, source)
                     VALUES (?1, 'F1', 'ABC FUND', '2024-01-15', '1000.00', '100', 'Purchase', '10.00', 'CAMS')",
                    rusqlite::params![user_id.0],
                )
                .unwrap();
                reconcile(tx, user_id, golden_ref_id, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(), "2024-04-01T00:00:00Z")
            })
            .unwrap();

        assert_eq!(run.events[0].match_result, MatchResult::Mismatch);
        assert_eq!(run.events[0].severity, Severity::Critical);
        assert_eq!(run.suspense_opened, 1);
    }

    #[test]
    fn a_golden_holding_with_no_system_counterpart_is_missing_system() {
        let store = Store::open_in_memory().unwrap();
        let run = store
            .with_tx(|tx| {
                let user_id = UserId(1);
                let golden_ref_id = seed_golden_ref(tx, user_id);
                tx.execute(
                    "INSERT INTO golden_holdings (golden_ref_id, folio_number, symbol, name, quantity, market_value) VALUES (?1, 'F9', 'GHOST FUND', 'GHOST FUND', '50', '500.00')",
                    rusqlite::params![golden_ref_id],
                )
                .unwrap();
                reconcile(tx, user_id, golden_ref_id, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(), "2024-04-01T00:00:00Z")
            })
            .unwrap();

        assert_eq!(run.events[0].match_result, MatchResult::MissingSystem);
        assert_eq!(run.suspense_opened, 1);
    }

    #[test]
    fn suspense_transition_rejects_skipping_resolved_back_to_open() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .with_tx(|tx| {
                let user_id = UserId(1);
                let golden_ref_id = seed_golden_ref(tx, user_id);
                tx.execute(
                    "INSERT INTO golden_holdings (golden_ref_id, folio_number, symbol, name, quantity, market_value) VALUES (?1, 'F9', 'GHOST FUND', 'GHOST FUND', '50', '500.00')",
                    rusqlite::params![golden_ref_id],
                )
                .unwrap();
                let run = reconcile(tx, user_id, golden_ref_id, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(), "2024-04-01T00:00:00Z")?;
                let event_id = run.events[0].id;
                let suspense_id: i64 = tx.query_row("SELECT id FROM suspense_items WHERE reconciliation_event_id = ?1", rusqlite::params![event_id], |row| row.get(0)).unwrap();
                transition_suspense_item(tx, suspense_id, SuspenseStatus::Resolved, Some("2024-04-02T00:00:00Z"), Some("confirmed ghost"))?;
                transition_suspense_item(tx, suspense_id, SuspenseStatus::Open, None, None)
            });
        assert!(err.is_err());
    }
}
