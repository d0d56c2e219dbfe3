//! Balance sheet at a point in time (§4.9): every asset table contributes
//! its "latest known value as of D" line, and the whole thing can be
//! persisted as a snapshot for later comparison.
//!
//! Grounded on
//! `examples/original_source/src/pfas/services/balance_sheet_service.py`'s
//! per-asset-class aggregation, with one simplification: the original
//! keeps a dedicated `mf_nav_history` table with AMFI-feed backfill and
//! interpolation; that feed integration is out of scope here (it is a
//! stub even in the original), so "latest NAV/price as of D" is read
//! directly off the transaction tables' own `nav`/`price` columns —
//! every CAMS/Karvy/Zerodha/ICICI row already carries the price it
//! traded at, which is exactly the data the original's NAV history
//! table is backfilled from.

use chrono::NaiveDate;
use ledger_domain::{AssetClass, LedgerResult, Money, UserId};
use ledger_store::from_rusqlite;
use rusqlite::{OptionalExtension, Transaction};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AssetHolding {
    pub asset_class: AssetClass,
    pub symbol: String,
    pub quantity: String,
    pub price: Option<Money>,
    pub value: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoanBalance {
    pub loan_account: String,
    pub outstanding: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceSheet {
    pub as_of_date: NaiveDate,
    pub holdings: Vec<AssetHolding>,
    pub loans: Vec<LoanBalance>,
    pub total_assets: Money,
    pub total_liabilities: Money,
    pub net_worth: Money,
}

fn latest_bank_balance(tx: &Transaction<'_>, user_id: UserId, as_of: NaiveDate) -> LedgerResult<Money> {
    // Every distinct account is summed independently, then the per-account
    // balances are added — a closed account's last `balance_after` should
    // not be shadowed by a newer row on a different account.
    let mut stmt = tx
        .prepare(
            "SELECT bank, account_number, balance_after, amount
             FROM bank_transactions
             WHERE user_id = ?1 AND txn_date <= ?2
             ORDER BY bank, account_number, txn_date",
        )
        .map_err(from_rusqlite)?;

    let rows = stmt
        .query_map(rusqlite::params![user_id.0, as_of.to_string()], |row| {
            let bank: String = row.get(0)?;
            let account: Option<String> = row.get(1)?;
            let balance_after: Option<String> = row.get(2)?;
            let amount: String = row.get(3)?;
            Ok((bank, account, balance_after, amount))
        })
        .map_err(from_rusqlite)?;

    use std::collections::BTreeMap;
    let mut latest_balance: BTreeMap<(String, Option<String>), Money> = BTreeMap::new();
    let mut running_sum: BTreeMap<(String, Option<String>), Money> = BTreeMap::new();

    for row in rows {
        let (bank, account, balance_after, amount) = row.map_err(from_rusqlite)?;
        let key = (bank, account);
        let amount = Money::new(amount.parse().unwrap_or_default());
        *running_sum.entry(key.clone()).or_insert(Money::ZERO) += amount;
        if let Some(balance_after) = balance_after {
            latest_balance.insert(key, Money::new(balance_after.parse().unwrap_or_default()));
        }
    }

    let mut total = Money::ZERO;
    for (key, running) in &running_sum {
        total += latest_balance.get(key).copied().unwrap_or(*running);
    }
    Ok(total)
}

fn latest_price(tx: &Transaction<'_>, table: &str, symbol_col: &str, price_col: &str, date_col: &str, symbol: &str, user_id: UserId, as_of: NaiveDate) -> LedgerResult<Option<Money>> {
    let sql = format!(
        "SELECT {price_col} FROM {table}
         WHERE user_id = ?1 AND {symbol_col} = ?2 AND {date_col} <= ?3 AND {price_col} IS NOT NULL
         ORDER BY {date_col} DESC LIMIT 1"
    );
    tx.query_row(&sql, rusqlite::params![user_id.0, symbol, as_of.to_string()], |row| {
        let value: String = row.get(0)?;
        Ok(value)
    })
    .optional()
    .map_err(from_rusqlite)
    .map(|opt| opt.map(|v| Money::new(v.parse().unwrap_or_default())))
}

fn mf_holdings(tx: &Transaction<'_>, user_id: UserId, as_of: NaiveDate) -> LedgerResult<Vec<AssetHolding>> {
    let mut stmt = tx
        .prepare(
            "SELECT scheme, SUM(CASE WHEN txn_type IN ('Purchase','SwitchIn','DividendReinvest') THEN CAST(units AS REAL)
                                      WHEN txn_type IN ('Redemption','SwitchOut') THEN -CAST(units AS REAL)
                                      ELSE 0 END) AS net_units
             FROM mf_transactions
             WHERE user_id = ?1 AND txn_date <= ?2
             GROUP BY scheme
             HAVING ABS(net_units) > 0.0001",
        )
        .map_err(from_rusqlite)?;

    let rows = stmt
        .query_map(rusqlite::params![user_id.0, as_of.to_string()], |row| {
            let scheme: String = row.get(0)?;
            let net_units: f64 = row.get(1)?;
            Ok((scheme, net_units))
        })
        .map_err(from_rusqlite)?;

    let mut holdings = Vec::new();
    for row in rows {
        let (scheme, net_units) = row.map_err(from_rusqlite)?;
        let nav = latest_price(tx, "mf_transactions", "scheme", "nav", "txn_date", &scheme, user_id, as_of)?;
        let value = nav.map(|n| Money::new(n.raw() * rust_decimal::Decimal::try_from(net_units).unwrap_or_default())).unwrap_or(Money::ZERO);
        holdings.push(AssetHolding {
            asset_class: AssetClass::EquityMutualFund,
            symbol: scheme,
            quantity: format!("{net_units:.4}"),
            price: nav,
            value,
        });
    }
    Ok(holdings)
}

fn stock_holdings(tx: &Transaction<'_>, user_id: UserId, as_of: NaiveDate) -> LedgerResult<Vec<AssetHolding>> {
    let mut stmt = tx
        .prepare(
            "SELECT symbol, SUM(CASE WHEN trade_type = 'Buy' THEN CAST(quantity AS REAL) ELSE -CAST(quantity AS REAL) END) AS net_qty
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
            Ok((symbol, net_qty))
        })
        .map_err(from_rusqlite)?;

    let mut holdings = Vec::new();
    for row in rows {
        let (symbol, net_qty) = row.map_err(from_rusqlite)?;
        let price = latest_price(tx, "stock_trades", "symbol", "price", "trade_date", &symbol, user_id, as_of)?;
        let value = price.map(|p| Money::new(p.raw() * rust_decimal::Decimal::try_from(net_qty).unwrap_or_default())).unwrap_or(Money::ZERO);
        holdings.push(AssetHolding {
            asset_class: AssetClass::IndianStock,
            symbol,
            quantity: format!("{net_qty:.4}"),
            price,
            value,
        });
    }
    Ok(holdings)
}

fn passbook_holdings(tx: &Transaction<'_>, user_id: UserId, as_of: NaiveDate, table: &str, asset_class: AssetClass) -> LedgerResult<Vec<AssetHolding>> {
    let sql = format!(
        "SELECT account_number, balance_after
         FROM {table} t1
         WHERE user_id = ?1 AND txn_date <= ?2 AND balance_after IS NOT NULL
           AND txn_date = (SELECT MAX(txn_date) FROM {table} t2
                            WHERE t2.user_id = t1.user_id AND t2.account_number = t1.account_number AND t2.txn_date <= ?2)"
    );
    let mut stmt = tx.prepare(&sql).map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(rusqlite::params![user_id.0, as_of.to_string()], |row| {
            let account: String = row.get(0)?;
            let balance: String = row.get(1)?;
            Ok((account, balance))
        })
        .map_err(from_rusqlite)?;

    let mut holdings = Vec::new();
    for row in rows {
        let (account, balance) = row.map_err(from_rusqlite)?;
        let value = Money::new(balance.parse().unwrap_or_default());
        holdings.push(AssetHolding { asset_class, symbol: account, quantity: "1".to_string(), price: None, value });
    }
    Ok(holdings)
}

fn foreign_holdings(tx: &Transaction<'_>, user_id: UserId, as_of: NaiveDate) -> LedgerResult<Vec<AssetHolding>> {
    let mut stmt = tx
        .prepare(
            "SELECT symbol, quantity, fx_rate_to_inr
             FROM foreign_holdings t1
             WHERE user_id = ?1 AND as_of_date <= ?2
               AND as_of_date = (SELECT MAX(as_of_date) FROM foreign_holdings t2
                                  WHERE t2.user_id = t1.user_id AND t2.symbol = t1.symbol AND t2.as_of_date <= ?2)",
        )
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(rusqlite::params![user_id.0, as_of.to_string()], |row| {
            let symbol: String = row.get(0)?;
            let quantity: String = row.get(1)?;
            let fx_rate: Option<String> = row.get(2)?;
            Ok((symbol, quantity, fx_rate))
        })
        .map_err(from_rusqlite)?;

    let mut holdings = Vec::new();
    for row in rows {
        let (symbol, quantity, fx_rate) = row.map_err(from_rusqlite)?;
        let qty: rust_decimal::Decimal = quantity.parse().unwrap_or_default();
        let rate = fx_rate.and_then(|r| r.parse().ok());
        let value = rate.map(|r: rust_decimal::Decimal| Money::new(qty * r)).unwrap_or(Money::ZERO);
        holdings.push(AssetHolding {
            asset_class: AssetClass::ForeignStock,
            symbol,
            quantity: quantity.clone(),
            price: rate.map(Money::new),
            value,
        });
    }
    Ok(holdings)
}

fn loan_balances(tx: &Transaction<'_>, user_id: UserId, as_of: NaiveDate) -> LedgerResult<Vec<LoanBalance>> {
    let mut stmt = tx
        .prepare(
            "SELECT loan_account, outstanding_after
             FROM liability_transactions t1
             WHERE user_id = ?1 AND txn_date <= ?2
               AND txn_date = (SELECT MAX(txn_date) FROM liability_transactions t2
                                WHERE t2.user_id = t1.user_id AND t2.loan_account = t1.loan_account AND t2.txn_date <= ?2)",
        )
        .map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(rusqlite::params![user_id.0, as_of.to_string()], |row| {
            let account: String = row.get(0)?;
            let outstanding: String = row.get(1)?;
            Ok((account, outstanding))
        })
        .map_err(from_rusqlite)?;

    let mut loans = Vec::new();
    for row in rows {
        let (loan_account, outstanding) = row.map_err(from_rusqlite)?;
        loans.push(LoanBalance { loan_account, outstanding: Money::new(outstanding.parse().unwrap_or_default()) });
    }
    Ok(loans)
}

/// Builds the balance sheet as of `as_of`, without persisting it.
pub fn compute_balance_sheet(tx: &Transaction<'_>, user_id: UserId, as_of: NaiveDate) -> LedgerResult<BalanceSheet> {
    let bank_balance = latest_bank_balance(tx, user_id, as_of)?;
    let mut holdings = vec![AssetHolding {
        asset_class: AssetClass::Bank,
        symbol: "CASH".to_string(),
        quantity: "1".to_string(),
        price: None,
        value: bank_balance,
    }];
    holdings.extend(mf_holdings(tx, user_id, as_of)?);
    holdings.extend(stock_holdings(tx, user_id, as_of)?);
    holdings.extend(passbook_holdings(tx, user_id, as_of, "ppf_transactions", AssetClass::Ppf)?);
    holdings.extend(passbook_holdings(tx, user_id, as_of, "epf_transactions", AssetClass::Epf)?);
    holdings.extend(passbook_holdings(tx, user_id, as_of, "nps_transactions", AssetClass::Nps)?);
    holdings.extend(foreign_holdings(tx, user_id, as_of)?);

    let loans = loan_balances(tx, user_id, as_of)?;

    let total_assets = holdings.iter().fold(Money::ZERO, |acc, h| acc + h.value);
    let total_liabilities = loans.iter().fold(Money::ZERO, |acc, l| acc + l.outstanding);
    let net_worth = total_assets - total_liabilities;

    Ok(BalanceSheet { as_of_date: as_of, holdings, loans, total_assets, total_liabilities, net_worth })
}

/// Persists `sheet` as a snapshot (§4.9's "Persistable as snapshot"),
/// replacing any existing snapshot for the same `(user, as_of_date)`.
pub fn persist_snapshot(tx: &Transaction<'_>, user_id: UserId, sheet: &BalanceSheet) -> LedgerResult<()> {
    let detail_json = serde_json::to_string(sheet).map_err(|e| ledger_domain::LedgerError::invalid(e.to_string()))?;
    tx.execute(
        "INSERT INTO balance_sheet_snapshots (user_id, as_of_date, total_assets, total_liabilities, net_worth, detail_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id, as_of_date) DO UPDATE SET
            total_assets = excluded.total_assets,
            total_liabilities = excluded.total_liabilities,
            net_worth = excluded.net_worth,
            detail_json = excluded.detail_json,
            created_at = excluded.created_at",
        rusqlite::params![
            user_id.0,
            sheet.as_of_date.to_string(),
            sheet.total_assets.raw().to_string(),
            sheet.total_liabilities.raw().to_string(),
            sheet.net_worth.raw().to_string(),
            detail_json,
            chrono::Utc::now().to_rfc3339(),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::Store;

    fn seed(tx: &Transaction<'_>) {
        tx.execute(
            "INSERT INTO bank_transactions (user_id, bank, account_number, txn_date, raw_description, amount, balance_after, natural_key_hash, source)
             VALUES (1, 'HDFC', 'A1', '2024-04-01', 'OPENING', '100000', '100000', 'h1', 'test')",
            [],
        )
        .unwrap();
        tx.execute(
            "INSERT INTO mf_transactions (user_id, folio, scheme, txn_date, amount, units, txn_type, nav, source)
             VALUES (1, 'F1', 'SCHEME-A', '2024-05-01', '10000', '100.0000', 'Purchase', '100.00', 'test')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn aggregates_bank_and_mf_holdings() {
        let store = Store::open_in_memory().unwrap();
        let sheet = store
            .with_tx(|tx| {
                seed(tx);
                compute_balance_sheet(tx, UserId(1), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            })
            .unwrap();

        assert_eq!(sheet.total_assets, Money::new(rust_decimal::Decimal::new(11000000, 2)));
        assert_eq!(sheet.holdings.len(), 2);
    }

    #[test]
    fn persists_and_upserts_a_snapshot() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                seed(tx);
                let sheet = compute_balance_sheet(tx, UserId(1), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())?;
                persist_snapshot(tx, UserId(1), &sheet)?;
                persist_snapshot(tx, UserId(1), &sheet)
            })
            .unwrap();

        let conn = store.conn().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM balance_sheet_snapshots", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }
}
