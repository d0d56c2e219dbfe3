//! Derives per-FY `IncomeRecord[]` (§4.8 "Aggregator"). Prefers the
//! pre-computed `user_income_summary` table; on a miss, aggregates from
//! source tables: capital gains from `capital_gains_events` (split
//! equity-short/equity-long/slab), dividend and bank-interest income
//! from posted journal entries against the dividend/interest accounts,
//! the latter with the §80TTA deduction applied.
//!
//! Salary has no ingestible source format in this system (payslips/
//! Form-16 are not among the statement types §1 names), so it is only
//! ever sourced from `user_income_summary` — there is no scan fallback
//! for it, unlike the other buckets.

use std::str::FromStr;

use ledger_domain::{FinancialYear, LedgerResult, Money, UserId};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::income::{IncomeBucket, IncomeRecord};

fn parse_money(s: &str) -> LedgerResult<Money> {
    Decimal::from_str(s)
        .map(Money::new)
        .map_err(|e| ledger_domain::LedgerError::invalid(format!("bad decimal {s}: {e}")))
}

fn bucket_from_code(code: &str) -> Option<IncomeBucket> {
    Some(match code {
        "SALARY" => IncomeBucket::Salary,
        "STCG_EQUITY" => IncomeBucket::StcgEquity,
        "LTCG_EQUITY" => IncomeBucket::LtcgEquity,
        "CG_SLAB" => IncomeBucket::CapitalGainsSlab,
        "HOUSE_PROPERTY" => IncomeBucket::HouseProperty,
        "BUSINESS" => IncomeBucket::Business,
        "OTHER_SOURCES" => IncomeBucket::OtherSources,
        _ => return None,
    })
}

fn from_user_income_summary(conn: &Connection, user_id: UserId, fy: FinancialYear) -> LedgerResult<Vec<IncomeRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT income_type, sub_classification, sub_grouping, gross, deductions, taxable, tds
             FROM user_income_summary WHERE user_id = ?1 AND financial_year = ?2",
        )
        .map_err(ledger_store::from_rusqlite)?;
    let rows = stmt
        .query_map(rusqlite::params![user_id.0, fy.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })
        .map_err(ledger_store::from_rusqlite)?;
    let mut records = Vec::new();
    for row in rows {
        let (income_type, sub_classification, sub_grouping, gross, deductions, taxable, tds) =
            row.map_err(ledger_store::from_rusqlite)?;
        let Some(bucket) = bucket_from_code(&income_type) else {
            continue;
        };
        records.push(IncomeRecord {
            bucket,
            sub_classification,
            sub_grouping,
            gross: parse_money(&gross)?,
            deductions: parse_money(&deductions)?,
            taxable: parse_money(&taxable)?,
            tds: parse_money(&tds)?,
        });
    }
    Ok(records)
}

fn capital_gains_from_events(conn: &Connection, user_id: UserId, fy: FinancialYear) -> LedgerResult<Vec<IncomeRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT asset_type, term, symbol, SUM(CAST(gain AS REAL))
             FROM capital_gains_events
             WHERE user_id = ?1 AND financial_year = ?2
             GROUP BY asset_type, term",
        )
        .map_err(ledger_store::from_rusqlite)?;
    let rows = stmt
        .query_map(rusqlite::params![user_id.0, fy.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })
        .map_err(ledger_store::from_rusqlite)?;
    let mut records = Vec::new();
    for row in rows {
        let (asset_type, term, symbol, gain) = row.map_err(ledger_store::from_rusqlite)?;
        let gain = Money::new(Decimal::try_from(gain).unwrap_or(Decimal::ZERO));
        let equity_like = matches!(asset_type.as_str(), "EQUITY_MF" | "INDIAN_STOCK");
        let bucket = if equity_like && term == "SHORT" {
            IncomeBucket::StcgEquity
        } else if equity_like && term == "LONG" {
            IncomeBucket::LtcgEquity
        } else {
            IncomeBucket::CapitalGainsSlab
        };
        records.push(IncomeRecord::new(bucket, asset_type, symbol, gain));
    }
    Ok(records)
}

fn journal_income_total(conn: &Connection, user_id: UserId, fy: FinancialYear, account_prefix: &str) -> LedgerResult<Money> {
    let total: f64 = conn
        .query_row(
            "SELECT COALESCE(SUM(CAST(je.credit AS REAL) - CAST(je.debit AS REAL)), 0)
             FROM journal_entries je
             JOIN journals j ON j.id = je.journal_id
             WHERE j.user_id = ?1 AND je.account_code LIKE ?2
               AND j.txn_date >= ?3 AND j.txn_date <= ?4",
            rusqlite::params![
                user_id.0,
                format!("{account_prefix}%"),
                fy.start_date().to_string(),
                fy.end_date().to_string(),
            ],
            |row| row.get(0),
        )
        .map_err(ledger_store::from_rusqlite)?;
    Ok(Money::new(Decimal::try_from(total).unwrap_or(Decimal::ZERO)))
}

fn scan_source_tables(
    conn: &Connection,
    user_id: UserId,
    fy: FinancialYear,
    section_80tta_limit: Money,
) -> LedgerResult<Vec<IncomeRecord>> {
    let mut records = capital_gains_from_events(conn, user_id, fy)?;

    let dividends = journal_income_total(conn, user_id, fy, "4101")?;
    if !dividends.is_zero() {
        records.push(IncomeRecord::new(IncomeBucket::OtherSources, "DIVIDEND", "DIVIDEND", dividends));
    }

    let interest = journal_income_total(conn, user_id, fy, "4102")?;
    if !interest.is_zero() {
        let deduction = interest.min(section_80tta_limit);
        let mut record = IncomeRecord::new(IncomeBucket::OtherSources, "BANK_INTEREST", "80TTA", interest);
        record.deductions = deduction;
        record.taxable = (interest - deduction).max(Money::ZERO);
        records.push(record);
    }

    Ok(records)
}

/// Derives `IncomeRecord[]` for `(user, fy)`, preferring
/// `user_income_summary` and falling back to scanning source tables.
pub fn aggregate_income(
    conn: &Connection,
    user_id: UserId,
    fy: FinancialYear,
    section_80tta_limit: Money,
) -> LedgerResult<Vec<IncomeRecord>> {
    let precomputed = from_user_income_summary(conn, user_id, fy)?;
    if !precomputed.is_empty() {
        return Ok(precomputed);
    }
    scan_source_tables(conn, user_id, fy, section_80tta_limit)
}
