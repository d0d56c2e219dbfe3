//! Loan amortization (§4.9), grounded on
//! `examples/original_source/src/pfas/services/liabilities_service.py`'s
//! EMI formula and per-month interest/principal split.

use chrono::{Datelike, NaiveDate};
use ledger_domain::{LedgerResult, Money, UserId};
use ledger_store::from_rusqlite;
use rust_decimal::Decimal;
use rusqlite::Transaction;

/// `EMI = P·r·(1+r)^n / ((1+r)^n − 1)`, where `r` is the monthly rate
/// (annual_rate / 12 / 100) and `n` the tenure in months.
pub fn emi(principal: Money, annual_rate_percent: Decimal, tenure_months: u32) -> Money {
    if tenure_months == 0 {
        return Money::ZERO;
    }
    let monthly_rate = annual_rate_percent / Decimal::from(1200);
    if monthly_rate.is_zero() {
        return Money::new(principal.raw() / Decimal::from(tenure_months));
    }
    let p: f64 = principal.raw().to_string().parse().unwrap_or(0.0);
    let r: f64 = monthly_rate.to_string().parse().unwrap_or(0.0);
    let n = tenure_months as f64;
    let factor = (1.0 + r).powf(n);
    let emi = p * r * factor / (factor - 1.0);
    Money::new(Decimal::try_from(emi).unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct AmortizationRow {
    pub month: u32,
    pub due_date: NaiveDate,
    pub opening_balance: Money,
    pub interest: Money,
    pub principal: Money,
    pub emi: Money,
    pub closing_balance: Money,
}

/// Per-month amortization schedule for `tenure_months` starting `first_due`.
/// Interest is computed on the opening balance each month; the final row's
/// principal is clamped to the remaining balance to absorb rounding drift.
pub fn amortization_schedule(principal: Money, annual_rate_percent: Decimal, tenure_months: u32, first_due: NaiveDate) -> Vec<AmortizationRow> {
    let monthly_rate = annual_rate_percent / Decimal::from(1200);
    let installment = emi(principal, annual_rate_percent, tenure_months);
    let mut balance = principal;
    let mut rows = Vec::with_capacity(tenure_months as usize);

    for month in 1..=tenure_months {
        let interest = Money::new(balance.raw() * monthly_rate);
        let mut principal_component = installment - interest;
        if month == tenure_months || principal_component.raw() > balance.raw() {
            principal_component = balance;
        }
        let closing = balance - principal_component;
        let due_date = add_months(first_due, month - 1);
        rows.push(AmortizationRow {
            month,
            due_date,
            opening_balance: balance,
            interest,
            principal: principal_component,
            emi: interest + principal_component,
            closing_balance: closing,
        });
        balance = closing;
    }

    rows
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.month0() + months;
    let year = date.year() + (total / 12) as i32;
    let month = total % 12 + 1;
    NaiveDate::from_ymd_opt(year, month, date.day().min(28)).unwrap()
}

/// Applies a prepayment (100% principal, per §4.9) or a disbursement
/// (increases principal) and records the resulting `outstanding_after`.
pub fn record_liability_event(
    tx: &Transaction<'_>,
    user_id: UserId,
    loan_account: &str,
    txn_date: NaiveDate,
    txn_type: &str,
    amount: Money,
    current_outstanding: Money,
) -> LedgerResult<Money> {
    let outstanding_after = match txn_type {
        "Disbursement" => current_outstanding + amount,
        "Prepayment" | "EmiPrincipal" => current_outstanding - amount,
        _ => current_outstanding,
    };

    tx.execute(
        "INSERT INTO liability_transactions (user_id, loan_account, txn_date, txn_type, amount, outstanding_after, source)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id, loan_account, txn_date, txn_type, amount) DO NOTHING",
        rusqlite::params![
            user_id.0,
            loan_account,
            txn_date.to_string(),
            txn_type,
            amount.raw().to_string(),
            outstanding_after.raw().to_string(),
            "valuation",
        ],
    )
    .map_err(from_rusqlite)?;

    Ok(outstanding_after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::Store;
    use rust_decimal_macros::dec;

    #[test]
    fn emi_matches_the_standard_formula_for_a_round_example() {
        let principal = Money::new(dec!(1000000));
        let result = emi(principal, dec!(9.0), 240);
        // Known EMI for 10L @ 9% / 20yr is ~8997.26.
        let value: f64 = result.raw().to_string().parse().unwrap();
        assert!((value - 8997.26).abs() < 1.0, "got {value}");
    }

    #[test]
    fn amortization_schedule_fully_pays_off_the_loan() {
        let principal = Money::new(dec!(500000));
        let rows = amortization_schedule(principal, dec!(10.0), 12, NaiveDate::from_ymd_opt(2024, 4, 5).unwrap());
        assert_eq!(rows.len(), 12);
        assert!(rows.last().unwrap().closing_balance.raw().abs() < dec!(1));
    }

    #[test]
    fn prepayment_reduces_outstanding_by_the_full_amount() {
        let store = Store::open_in_memory().unwrap();
        let remaining = store
            .with_tx(|tx| {
                record_liability_event(tx, UserId(1), "HL1", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "Disbursement", Money::new(dec!(1000000)), Money::ZERO)?;
                record_liability_event(tx, UserId(1), "HL1", NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), "Prepayment", Money::new(dec!(200000)), Money::new(dec!(1000000)))
            })
            .unwrap();
        assert_eq!(remaining, Money::new(dec!(800000)));
    }
}
