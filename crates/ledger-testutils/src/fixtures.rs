//! Pre-built fixtures for the ledger's own test suites: a journal that
//! balances by construction, a chart of accounts, a cost-basis lot, and
//! a golden-reference holding row.

use chrono::NaiveDate;
use ledger_costbasis::Lot;
use ledger_domain::{AccountCode, AssetClass, LedgerResult, LotId, Money, UserId, Units};
use ledger_journal::{ChartOfAccounts, Journal, JournalLeg};
use rust_decimal::Decimal;

pub fn test_user() -> UserId {
    UserId(1)
}

pub fn sample_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
}

pub fn test_chart() -> ChartOfAccounts {
    ChartOfAccounts::standard()
}

/// A two-leg journal that balances by construction: debit the equity MF
/// holding account, credit the bank account, for `amount`.
pub fn mf_purchase_journal(amount: Decimal, idempotency_key: &str) -> LedgerResult<Journal> {
    Journal::simple(
        test_user(),
        sample_date(),
        "MF purchase",
        "CAMS",
        idempotency_key,
        "mf_transactions",
        AccountCode::new("1201"),
        AccountCode::new("1101"),
        Money::new(amount),
    )
}

/// Legs that do *not* balance, built directly (bypassing `Journal::new`,
/// which would reject them) for exercising `assert_balanced!` and
/// `is_balanced` against a pre-journal leg set.
pub fn unbalanced_legs(debit_amount: Decimal, credit_amount: Decimal) -> Vec<JournalLeg> {
    vec![
        JournalLeg::debit(AccountCode::new("1201"), Money::new(debit_amount), None),
        JournalLeg::credit(AccountCode::new("1101"), Money::new(credit_amount), None),
    ]
}

/// An open lot with `units` still remaining, acquired at `cost_per_unit`.
pub fn sample_lot(id: i64, asset_type: AssetClass, symbol: &str, acquisition_date: NaiveDate, units: Decimal, cost_per_unit: Decimal) -> Lot {
    Lot {
        id: LotId(id),
        user_id: test_user(),
        asset_type,
        symbol: symbol.to_string(),
        acquisition_date,
        units_acquired: Units::new(units),
        units_remaining: Units::new(units),
        cost_per_unit: Money::new(cost_per_unit),
        total_cost: Money::new(units * cost_per_unit),
        currency: "INR".to_string(),
        reference: None,
    }
}

/// A pre-01-Feb-2018 equity lot, for exercising the grandfathering rule.
pub fn grandfathered_equity_lot(id: i64, symbol: &str, units: Decimal, cost_per_unit: Decimal) -> Lot {
    sample_lot(id, AssetClass::EquityMutualFund, symbol, NaiveDate::from_ymd_opt(2016, 6, 1).unwrap(), units, cost_per_unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn mf_purchase_journal_balances() {
        let journal = mf_purchase_journal(dec!(10000.00), "test-key-1").unwrap();
        assert_eq!(journal.total_debits(), journal.total_credits());
    }

    #[test]
    fn test_chart_has_the_standard_accounts() {
        let chart = test_chart();
        assert!(chart.contains(&AccountCode::new("1101")));
        assert!(chart.contains(&AccountCode::new("1201")));
    }

    #[test]
    fn sample_lot_starts_fully_unremained() {
        let lot = sample_lot(1, AssetClass::EquityMutualFund, "ABC FUND", sample_date(), dec!(100), dec!(10.00));
        assert_eq!(lot.units_acquired, lot.units_remaining);
    }
}
