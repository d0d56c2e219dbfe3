//! Assertion helpers for the double-entry invariant (§4.2, §8) and the
//! accounting equation, usable both on a constructed [`Journal`] and on
//! a raw `&[JournalLeg]` before it has been handed to `Journal::new`.

use ledger_domain::{Money, MONEY_TOLERANCE};
use ledger_journal::JournalLeg;
use rust_decimal::Decimal;

/// Assert that a set of journal legs is balanced (debits equal credits
/// within `MONEY_TOLERANCE`).
#[macro_export]
macro_rules! assert_balanced {
    ($legs:expr) => {{
        let legs = &$legs;
        let (debits, credits) = $crate::assertions::leg_totals(legs);
        assert!(
            debits.approx_eq(&credits),
            "journal legs are not balanced: debits={:?}, credits={:?}",
            debits,
            credits
        );
    }};
}

/// Assert that every journal in a collection is individually balanced.
#[macro_export]
macro_rules! assert_all_balanced {
    ($journals:expr) => {{
        for (i, journal) in $journals.iter().enumerate() {
            assert!(
                journal.check_balanced().is_ok(),
                "journal {} is not balanced: debits={:?}, credits={:?}",
                i,
                journal.total_debits(),
                journal.total_credits()
            );
        }
    }};
}

pub fn leg_totals(legs: &[JournalLeg]) -> (Money, Money) {
    let debits = legs.iter().fold(Money::ZERO, |acc, leg| acc + leg.debit);
    let credits = legs.iter().fold(Money::ZERO, |acc, leg| acc + leg.credit);
    (debits, credits)
}

pub fn is_balanced(legs: &[JournalLeg]) -> bool {
    let (debits, credits) = leg_totals(legs);
    debits.approx_eq(&credits)
}

pub fn imbalance(legs: &[JournalLeg]) -> Money {
    let (debits, credits) = leg_totals(legs);
    debits - credits
}

/// Assets = Liabilities + Equity, the invariant every balance-sheet
/// snapshot is expected to hold.
pub fn check_accounting_equation(total_assets: Decimal, total_liabilities: Decimal, total_equity: Decimal) -> bool {
    (total_assets - (total_liabilities + total_equity)).abs() <= MONEY_TOLERANCE
}

/// Verify a trial balance: every posted debit total equals every posted
/// credit total across the whole ledger, not just within one journal.
pub fn check_trial_balance(debit_balances: &[Decimal], credit_balances: &[Decimal]) -> bool {
    let total_debits: Decimal = debit_balances.iter().copied().sum();
    let total_credits: Decimal = credit_balances.iter().copied().sum();
    (total_debits - total_credits).abs() <= MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{mf_purchase_journal, unbalanced_legs};
    use rust_decimal_macros::dec;

    #[test]
    fn assert_balanced_accepts_a_balanced_journals_legs() {
        let journal = mf_purchase_journal(dec!(10000.00), "test-key-a").unwrap();
        assert_balanced!(journal.legs);
    }

    #[test]
    fn is_balanced_rejects_unbalanced_legs() {
        let legs = unbalanced_legs(dec!(1000.00), dec!(999.00));
        assert!(!is_balanced(&legs));
        assert_ne!(imbalance(&legs), Money::ZERO);
    }

    #[test]
    fn assert_all_balanced_accepts_several_journals() {
        let journals = [
            mf_purchase_journal(dec!(10000.00), "test-key-b").unwrap(),
            mf_purchase_journal(dec!(20000.00), "test-key-c").unwrap(),
        ];
        assert_all_balanced!(journals);
    }

    #[test]
    fn accounting_equation_holds_within_tolerance() {
        assert!(check_accounting_equation(dec!(1000), dec!(600), dec!(400)));
        assert!(!check_accounting_equation(dec!(1000), dec!(600), dec!(300)));
    }

    #[test]
    fn trial_balance_checks_total_debits_against_total_credits() {
        let debits = [dec!(1000), dec!(500)];
        let credits = [dec!(1500)];
        assert!(check_trial_balance(&debits, &credits));
        assert!(!check_trial_balance(&debits, &[dec!(1000)]));
    }
}
