//! In-memory balance tracking for tests that want to verify posted legs
//! without standing up a real `Store`.

use std::collections::HashMap;

use ledger_domain::{AccountCode, Money};
use ledger_journal::JournalLeg;

/// Accumulates debit-minus-credit per account across any number of
/// applied leg sets, the same running-balance idea
/// `ledger_valuation::balance_sheet::latest_bank_balance` uses against
/// real rows, just kept in memory for a unit test.
#[derive(Default)]
pub struct BalanceTracker {
    balances: HashMap<AccountCode, Money>,
}

impl BalanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &AccountCode) -> Money {
        self.balances.get(account).copied().unwrap_or(Money::ZERO)
    }

    pub fn apply_legs(&mut self, legs: &[JournalLeg]) {
        for leg in legs {
            let net = leg.debit - leg.credit;
            let entry = self.balances.entry(leg.account_code.clone()).or_insert(Money::ZERO);
            *entry += net;
        }
    }

    pub fn total_debit_balances(&self) -> Money {
        self.balances.values().filter(|m| m.raw() > rust_decimal::Decimal::ZERO).fold(Money::ZERO, |acc, m| acc + *m)
    }

    pub fn total_credit_balances(&self) -> Money {
        self.balances.values().filter(|m| m.raw() < rust_decimal::Decimal::ZERO).fold(Money::ZERO, |acc, m| acc + m.abs())
    }

    pub fn clear(&mut self) {
        self.balances.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::mf_purchase_journal;
    use rust_decimal_macros::dec;

    #[test]
    fn apply_legs_nets_debits_and_credits_per_account() {
        let journal = mf_purchase_journal(dec!(10000.00), "test-key-d").unwrap();
        let mut tracker = BalanceTracker::new();
        tracker.apply_legs(&journal.legs);

        assert_eq!(tracker.balance(&AccountCode::new("1201")), Money::new(dec!(10000.00)));
        assert_eq!(tracker.balance(&AccountCode::new("1101")), Money::new(dec!(-10000.00)));
    }

    #[test]
    fn total_debit_and_credit_balances_stay_equal_for_a_balanced_journal() {
        let journal = mf_purchase_journal(dec!(5000.00), "test-key-e").unwrap();
        let mut tracker = BalanceTracker::new();
        tracker.apply_legs(&journal.legs);

        assert_eq!(tracker.total_debit_balances(), tracker.total_credit_balances());
    }
}
