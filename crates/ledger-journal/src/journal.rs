//! Double-entry journal construction and the balance invariant (§4.2,
//! §8: "every posted journal's debits equal its credits within
//! tolerance").

use chrono::NaiveDate;
use ledger_domain::{AccountCode, LedgerError, LedgerResult, Money, UserId};

/// One leg of a journal: a debit or credit against an account. Exactly
/// one of `debit`/`credit` is non-zero; both fields exist (rather than a
/// signed amount) because that is how the underlying `journal_entries`
/// table is shaped and how the teacher's generators modeled a posting
/// line.
#[derive(Debug, Clone)]
pub struct JournalLeg {
    pub account_code: AccountCode,
    pub debit: Money,
    pub credit: Money,
    pub narration: Option<String>,
}

impl JournalLeg {
    pub fn debit(account_code: AccountCode, amount: Money, narration: impl Into<Option<String>>) -> Self {
        JournalLeg {
            account_code,
            debit: amount,
            credit: Money::ZERO,
            narration: narration.into(),
        }
    }

    pub fn credit(account_code: AccountCode, amount: Money, narration: impl Into<Option<String>>) -> Self {
        JournalLeg {
            account_code,
            debit: Money::ZERO,
            credit: amount,
            narration: narration.into(),
        }
    }
}

/// An unposted journal: a balanced set of legs ready to be persisted.
/// `source` names the ingestion pipeline or subsystem that produced it
/// (e.g. `"CAMS"`, `"capital_gains"`, `"reconciliation"`); the
/// idempotency key is the caller's natural-key derivation and is what
/// `ledger_store::idempotency::find_journal_by_key` dedups on.
#[derive(Debug, Clone)]
pub struct Journal {
    pub user_id: UserId,
    pub txn_date: NaiveDate,
    pub description: String,
    pub source: String,
    pub idempotency_key: String,
    pub reference_type: String,
    pub legs: Vec<JournalLeg>,
}

impl Journal {
    /// Builds a journal from its legs, rejecting it up front if debits
    /// and credits don't balance within `MONEY_TOLERANCE`. A journal that
    /// fails this check is never handed to the store.
    pub fn new(
        user_id: UserId,
        txn_date: NaiveDate,
        description: impl Into<String>,
        source: impl Into<String>,
        idempotency_key: impl Into<String>,
        reference_type: impl Into<String>,
        legs: Vec<JournalLeg>,
    ) -> LedgerResult<Self> {
        let journal = Journal {
            user_id,
            txn_date,
            description: description.into(),
            source: source.into(),
            idempotency_key: idempotency_key.into(),
            reference_type: reference_type.into(),
            legs,
        };
        journal.check_balanced()?;
        Ok(journal)
    }

    pub fn total_debits(&self) -> Money {
        self.legs.iter().fold(Money::ZERO, |acc, leg| acc + leg.debit)
    }

    pub fn total_credits(&self) -> Money {
        self.legs.iter().fold(Money::ZERO, |acc, leg| acc + leg.credit)
    }

    pub fn check_balanced(&self) -> LedgerResult<()> {
        if self.legs.is_empty() {
            return Err(LedgerError::invalid("journal must have at least one leg"));
        }
        let debits = self.total_debits();
        let credits = self.total_credits();
        if !debits.approx_eq(&credits) || debits.is_zero() {
            return Err(LedgerError::UnbalancedJournal {
                debits: debits.raw(),
                credits: credits.raw(),
                tolerance: ledger_domain::MONEY_TOLERANCE,
            });
        }
        Ok(())
    }

    /// A two-leg journal: the common case of one debit account and one
    /// credit account for the same amount.
    pub fn simple(
        user_id: UserId,
        txn_date: NaiveDate,
        description: impl Into<String>,
        source: impl Into<String>,
        idempotency_key: impl Into<String>,
        reference_type: impl Into<String>,
        debit_account: AccountCode,
        credit_account: AccountCode,
        amount: Money,
    ) -> LedgerResult<Self> {
        Journal::new(
            user_id,
            txn_date,
            description,
            source,
            idempotency_key,
            reference_type,
            vec![
                JournalLeg::debit(debit_account, amount, None),
                JournalLeg::credit(credit_account, amount, None),
            ],
        )
    }
}
