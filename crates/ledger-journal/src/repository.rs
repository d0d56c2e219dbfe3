//! Persists a [`Journal`] through a [`Store`] transaction: idempotency
//! check, the `journals` row, its `journal_entries` legs, and the audit
//! log entry, all inside one `with_tx` unit of work (§4.1, §4.2, §4.4).

use ledger_domain::{JournalId, LedgerResult};
use ledger_store::{AuditAction, Store};
use serde::Serialize;

use crate::journal::Journal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    Inserted(JournalId),
    AlreadyPosted(JournalId),
}

impl PostOutcome {
    pub fn journal_id(&self) -> JournalId {
        match self {
            PostOutcome::Inserted(id) | PostOutcome::AlreadyPosted(id) => *id,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, PostOutcome::AlreadyPosted(_))
    }
}

#[derive(Serialize)]
struct JournalAuditPayload<'a> {
    description: &'a str,
    source: &'a str,
    total_debits: String,
    total_credits: String,
    legs: usize,
}

/// Posts `journal` idempotently: a prior journal under the same
/// `(user_id, idempotency_key)` is returned as-is rather than posted
/// again.
pub fn post(store: &Store, journal: &Journal) -> LedgerResult<PostOutcome> {
    journal.check_balanced()?;
    store.with_tx(|tx| post_in_tx(tx, journal))
}

/// The same idempotent insert as [`post`], but against an
/// already-open transaction so a caller (the transaction service) can
/// share it with asset-row writes and lot depletion (§5's ordering
/// guarantee: lots deplete strictly after the journal insert for that
/// sell, in the same transaction).
pub fn post_in_tx(tx: &rusqlite::Transaction<'_>, journal: &Journal) -> LedgerResult<PostOutcome> {
    journal.check_balanced()?;

    if let Some(existing) =
        ledger_store::find_journal_by_key(tx, journal.user_id, &journal.idempotency_key)?
    {
        return Ok(PostOutcome::AlreadyPosted(existing));
    }

    tx.execute(
        "INSERT INTO journals (user_id, txn_date, description, source, idempotency_key, reference_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            journal.user_id.0,
            journal.txn_date.to_string(),
            journal.description,
            journal.source,
            journal.idempotency_key,
            journal.reference_type,
            chrono::Utc::now().to_rfc3339(),
        ],
    )
    .map_err(ledger_store::from_rusqlite)?;
    let journal_id = JournalId(tx.last_insert_rowid());

    for leg in &journal.legs {
        tx.execute(
            "INSERT INTO journal_entries (journal_id, account_code, debit, credit, narration)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                journal_id.0,
                leg.account_code.0,
                leg.debit.raw().to_string(),
                leg.credit.raw().to_string(),
                leg.narration,
            ],
        )
        .map_err(ledger_store::from_rusqlite)?;
    }

    ledger_store::record_audit(
        tx,
        journal.user_id,
        "journals",
        journal_id.0,
        AuditAction::Insert,
        None::<&JournalAuditPayload>,
        Some(&JournalAuditPayload {
            description: &journal.description,
            source: &journal.source,
            total_debits: journal.total_debits().to_string(),
            total_credits: journal.total_credits().to_string(),
            legs: journal.legs.len(),
        }),
        &journal.source,
    )?;

    Ok(PostOutcome::Inserted(journal_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::JournalLeg;
    use chrono::NaiveDate;
    use ledger_domain::{AccountCode, Money, UserId};
    use rust_decimal_macros::dec;

    fn sample_journal(key: &str) -> Journal {
        Journal::new(
            UserId(1),
            NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            "MF purchase",
            "CAMS",
            key,
            "mf_transactions",
            vec![
                JournalLeg::debit(AccountCode::new("1201:F1"), Money::new(dec!(1000.00)), None),
                JournalLeg::credit(AccountCode::new("1101"), Money::new(dec!(1000.00)), None),
            ],
        )
        .unwrap()
    }

    #[test]
    fn posting_twice_with_the_same_key_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let first = post(&store, &sample_journal("cams:F1:2024-04-15:1000")).unwrap();
        let second = post(&store, &sample_journal("cams:F1:2024-04-15:1000")).unwrap();
        assert!(!first.is_duplicate());
        assert!(second.is_duplicate());
        assert_eq!(first.journal_id(), second.journal_id());

        let conn = store.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM journals", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn posting_writes_one_audit_row() {
        let store = Store::open_in_memory().unwrap();
        post(&store, &sample_journal("key-a")).unwrap();
        let conn = store.conn().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM audit_log WHERE table_name = 'journals'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
