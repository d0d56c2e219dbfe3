//! Idempotency-key lookups for the journal write path (§4.4). A journal
//! is keyed by `(user_id, idempotency_key)`; re-posting the same key
//! returns the original journal id instead of creating a second entry.

use ledger_domain::{JournalId, LedgerResult, UserId};
use rusqlite::{OptionalExtension, Transaction};

use crate::error::MapRusqlite;

/// Looks up a journal previously posted under `idempotency_key` for this
/// user, if any.
pub fn find_journal_by_key(
    tx: &Transaction<'_>,
    user_id: UserId,
    idempotency_key: &str,
) -> LedgerResult<Option<JournalId>> {
    tx.query_row(
        "SELECT id FROM journals WHERE user_id = ?1 AND idempotency_key = ?2",
        rusqlite::params![user_id.0, idempotency_key],
        |row| row.get::<_, i64>(0),
    )
    .optional()
    .store_err()
    .map(|opt| opt.map(JournalId))
}

/// Whether a source file has already been ingested for this user,
/// keyed by its content hash (§4.9 — idempotent file-level dedup).
pub fn file_already_processed(
    tx: &Transaction<'_>,
    user_id: UserId,
    file_hash: &str,
) -> LedgerResult<bool> {
    tx.query_row(
        "SELECT 1 FROM processed_files WHERE user_id = ?1 AND file_hash = ?2",
        rusqlite::params![user_id.0, file_hash],
        |row| row.get::<_, i64>(0),
    )
    .optional()
    .store_err()
    .map(|opt| opt.is_some())
}
