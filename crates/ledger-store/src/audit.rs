//! Audit-log insertion. Every mutation to a tracked table writes exactly
//! one row here, in the same transaction as the mutation itself (§4.1,
//! §7): a rolled-back write leaves no audit trace, and a committed write
//! never lacks one.

use ledger_domain::{LedgerResult, UserId};
use rusqlite::Transaction;
use serde::Serialize;

use crate::error::MapRusqlite;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Insert,
    Update,
    Delete,
}

impl AuditAction {
    fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Insert => "INSERT",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

/// Appends one row to `audit_log`. `old_values`/`new_values` are
/// serialized to JSON; pass `None` for `old_values` on an insert and
/// `None` for `new_values` on a delete.
pub fn record<T: Serialize>(
    tx: &Transaction<'_>,
    user_id: UserId,
    table_name: &str,
    record_id: impl ToString,
    action: AuditAction,
    old_values: Option<&T>,
    new_values: Option<&T>,
    source: &str,
) -> LedgerResult<()> {
    let old_json = old_values
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| ledger_domain::LedgerError::StorageError(e.to_string()))?;
    let new_json = new_values
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| ledger_domain::LedgerError::StorageError(e.to_string()))?;

    tx.execute(
        "INSERT INTO audit_log (user_id, table_name, record_id, action, old_values, new_values, source, at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            user_id.0,
            table_name,
            record_id.to_string(),
            action.as_str(),
            old_json,
            new_json,
            source,
            chrono::Utc::now().to_rfc3339(),
        ],
    )
    .store_err()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use serde_json::json;

    #[test]
    fn records_an_audit_row_in_the_same_transaction() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                record(
                    tx,
                    UserId(1),
                    "journals",
                    42,
                    AuditAction::Insert,
                    None::<&serde_json::Value>,
                    Some(&json!({"amount": "100.00"})),
                    "test",
                )
            })
            .unwrap();

        let conn = store.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM audit_log WHERE table_name = 'journals'", [], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }
}
