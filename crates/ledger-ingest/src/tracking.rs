//! `processed_files` / `batch_runs` bookkeeping (§4.6), grounded on the
//! original `BatchIngester`'s status columns: a file is PENDING only in
//! memory during processing, and only SUCCESS/FAILED/SKIPPED are ever
//! persisted once its row lands.

use ledger_domain::{LedgerResult, UserId};
use ledger_store::from_rusqlite;
use rusqlite::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Success,
    Failed,
    Skipped,
}

impl FileStatus {
    fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Success => "SUCCESS",
            FileStatus::Failed => "FAILED",
            FileStatus::Skipped => "SKIPPED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Processing,
    Success,
    Failed,
    RolledBack,
}

impl BatchStatus {
    fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Processing => "PROCESSING",
            BatchStatus::Success => "SUCCESS",
            BatchStatus::Failed => "FAILED",
            BatchStatus::RolledBack => "ROLLED_BACK",
        }
    }
}

pub fn insert_processed_file(
    tx: &Transaction<'_>,
    user_id: UserId,
    batch_id: &str,
    file_hash: &str,
    parser: &str,
    records_count: usize,
    status: FileStatus,
) -> LedgerResult<()> {
    tx.execute(
        "INSERT INTO processed_files (file_hash, user_id, batch_id, parser, records_count, status, processed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            file_hash,
            user_id.0,
            batch_id,
            parser,
            records_count as i64,
            status.as_str(),
            chrono::Utc::now().to_rfc3339(),
        ],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

pub fn insert_batch_run(
    tx: &Transaction<'_>,
    user_id: UserId,
    batch_id: &str,
    files_count: usize,
    status: BatchStatus,
) -> LedgerResult<()> {
    tx.execute(
        "INSERT INTO batch_runs (batch_id, user_id, files_count, records_count, status, started_at, completed_at)
         VALUES (?1, ?2, ?3, 0, ?4, ?5, NULL)",
        rusqlite::params![batch_id, user_id.0, files_count as i64, status.as_str(), chrono::Utc::now().to_rfc3339()],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

pub fn finish_batch_run(
    tx: &Transaction<'_>,
    batch_id: &str,
    records_count: usize,
    status: BatchStatus,
) -> LedgerResult<()> {
    tx.execute(
        "UPDATE batch_runs SET records_count = ?1, status = ?2, completed_at = ?3 WHERE batch_id = ?4",
        rusqlite::params![records_count as i64, status.as_str(), chrono::Utc::now().to_rfc3339(), batch_id],
    )
    .map_err(from_rusqlite)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_store::Store;

    #[test]
    fn records_a_processed_file_and_a_batch_run() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                insert_batch_run(tx, UserId(1), "batch-1", 1, BatchStatus::Processing)?;
                insert_processed_file(tx, UserId(1), "batch-1", "abc123", "cams", 5, FileStatus::Success)?;
                finish_batch_run(tx, "batch-1", 5, BatchStatus::Success)
            })
            .unwrap();

        let conn = store.conn().unwrap();
        let status: String = conn
            .query_row("SELECT status FROM batch_runs WHERE batch_id = 'batch-1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(status, "SUCCESS");
        let file_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM processed_files WHERE file_hash = 'abc123'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(file_count, 1);
    }
}
