//! Batch ingestion orchestration (§4.6): one `FileJob` per input file,
//! processed in order, each producing a [`FileOutcome`]; bookkeeping
//! (`processed_files`, `batch_runs`) is committed in one trailing
//! transaction once every file has been attempted.
//!
//! **Deviation from the original single-transaction algorithm.** The
//! original ingester wraps the *entire* batch — every row write
//! included — in one `BEGIN IMMEDIATE` so a `stop_on_error` abort rolls
//! every file's writes back too. `ledger_txservice::record` is this
//! workspace's sole write path and deliberately never exposes its
//! `rusqlite::Transaction` to a caller (every multi-statement write goes
//! through `Store::with_tx`, which is the only place one gets
//! constructed) — so a batch of many records can't be nested inside one
//! larger transaction without breaking that invariant. Since every
//! write here is already idempotent (file-hash dedup, the journal
//! idempotency key, and each asset table's natural-key `ON CONFLICT`),
//! re-running an aborted batch is always safe: already-committed files
//! are skipped, and the remainder picks up where it left off. A
//! `stop_on_error` abort therefore halts the loop immediately rather
//! than unwinding prior commits. Only `processed_files`/`batch_runs`
//! bookkeeping — and, in dry-run mode, every domain write — gets the
//! literal rollback semantics the original describes.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use ledger_domain::{LedgerResult, UserId};
use ledger_store::Store;

use crate::dispatch::{resolve_format, Format, SourceHint};
use crate::hash::hash_file;
use crate::tracking::{finish_batch_run, insert_batch_run, insert_processed_file, BatchStatus, FileStatus};
use crate::writer::IngestContext;

pub struct FileJob {
    pub path: PathBuf,
    pub hint: SourceHint,
    pub password: Option<String>,
    pub account_number: Option<String>,
    pub bank: Option<String>,
}

pub struct BatchOptions {
    pub stop_on_error: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: String,
    pub status: FileStatus,
    pub records_written: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub batch_id: String,
    pub status: BatchStatus,
    pub files: Vec<FileOutcome>,
    pub records_count: usize,
}

fn process_one_file(store: &Store, ctx: &IngestContext, job: &FileJob, dry_run: bool) -> LedgerResult<(String, FileOutcome)> {
    let file_hash = hash_file(&job.path)?;
    let path_str = job.path.display().to_string();

    let already = store.with_tx(|tx| ledger_store::file_already_processed(tx, ctx.user_id, &file_hash))?;
    if already {
        return Ok((
            file_hash,
            FileOutcome { path: path_str, status: FileStatus::Skipped, records_written: 0, errors: Vec::new() },
        ));
    }

    let Some(format) = resolve_format(&job.path, job.hint) else {
        return Ok((
            file_hash,
            FileOutcome {
                path: path_str,
                status: FileStatus::Failed,
                records_written: 0,
                errors: vec!["no parser for this file".to_string()],
            },
        ));
    };

    let parse_result = parse_file(&job.path, format, job)?;
    if !parse_result.success {
        return Ok((
            file_hash,
            FileOutcome { path: path_str, status: FileStatus::Failed, records_written: 0, errors: parse_result.errors },
        ));
    }

    let mut errors = parse_result.warnings;
    let mut written = 0usize;
    if dry_run {
        // Dry run: parsing and validation already happened above; skip the
        // writer entirely so nothing is persisted, rather than writing and
        // rolling back — `ledger_txservice::record` always commits, and
        // re-exposing its transaction just to undo it would break the
        // single-writer invariant the rest of this crate relies on.
        written = parse_result.records.len();
    } else {
        for record in &parse_result.records {
            match write_one(store, ctx, record) {
                Ok(_) => written += 1,
                Err(e) => errors.push(e.to_string()),
            }
        }
    }

    Ok((
        file_hash,
        FileOutcome { path: path_str, status: FileStatus::Success, records_written: written, errors },
    ))
}

struct ParsedFile {
    success: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
    records: Vec<ledger_parsers::ParsedRecord>,
}

fn parse_file(path: &Path, format: Format, job: &FileJob) -> LedgerResult<ParsedFile> {
    let result = match format {
        Format::Cams => ledger_parsers::cams::parse(path)?,
        Format::Karvy => ledger_parsers::karvy::parse(path)?,
        Format::Zerodha => ledger_parsers::zerodha::parse(path)?,
        Format::Icici => ledger_parsers::icici::parse(path)?,
        Format::NsdlCas => ledger_parsers::nsdl_cas::parse(path, job.password.as_deref())?,
        Format::Ppf => ledger_parsers::ppf::parse(path, job.account_number.as_deref().unwrap_or_default())?,
        Format::Bank => ledger_parsers::bank::parse(
            path,
            job.account_number.as_deref().and_then(|s| s.parse().ok()).unwrap_or(0),
            job.bank.as_deref().unwrap_or("UNKNOWN"),
            job.account_number.as_deref(),
        )?,
    };
    Ok(ParsedFile {
        success: result.success,
        errors: result.errors,
        warnings: result.warnings,
        records: result.records,
    })
}

fn write_one(store: &Store, ctx: &IngestContext, record: &ledger_parsers::ParsedRecord) -> LedgerResult<()> {
    use ledger_parsers::ParsedRecord;
    match record {
        ParsedRecord::MfTransaction(r) => crate::writer::write_mf_transaction(store, ctx, r).map(|_| ()),
        ParsedRecord::StockTrade(r) => crate::writer::write_stock_trade(store, ctx, r).map(|_| ()),
        ParsedRecord::PpfTransaction(r) => crate::writer::write_ppf_transaction(store, ctx, r).map(|_| ()),
        ParsedRecord::BankTransaction(r) => crate::writer::write_bank_transaction(store, ctx, r).map(|_| ()),
        ParsedRecord::GoldenHolding(_) => {
            // Golden-reference holdings belong to the reconciliation engine's
            // own store, not the transactional write path — nothing to do here.
            Ok(())
        }
    }
}

/// Ingests `jobs` in order (§4.6, §5's "files are processed in the
/// order presented" guarantee). Returns the outcome for the whole
/// batch; panics inside a single file's parse/write are caught and
/// surfaced as that file's `FAILED` outcome with the panic message,
/// matching "on unexpected panics...the batch [is] marked FAILED with
/// the panic message" without poisoning the rest of the batch.
pub fn ingest_batch(store: &Store, user_id: UserId, batch_id: &str, jobs: &[FileJob], options: BatchOptions) -> LedgerResult<BatchOutcome> {
    let ctx = IngestContext {
        user_id,
        source: "BATCH",
        cost_basis_method: ledger_costbasis::CostBasisMethod::Fifo,
    };

    let mut outcomes = Vec::with_capacity(jobs.len());
    let mut records_count = 0usize;
    let mut aborted = false;

    for job in jobs {
        let outcome = match catch_unwind(AssertUnwindSafe(|| process_one_file(store, &ctx, job, options.dry_run))) {
            Ok(Ok((hash, outcome))) => Some((hash, outcome)),
            Ok(Err(e)) => Some((
                String::new(),
                FileOutcome {
                    path: job.path.display().to_string(),
                    status: FileStatus::Failed,
                    records_written: 0,
                    errors: vec![e.to_string()],
                },
            )),
            Err(panic) => {
                let message = panic_message(&panic);
                Some((
                    String::new(),
                    FileOutcome {
                        path: job.path.display().to_string(),
                        status: FileStatus::Failed,
                        records_written: 0,
                        errors: vec![format!("panic: {message}")],
                    },
                ))
            }
        };

        if let Some((hash, outcome)) = outcome {
            records_count += outcome.records_written;
            let failed = outcome.status == FileStatus::Failed;
            outcomes.push((hash, outcome));
            if failed && options.stop_on_error {
                aborted = true;
                break;
            }
        }
    }

    let status = if options.dry_run {
        BatchStatus::RolledBack
    } else if aborted {
        BatchStatus::Failed
    } else {
        BatchStatus::Success
    };

    if !options.dry_run {
        store.with_tx(|tx| {
            insert_batch_run(tx, user_id, batch_id, jobs.len(), BatchStatus::Processing)?;
            for (hash, outcome) in &outcomes {
                if hash.is_empty() {
                    continue;
                }
                let parser_label = format!("{:?}", outcome.status);
                insert_processed_file(tx, user_id, batch_id, hash, &parser_label, outcome.records_written, outcome.status)?;
            }
            finish_batch_run(tx, batch_id, records_count, status)
        })?;
    }

    Ok(BatchOutcome {
        batch_id: batch_id.to_string(),
        status,
        files: outcomes.into_iter().map(|(_, o)| o).collect(),
        records_count,
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ppf_job(dir: &tempfile::TempDir, account: &str, rows: &[&str]) -> FileJob {
        let path = dir.path().join(format!("{account}.csv"));
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Date,Amount,Description,Balance").unwrap();
        for row in rows {
            writeln!(f, "{row}").unwrap();
        }
        FileJob {
            path,
            hint: SourceHint::Ppf,
            password: None,
            account_number: Some(account.to_string()),
            bank: None,
        }
    }

    #[test]
    fn ingests_a_single_ppf_file_and_records_it_as_processed() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let job = ppf_job(&dir, "PPF001", &["15-04-2024,5000,Deposit,5000"]);

        let outcome = ingest_batch(
            &store,
            UserId(1),
            "batch-1",
            &[job],
            BatchOptions { stop_on_error: true, dry_run: false },
        )
        .unwrap();

        assert_eq!(outcome.status, BatchStatus::Success);
        assert_eq!(outcome.records_count, 1);

        let conn = store.conn().unwrap();
        let processed: i64 = conn.query_row("SELECT COUNT(*) FROM processed_files", [], |r| r.get(0)).unwrap();
        assert_eq!(processed, 1);
        let journals: i64 = conn.query_row("SELECT COUNT(*) FROM journals", [], |r| r.get(0)).unwrap();
        assert_eq!(journals, 1);
    }

    #[test]
    fn re_ingesting_the_same_file_is_skipped() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let job = ppf_job(&dir, "PPF002", &["15-04-2024,5000,Deposit,5000"]);
        let job2 = ppf_job(&dir, "PPF002", &["15-04-2024,5000,Deposit,5000"]);

        ingest_batch(&store, UserId(1), "batch-1", &[job], BatchOptions { stop_on_error: true, dry_run: false }).unwrap();
        let second = ingest_batch(&store, UserId(1), "batch-2", &[job2], BatchOptions { stop_on_error: true, dry_run: false }).unwrap();

        assert_eq!(second.files[0].status, FileStatus::Skipped);
    }

    #[test]
    fn dry_run_parses_but_writes_nothing() {
        let store = Store::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let job = ppf_job(&dir, "PPF003", &["15-04-2024,5000,Deposit,5000"]);

        let outcome = ingest_batch(&store, UserId(1), "batch-1", &[job], BatchOptions { stop_on_error: true, dry_run: true }).unwrap();
        assert_eq!(outcome.status, BatchStatus::RolledBack);

        let conn = store.conn().unwrap();
        let journals: i64 = conn.query_row("SELECT COUNT(*) FROM journals", [], |r| r.get(0)).unwrap();
        assert_eq!(journals, 0);
        let processed: i64 = conn.query_row("SELECT COUNT(*) FROM processed_files", [], |r| r.get(0)).unwrap();
        assert_eq!(processed, 0);
    }

    #[test]
    fn a_missing_file_is_recorded_as_failed() {
        let store = Store::open_in_memory().unwrap();
        let job = FileJob {
            path: PathBuf::from("/no/such/file.csv"),
            hint: SourceHint::Ppf,
            password: None,
            account_number: Some("PPF004".to_string()),
            bank: None,
        };

        let outcome = ingest_batch(&store, UserId(1), "batch-1", &[job], BatchOptions { stop_on_error: true, dry_run: false }).unwrap();
        assert_eq!(outcome.status, BatchStatus::Failed);
        assert_eq!(outcome.files[0].status, FileStatus::Failed);
    }
}
