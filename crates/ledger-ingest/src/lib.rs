//! # ledger-ingest
//!
//! Atomic batch ingestion: maps a directory of CAMS/Karvy/Zerodha/ICICI/
//! NSDL/PPF/bank-statement files onto [`ledger_parsers`]'s per-format
//! parsers, dedups against what has already been ingested, and folds
//! every parsed record into the [`ledger_txservice`] write path.
//!
//! - `hash`: MD5 file-content hashing for the dedup check
//! - `dispatch`: format/RTA detection for a file
//! - `tracking`: `processed_files` / `batch_runs` bookkeeping
//! - `writer`: maps one parsed record to a transaction-service write
//! - `batch`: the orchestration loop tying the above together

pub mod batch;
pub mod dispatch;
pub mod hash;
pub mod tracking;
pub mod writer;

pub use batch::{ingest_batch, BatchOptions, BatchOutcome, FileJob, FileOutcome};
pub use dispatch::{resolve_format, Format, SourceHint};
pub use hash::hash_file;
pub use tracking::{BatchStatus, FileStatus};
pub use writer::IngestContext;
