//! The single transactional store (§4.1): schema migrations, a pooled
//! `Store` handle, the audit log, idempotency-key lookups, and a generic
//! natural-key upsert for the denormalized asset tables.

pub mod asset_rows;
pub mod audit;
pub mod error;
pub mod idempotency;
pub mod migrations;
pub mod store;

pub use asset_rows::{upsert, UpsertOutcome};
pub use audit::{record as record_audit, AuditAction};
pub use error::{from_pool, from_rusqlite};
pub use idempotency::{file_already_processed, find_journal_by_key};
pub use store::{DbPool, PooledConn, Store};
