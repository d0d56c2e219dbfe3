//! The single write path (§4.4): validates, posts the journal, writes
//! asset rows, deduplicates by idempotency key, and records audit
//! entries — all inside one transaction.

pub mod idempotency_key;
pub mod outcome;
pub mod request;
pub mod service;

pub use outcome::RecordOutcome;
pub use request::{AssetRecord, Depletion, GainEvent, LotPurchase, RecordRequest};
pub use service::{record, record_asset_only};
