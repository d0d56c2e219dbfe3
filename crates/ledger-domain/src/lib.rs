//! # ledger-domain
//!
//! Core domain model shared by every other crate in the ledger: fixed-point
//! money, the Indian financial-year calendar, the chart-of-accounts and
//! transaction-kind enums, and the typed error kinds used across the
//! ingestion-and-ledger kernel.
//!
//! Nothing in this crate touches storage or I/O; it is pure data plus the
//! arithmetic and classification rules that depend only on that data.

pub mod error;
pub mod fy;
pub mod ids;
pub mod kinds;
pub mod money;

pub use error::{LedgerError, LedgerResult};
pub use fy::FinancialYear;
pub use ids::{AccountCode, BatchId, JournalId, LotId, UserId};
pub use kinds::{
    AssetClass, HoldingPeriod, MatchResult, OnConflict, Regime, Severity, SuspenseStatus,
    TxnKind,
};
pub use money::{Money, Units, MONEY_TOLERANCE, UNITS_TOLERANCE};
