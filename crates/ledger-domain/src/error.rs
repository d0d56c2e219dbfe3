//! Typed error kinds shared across the ingestion-and-ledger kernel.

use thiserror::Error;

/// Result alias used throughout the ledger crates.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Error kinds raised by the store, journal, cost-basis tracker, and the
/// services built on top of them.
///
/// Every variant maps directly to a propagation rule in the error-handling
/// design: idempotency duplicates are *not* represented here (they are a
/// normal `is_duplicate=true` success path on the transaction-service
/// result), but everything else that is fatal to the enclosing unit of
/// work is.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Requested row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input that fails a domain invariant before it reaches storage.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// A unique-constraint violation the caller asked to treat as fatal
    /// (`on_conflict = FAIL`), as opposed to the default idempotent skip.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A journal's debits and credits did not balance within tolerance.
    #[error("unbalanced journal: debits {debits} != credits {credits} (tolerance {tolerance})")]
    UnbalancedJournal {
        debits: rust_decimal::Decimal,
        credits: rust_decimal::Decimal,
        tolerance: rust_decimal::Decimal,
    },

    /// A sell or withdrawal asked for more units than the lot queue holds.
    #[error("insufficient units: requested {requested}, available {available}")]
    InsufficientUnits {
        requested: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    /// Cost-basis lots drifted from the ledger's view of units held for a key.
    #[error("accounting balance error for {key}: ledger {ledger_units}, lots {lot_units}")]
    AccountingBalanceError {
        key: String,
        ledger_units: rust_decimal::Decimal,
        lot_units: rust_decimal::Decimal,
    },

    /// A format parser could not make sense of a file.
    #[error("parse error in {source_file}: {message}")]
    ParseError { source_file: String, message: String },

    /// A password-protected file was opened without a password.
    #[error("password required for {0}")]
    PasswordRequired(String),

    /// A supplied password failed to open a protected document.
    #[error("invalid password for {0}")]
    InvalidPassword(String),

    /// Persistence-layer failure (I/O, connection, migration).
    #[error("storage error: {0}")]
    StorageError(String),

    /// A batch ingestion run failed and was rolled back.
    #[error("batch ingestion error: {0}")]
    BatchIngestionError(String),
}

impl LedgerError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn duplicate_key(what: impl Into<String>) -> Self {
        Self::DuplicateKey(what.into())
    }

    pub fn parse_error(source_file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            source_file: source_file.into(),
            message: message.into(),
        }
    }

    /// Whether this error should abort the enclosing batch when
    /// `stop_on_error` is set, as opposed to being recorded per-file and
    /// skipped.
    pub fn is_fatal_to_batch(&self) -> bool {
        !matches!(self, Self::ParseError { .. } | Self::NotFound(_))
    }
}
