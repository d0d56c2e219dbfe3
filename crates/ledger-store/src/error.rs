//! Conversions from the storage driver's error types into the ledger's
//! own error vocabulary. Kept here rather than in `ledger-domain` so that
//! crate stays free of any dependency on the chosen storage engine.

use ledger_domain::LedgerError;

pub fn from_rusqlite(err: rusqlite::Error) -> LedgerError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => LedgerError::not_found("row"),
        rusqlite::Error::SqliteFailure(e, ref msg)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            LedgerError::duplicate_key(msg.clone().unwrap_or_else(|| e.to_string()))
        }
        other => LedgerError::StorageError(other.to_string()),
    }
}

pub fn from_pool(err: r2d2::Error) -> LedgerError {
    LedgerError::StorageError(format!("connection pool: {err}"))
}

pub(crate) trait MapRusqlite<T> {
    fn store_err(self) -> ledger_domain::LedgerResult<T>;
}

impl<T> MapRusqlite<T> for Result<T, rusqlite::Error> {
    fn store_err(self) -> ledger_domain::LedgerResult<T> {
        self.map_err(from_rusqlite)
    }
}
