//! The pooled, transactional handle to the single relational store (§4.1).

use std::path::Path;

use ledger_domain::{LedgerError, LedgerResult};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{from_pool, MapRusqlite};
use crate::migrations::MIGRATIONS;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type PooledConn = r2d2::PooledConnection<SqliteConnectionManager>;

/// Owns the connection pool and exposes the `Begin`/`Commit`/`Rollback`
/// unit-of-work primitive as `with_tx`. Every mutating code path in the
/// workspace goes through a `Store`; nothing opens its own `Connection`.
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

impl Store {
    /// Opens (creating if absent) the SQLite database at `path` and brings
    /// its schema up to the latest migration.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref()).with_init(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "foreign_keys", true)?;
            Ok(())
        });
        let pool = Pool::builder().max_size(8).build(manager).map_err(from_pool)?;
        let store = Store { pool };
        store.run_migrations()?;
        Ok(store)
    }

    /// In-memory database, used by tests and one-shot dry runs. Each call
    /// gets its own isolated database (`file::memory:?cache=shared` would
    /// share across connections in the pool, which tests rely on).
    pub fn open_in_memory() -> LedgerResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(from_pool)?;
        let store = Store { pool };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn conn(&self) -> LedgerResult<PooledConn> {
        self.pool.get().map_err(from_pool)
    }

    fn run_migrations(&self) -> LedgerResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );",
        )
        .store_err()?;

        for migration in MIGRATIONS {
            let already_applied: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1)",
                    [migration.version],
                    |row| row.get(0),
                )
                .store_err()?;
            if already_applied {
                debug!(version = migration.version, "migration already applied");
                continue;
            }
            conn.execute_batch(migration.sql).store_err()?;
            conn.execute(
                "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![
                    migration.version,
                    migration.name,
                    chrono::Utc::now().to_rfc3339()
                ],
            )
            .store_err()?;
            info!(version = migration.version, name = migration.name, "applied migration");
        }
        Ok(())
    }

    /// Runs `body` inside a single SQLite transaction. Any `Err` returned
    /// by `body`, or a panic unwinding through it, rolls the transaction
    /// back; only a returned `Ok` commits. This is the sole place a
    /// `rusqlite::Transaction` is constructed in the workspace — every
    /// multi-statement write goes through here so the "one mutation, one
    /// audit row, one transaction" invariant holds.
    pub fn with_tx<T>(
        &self,
        body: impl FnOnce(&rusqlite::Transaction<'_>) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().store_err()?;
        let result = body(&tx);
        match result {
            Ok(value) => {
                tx.commit().store_err()?;
                Ok(value)
            }
            Err(err) => {
                // Rolling back explicitly (rather than relying on Drop) lets
                // us surface a rollback failure instead of swallowing it.
                if let Err(rollback_err) = tx.rollback() {
                    return Err(LedgerError::StorageError(format!(
                        "rollback failed after {err}: {rollback_err}"
                    )));
                }
                Err(err)
            }
        }
    }
}

pub(crate) fn connection_is_usable(conn: &Connection) -> bool {
    conn.execute_batch("SELECT 1").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_and_applies_all_migrations() {
        let store = Store::open_in_memory().unwrap();
        let conn = store.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count as usize, MIGRATIONS.len());
        assert!(connection_is_usable(&conn));
    }

    #[test]
    fn with_tx_rolls_back_on_error() {
        let store = Store::open_in_memory().unwrap();
        let result: LedgerResult<()> = store.with_tx(|tx| {
            tx.execute(
                "INSERT INTO users (id, created_at) VALUES (1, '2024-01-01')",
                [],
            )
            .unwrap();
            Err(LedgerError::invalid("force rollback"))
        });
        assert!(result.is_err());

        let conn = store.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn with_tx_commits_on_success() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                tx.execute(
                    "INSERT INTO users (id, created_at) VALUES (1, '2024-01-01')",
                    [],
                )
                .store_err()
            })
            .unwrap();

        let conn = store.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
