//! Generic natural-key upsert for the denormalized per-asset-class tables
//! (§4.4, §4.5). Every `*_transactions`/`*_trades`/`*_vests`/etc. table
//! carries a `UNIQUE` index over its natural key; this helper turns that
//! constraint into the three `OnConflict` policies the transaction
//! service needs, without one bespoke upsert function per table.

use ledger_domain::{LedgerError, LedgerResult, OnConflict};
use rusqlite::{types::Value, Transaction};

use crate::error::MapRusqlite;

/// Outcome of an asset-row upsert: whether a new row was actually
/// inserted, and its rowid either way.
pub struct UpsertOutcome {
    pub rowid: i64,
    pub inserted: bool,
}

/// Inserts a row built from `columns` (column name, bound value pairs)
/// into `table`, honoring `on_conflict` against that table's natural-key
/// unique index. `conflict_target` names the columns of that index so
/// SQLite's `ON CONFLICT` clause can target it explicitly.
pub fn upsert(
    tx: &Transaction<'_>,
    table: &str,
    columns: &[(&str, Value)],
    conflict_target: &[&str],
    on_conflict: OnConflict,
) -> LedgerResult<UpsertOutcome> {
    let column_list = columns.iter().map(|(c, _)| *c).collect::<Vec<_>>().join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let params: Vec<&Value> = columns.iter().map(|(_, v)| v).collect();
    let targets = conflict_target.join(", ");

    let sql = match on_conflict {
        OnConflict::Fail => format!(
            "INSERT INTO {table} ({column_list}) VALUES ({placeholders})"
        ),
        OnConflict::Ignore => format!(
            "INSERT INTO {table} ({column_list}) VALUES ({placeholders}) \
             ON CONFLICT ({targets}) DO NOTHING"
        ),
        OnConflict::Replace => {
            let assignments = columns
                .iter()
                .map(|(c, _)| format!("{c} = excluded.{c}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "INSERT INTO {table} ({column_list}) VALUES ({placeholders}) \
                 ON CONFLICT ({targets}) DO UPDATE SET {assignments}"
            )
        }
    };

    let affected = {
        let mut stmt = tx.prepare(&sql).store_err()?;
        let params_slice = rusqlite::params_from_iter(params);
        match stmt.execute(params_slice) {
            Ok(n) => n,
            Err(rusqlite::Error::SqliteFailure(e, msg))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
                    && on_conflict == OnConflict::Fail =>
            {
                return Err(LedgerError::duplicate_key(
                    msg.unwrap_or_else(|| format!("{table}({targets})")),
                ));
            }
            Err(other) => return Err(crate::error::from_rusqlite(other)),
        }
    };

    if affected == 0 {
        // OnConflict::Ignore hit an existing row; fetch its rowid.
        let where_clause = conflict_target
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{c} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let lookup_params: Vec<&Value> = conflict_target
            .iter()
            .map(|name| {
                &columns
                    .iter()
                    .find(|(c, _)| c == name)
                    .expect("conflict_target column must be present in columns")
                    .1
            })
            .collect();
        let rowid: i64 = tx
            .query_row(
                &format!("SELECT rowid FROM {table} WHERE {where_clause}"),
                rusqlite::params_from_iter(lookup_params),
                |row| row.get(0),
            )
            .store_err()?;
        Ok(UpsertOutcome { rowid, inserted: false })
    } else {
        Ok(UpsertOutcome {
            rowid: tx.last_insert_rowid(),
            inserted: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn cols(folio: &str, scheme: &str, date: &str) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::Integer(1)),
            ("folio", Value::Text(folio.to_string())),
            ("scheme", Value::Text(scheme.to_string())),
            ("txn_date", Value::Text(date.to_string())),
            ("amount", Value::Text("1000.00".to_string())),
            ("units", Value::Text("10.0000".to_string())),
            ("txn_type", Value::Text("PURCHASE".to_string())),
            ("source", Value::Text("CAMS".to_string())),
        ]
    }

    #[test]
    fn ignore_skips_duplicate_natural_key() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                let first = upsert(
                    tx,
                    "mf_transactions",
                    &cols("F1", "SCHEME-A", "2024-01-01"),
                    &["user_id", "folio", "scheme", "txn_date", "amount", "units", "txn_type"],
                    OnConflict::Ignore,
                )?;
                assert!(first.inserted);
                let second = upsert(
                    tx,
                    "mf_transactions",
                    &cols("F1", "SCHEME-A", "2024-01-01"),
                    &["user_id", "folio", "scheme", "txn_date", "amount", "units", "txn_type"],
                    OnConflict::Ignore,
                )?;
                assert!(!second.inserted);
                assert_eq!(first.rowid, second.rowid);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn fail_surfaces_duplicate_key_error() {
        let store = Store::open_in_memory().unwrap();
        store
            .with_tx(|tx| {
                upsert(
                    tx,
                    "mf_transactions",
                    &cols("F2", "SCHEME-B", "2024-02-01"),
                    &["user_id", "folio", "scheme", "txn_date", "amount", "units", "txn_type"],
                    OnConflict::Fail,
                )
            })
            .unwrap();

        let result = store.with_tx(|tx| {
            upsert(
                tx,
                "mf_transactions",
                &cols("F2", "SCHEME-B", "2024-02-01"),
                &["user_id", "folio", "scheme", "txn_date", "amount", "units", "txn_type"],
                OnConflict::Fail,
            )
        });
        assert!(matches!(result, Err(LedgerError::DuplicateKey(_))));
    }
}
