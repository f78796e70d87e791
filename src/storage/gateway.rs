//! Persistence gateway
//!
//! Every statement runs in its own transaction: the transaction guard rolls
//! back when dropped, so a failing statement or mapper leaves nothing behind.
//! Failures are logged with the statement and its parameters before they are
//! handed back to the caller.

use crate::storage::traits::{PersistenceError, PersistenceResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags, Row, Transaction};
use std::path::Path;

/// Owner of the store connection
pub struct Gateway {
    conn: Connection,
}

impl Gateway {
    /// Opens (or creates) the database file
    ///
    /// Fails when the store is unreachable; callers treat this as fatal.
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        Self::configure(Connection::open(path)?)
    }

    /// Opens an existing database file without ever creating one
    pub fn open_existing(path: &Path) -> PersistenceResult<Self> {
        if !path.is_file() {
            return Err(PersistenceError::MissingDatabase(path.to_path_buf()));
        }
        Self::configure(Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?)
    }

    fn configure(conn: Connection) -> PersistenceResult<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        Ok(Self { conn })
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> PersistenceResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Runs one parameterized statement in its own transaction
    ///
    /// `map` sees the open transaction and the number of changed rows, so it
    /// can read values such as `last_insert_rowid` before the commit. Any
    /// error from the statement, the mapper or the commit rolls back.
    pub fn execute<T, F>(&mut self, statement: &str, params: &[Value], map: F) -> PersistenceResult<T>
    where
        F: FnOnce(&Transaction<'_>, usize) -> rusqlite::Result<T>,
    {
        run_in_transaction(&mut self.conn, statement, params, map)
            .map_err(|source| statement_failed(statement, params, source))
    }

    /// Runs a parameterless SQL batch in one transaction
    pub fn execute_batch(&mut self, sql: &str) -> PersistenceResult<()> {
        let outcome = self.conn.transaction().and_then(|tx| {
            tx.execute_batch(sql)?;
            tx.commit()
        });
        outcome.map_err(|source| statement_failed(sql, &[], source))
    }

    /// Runs a read-only query and maps every row
    pub fn query<T, F>(&self, statement: &str, params: &[Value], map: F) -> PersistenceResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let outcome = self.conn.prepare(statement).and_then(|mut stmt| {
            let rows = stmt
                .query_map(params_from_iter(params.iter()), map)?
                .collect::<Result<Vec<_>, _>>();
            rows
        });
        outcome.map_err(|source| statement_failed(statement, params, source))
    }
}

fn run_in_transaction<T, F>(
    conn: &mut Connection,
    statement: &str,
    params: &[Value],
    map: F,
) -> rusqlite::Result<T>
where
    F: FnOnce(&Transaction<'_>, usize) -> rusqlite::Result<T>,
{
    let tx = conn.transaction()?;
    let changed = tx.execute(statement, params_from_iter(params.iter()))?;
    let value = map(&tx, changed)?;
    tx.commit()?;
    Ok(value)
}

/// Logs a failed statement and wraps the error
fn statement_failed(statement: &str, params: &[Value], source: rusqlite::Error) -> PersistenceError {
    let statement = statement.trim();
    tracing::error!(
        statement,
        params = ?params,
        error = %source,
        "Statement failed"
    );
    PersistenceError::Statement {
        statement: statement.to_string(),
        source,
    }
}
