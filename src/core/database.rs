//! SQLite-backed record store
//!
//! `Database` owns the connection every repository and engine call runs
//! against. Each call opens its own transaction on it; no transaction
//! handle is ever held across calls.

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, Transaction};
use tracing::debug;

use crate::core::error::Result;
use crate::core::query::{CASEFOLD_FN, DECIMAL_KEY_FN};
use crate::core::schema;
use crate::core::value::{decimal_sort_key, parse_decimal};

/// Handle to the record store
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open or create a database file, initializing the schema if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // WAL for better concurrent readers
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let db = Self::configure(conn, Some(path.to_path_buf()))?;
        debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        Self::configure(Connection::open_in_memory()?, None)
    }

    fn configure(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        register_functions(&conn)?;
        schema::init(&conn)?;
        Ok(Self { conn, path })
    }

    /// Underlying connection, for read-only ad-hoc queries
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// File backing this database, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Begin the transaction of one repository or engine call
    ///
    /// Dropping the returned transaction without committing rolls it back.
    pub(crate) fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Row count of each table, for status output
    pub fn table_counts(&self, tables: &[&'static str]) -> Result<Vec<(&'static str, i64)>> {
        tables
            .iter()
            .map(|table| {
                let count: i64 = self.conn.query_row(
                    &format!("SELECT COUNT(*) FROM {}", table),
                    [],
                    |row| row.get(0),
                )?;
                Ok((*table, count))
            })
            .collect()
    }
}

/// SQL functions the query builder relies on
fn register_functions(conn: &Connection) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    conn.create_scalar_function(CASEFOLD_FN, 1, flags, casefold)?;
    conn.create_scalar_function(DECIMAL_KEY_FN, 1, flags, decimal_key)?;
    Ok(())
}

/// Unicode lowercase of text; other values pass through
fn casefold(ctx: &Context<'_>) -> rusqlite::Result<SqlValue> {
    Ok(match ctx.get_raw(0) {
        ValueRef::Text(bytes) => SqlValue::Text(String::from_utf8_lossy(bytes).to_lowercase()),
        other => other.into(),
    })
}

/// Numeric sort key of a stored decimal; NULL stays NULL
fn decimal_key(ctx: &Context<'_>) -> rusqlite::Result<Option<String>> {
    let value = match ctx.get_raw(0) {
        ValueRef::Null => return Ok(None),
        ValueRef::Integer(i) => Decimal::from(i),
        ValueRef::Real(f) => {
            Decimal::try_from(f).map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?
        }
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .ok()
            .and_then(parse_decimal)
            .ok_or_else(|| {
                rusqlite::Error::UserFunctionError(
                    format!("'{}' is not a decimal", String::from_utf8_lossy(bytes)).into(),
                )
            })?,
        ValueRef::Blob(_) => {
            return Err(rusqlite::Error::UserFunctionError(
                "decimal_key does not accept blobs".into(),
            ))
        }
    };
    Ok(Some(decimal_sort_key(value)))
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}
