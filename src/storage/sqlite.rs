//! SQLite backend

use std::path::Path;
use std::time::Duration;
use rusqlite::types::{ToSqlOutput, Type, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use crate::Result;
use super::database::{Database, SqlValue};

/// Busy timeout used when none is configured
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// [`Database`] adapter over a single rusqlite connection
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))
    }

    /// Open a database file, waiting at most `busy_timeout` for the write lock
    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        tracing::debug!("Opened {} (busy timeout {:?})", path.display(), busy_timeout);
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }
}

impl Database for SqliteDatabase {
    fn execute(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn execute_bound(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let changed = stmt.execute(params_from_iter(params.iter()))?;
        Ok(changed)
    }

    fn query_scalar(&self, sql: &str, params: &[SqlValue]) -> Result<i64> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let value: i64 = stmt.query_row(params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(value)
    }

    fn query_rows(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Vec<SqlValue>>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let column_count = stmt.column_count();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                (0..column_count)
                    .map(|i| row.get_ref(i).and_then(|value| value_from_ref(i, value)))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
        })
    }
}

/// Only NULL, INTEGER and UTF-8 TEXT are ever stored; anything else is a
/// corrupt row.
fn value_from_ref(index: usize, value: ValueRef<'_>) -> rusqlite::Result<SqlValue> {
    match value {
        ValueRef::Null => Ok(SqlValue::Null),
        ValueRef::Integer(v) => Ok(SqlValue::Integer(v)),
        ValueRef::Text(t) => std::str::from_utf8(t)
            .map(|s| SqlValue::Text(s.to_string()))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))),
        other => Err(rusqlite::Error::InvalidColumnType(
            index,
            format!("column {}", index),
            other.data_type(),
        )),
    }
}
