//! Symbol store facade
//!
//! Owns a [`Database`], creates the schema on open, hands out merge
//! transactions and answers the read-side lookups of the query layer.

use std::fmt;
use std::path::Path;
use std::time::Duration;
use serde::Serialize;
use crate::symbol::{Location, Source, SourceId, Symbol, SymbolId};
use crate::{Error, Result};
use super::database::{Database, SqlValue};
use super::merge::MergeTransaction;
use super::sqlite::SqliteDatabase;
use super::{schema, statements, transaction};

/// Persistent symbol index
pub struct SymbolStore<D: Database = SqliteDatabase> {
    db: D,
}

impl SymbolStore<SqliteDatabase> {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(SqliteDatabase::open(path)?)
    }

    /// Open a database file with an explicit write-lock wait
    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        Self::new(SqliteDatabase::open_with_timeout(path, busy_timeout)?)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::new(SqliteDatabase::open_in_memory()?)
    }
}

impl<D: Database> SymbolStore<D> {
    /// Wrap a backend and make sure the schema exists
    pub fn new(db: D) -> Result<Self> {
        let store = Self { db };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Create the persistent and staging tables if absent.
    ///
    /// Runs in one immediate transaction; safe to call on every open.
    pub fn ensure_schema(&self) -> Result<()> {
        transaction::with_transaction(&self.db, |db| {
            for stmt in schema::all_schema_statements() {
                db.execute(stmt)?;
            }
            Ok(())
        })
        .map_err(|e| match e {
            e @ Error::Transaction(_) => e,
            other => Error::Schema(Box::new(other)),
        })
    }

    /// Begin a merge batch, taking the write lock
    pub fn begin_merge(&mut self) -> Result<MergeTransaction<'_, D>> {
        MergeTransaction::begin(&self.db)
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    // ========== Lookups ==========

    /// Get a symbol by usr
    pub fn symbol_by_usr(&self, usr: &str) -> Result<Option<Symbol>> {
        let rows = self.db.query_rows(statements::SELECT_SYMBOL_BY_USR, &[SqlValue::from(usr)])?;
        rows.first().map(|row| row_to_symbol(row)).transpose()
    }

    /// All symbols, in creation order
    pub fn symbols(&self) -> Result<Vec<Symbol>> {
        self.db
            .query_rows(statements::SELECT_ALL_SYMBOLS, &[])?
            .iter()
            .map(|row| row_to_symbol(row))
            .collect()
    }

    /// Every location recorded for a source file
    pub fn locations_in_source(&self, source_id: SourceId) -> Result<Vec<Location>> {
        self.db
            .query_rows(statements::SELECT_LOCATIONS_IN_SOURCE, &[SqlValue::from(source_id.0)])?
            .iter()
            .map(|row| row_to_location(row))
            .collect()
    }

    /// Every location of the symbol with this usr
    pub fn locations_of_usr(&self, usr: &str) -> Result<Vec<Location>> {
        self.db
            .query_rows(statements::SELECT_LOCATIONS_OF_USR, &[SqlValue::from(usr)])?
            .iter()
            .map(|row| row_to_location(row))
            .collect()
    }

    /// Get a source by id
    pub fn source(&self, source_id: SourceId) -> Result<Option<Source>> {
        let rows = self.db.query_rows(statements::SELECT_SOURCE_PATH, &[SqlValue::from(source_id.0)])?;
        rows.first().map(|row| row_to_source(row)).transpose()
    }

    /// Path of a source, if registered
    pub fn source_path(&self, source_id: SourceId) -> Result<Option<String>> {
        Ok(self.source(source_id)?.map(|s| s.path))
    }

    /// All registered sources
    pub fn sources(&self) -> Result<Vec<Source>> {
        self.db
            .query_rows(statements::SELECT_ALL_SOURCES, &[])?
            .iter()
            .map(|row| row_to_source(row))
            .collect()
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            symbols: self.count(statements::COUNT_SYMBOLS)?,
            locations: self.count(statements::COUNT_LOCATIONS)?,
            sources: self.count(statements::COUNT_SOURCES)?,
            staged_symbols: self.count(statements::COUNT_NEW_SYMBOLS)?,
            staged_locations: self.count(statements::COUNT_NEW_LOCATIONS)?,
        })
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let count = self.db.query_scalar(sql, &[])?;
        Ok(count as usize)
    }
}

fn integer(row: &[SqlValue], index: usize) -> Result<i64> {
    row.get(index)
        .and_then(SqlValue::as_i64)
        .ok_or_else(|| Error::ConstraintViolation(format!("expected integer in column {}", index)))
}

fn text(row: &[SqlValue], index: usize) -> Result<String> {
    match row.get(index) {
        Some(SqlValue::Text(s)) => Ok(s.clone()),
        Some(SqlValue::Null) => Ok(String::new()),
        _ => Err(Error::ConstraintViolation(format!("expected text in column {}", index))),
    }
}

fn line_number(row: &[SqlValue], index: usize) -> Result<u32> {
    let value = integer(row, index)?;
    u32::try_from(value)
        .map_err(|_| Error::ConstraintViolation(format!("line/column out of range: {}", value)))
}

/// Helper to convert a row to a Symbol
fn row_to_symbol(row: &[SqlValue]) -> Result<Symbol> {
    Ok(Symbol {
        id: SymbolId(integer(row, 0)?),
        usr: text(row, 1)?,
        name: text(row, 2)?,
    })
}

/// Helper to convert a row to a Location
fn row_to_location(row: &[SqlValue]) -> Result<Location> {
    Ok(Location {
        symbol_id: SymbolId(integer(row, 0)?),
        line: line_number(row, 1)?,
        column: line_number(row, 2)?,
        source_id: SourceId(integer(row, 3)?),
    })
}

/// Helper to convert a row to a Source
fn row_to_source(row: &[SqlValue]) -> Result<Source> {
    Ok(Source {
        id: SourceId(integer(row, 0)?),
        path: text(row, 1)?,
    })
}

/// Database statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub symbols: usize,
    pub locations: usize,
    pub sources: usize,
    pub staged_symbols: usize,
    pub staged_locations: usize,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Symbols: {}", self.symbols)?;
        writeln!(f, "  Locations: {}", self.locations)?;
        write!(f, "  Sources: {}", self.sources)
    }
}
