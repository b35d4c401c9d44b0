//! Staging area for one merge batch
//!
//! Rows are appended as extracted, without any deduplication; the merge
//! reconciles them. The area only exists inside an open merge transaction.

use crate::symbol::{SourceId, TemporarySymbolId};
use crate::Result;
use super::database::{Database, SqlValue};
use super::statements;

/// Scratch space backed by the `newSymbols` / `newLocations` tables.
pub struct StagingArea<'a, D: Database + ?Sized> {
    db: &'a D,
    next_temporary_id: i64,
    staged_symbols: usize,
    staged_locations: usize,
}

impl<'a, D: Database + ?Sized> StagingArea<'a, D> {
    /// Take over the staging tables for a new batch.
    ///
    /// Must be called with a transaction already open on `db`.
    pub(crate) fn open(db: &'a D) -> Result<Self> {
        let leftover_symbols = db.query_scalar(statements::COUNT_NEW_SYMBOLS, &[])?;
        let leftover_locations = db.query_scalar(statements::COUNT_NEW_LOCATIONS, &[])?;
        if leftover_symbols > 0 || leftover_locations > 0 {
            tracing::warn!(
                "Discarding {} staged symbols and {} staged locations left from an earlier batch",
                leftover_symbols,
                leftover_locations
            );
            clear(db)?;
        }

        Ok(Self {
            db,
            next_temporary_id: 1,
            staged_symbols: 0,
            staged_locations: 0,
        })
    }

    /// Stage a symbol, returning its batch-local id
    pub fn stage_symbol(&mut self, usr: &str, name: &str) -> Result<TemporarySymbolId> {
        let id = TemporarySymbolId(self.next_temporary_id);
        self.db.execute_bound(
            statements::INSERT_NEW_SYMBOL,
            &[SqlValue::from(id.0), SqlValue::from(usr), SqlValue::from(name)],
        )?;
        self.next_temporary_id += 1;
        self.staged_symbols += 1;
        Ok(id)
    }

    /// Stage a location of a previously staged symbol.
    ///
    /// The reference is checked when the batch is merged.
    pub fn stage_location(
        &mut self,
        symbol: TemporarySymbolId,
        line: u32,
        column: u32,
        source_id: SourceId,
    ) -> Result<()> {
        self.db.execute_bound(
            statements::INSERT_NEW_LOCATION,
            &[
                SqlValue::from(symbol.0),
                SqlValue::from(line),
                SqlValue::from(column),
                SqlValue::from(source_id.0),
            ],
        )?;
        self.staged_locations += 1;
        Ok(())
    }

    /// Source ids referenced by staged locations that have no `sources` row yet
    pub fn new_source_ids(&self) -> Result<Vec<SourceId>> {
        let rows = self.db.query_rows(statements::SELECT_NEW_SOURCE_IDS, &[])?;
        Ok(rows
            .iter()
            .filter_map(|row| row.first().and_then(SqlValue::as_i64))
            .map(SourceId)
            .collect())
    }

    /// Register a source path in the same transaction as the batch
    pub fn insert_source(&mut self, source_id: SourceId, path: &str) -> Result<()> {
        self.db.execute_bound(
            statements::INSERT_SOURCE,
            &[SqlValue::from(source_id.0), SqlValue::from(path)],
        )?;
        Ok(())
    }

    pub fn staged_symbols(&self) -> usize {
        self.staged_symbols
    }

    pub fn staged_locations(&self) -> usize {
        self.staged_locations
    }

    pub(crate) fn database(&self) -> &'a D {
        self.db
    }

    pub(crate) fn reset(&mut self) -> Result<()> {
        clear(self.db)?;
        self.next_temporary_id = 1;
        self.staged_symbols = 0;
        self.staged_locations = 0;
        Ok(())
    }
}

fn clear<D: Database + ?Sized>(db: &D) -> Result<()> {
    db.execute_bound(statements::DELETE_NEW_SYMBOLS_TABLE, &[])?;
    db.execute_bound(statements::DELETE_NEW_LOCATIONS_TABLE, &[])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::testing::RecordingDatabase;
    use crate::storage::SymbolStore;

    #[test]
    fn test_staging_statements() {
        let db = RecordingDatabase::new();
        let mut staging = StagingArea::open(&db).unwrap();

        let id = staging.stage_symbol("c:@F@foo#", "foo").unwrap();
        staging.stage_location(id, 3, 1, SourceId(7)).unwrap();

        assert_eq!(
            db.recorded(),
            vec![
                statements::COUNT_NEW_SYMBOLS,
                statements::COUNT_NEW_LOCATIONS,
                "INSERT INTO newSymbols(temporarySymbolId, usr, symbolName) VALUES(?,?,?)",
                "INSERT INTO newLocations(temporarySymbolId, line, column, sourceId) VALUES(?,?,?,?)",
            ]
        );
    }

    #[test]
    fn test_temporary_ids_are_sequential() {
        let db = RecordingDatabase::new();
        let mut staging = StagingArea::open(&db).unwrap();

        let first = staging.stage_symbol("a", "a").unwrap();
        let second = staging.stage_symbol("a", "a").unwrap();
        assert_eq!(first, TemporarySymbolId(1));
        assert_eq!(second, TemporarySymbolId(2));
        assert_eq!(staging.staged_symbols(), 2);
    }

    #[test]
    fn test_new_source_ids() {
        let mut store = SymbolStore::open_in_memory().unwrap();
        let mut merge = store.begin_merge().unwrap();

        let id = merge.stage_symbol("usr", "name").unwrap();
        merge.stage_location(id, 1, 1, SourceId(2)).unwrap();
        merge.stage_location(id, 2, 1, SourceId(1)).unwrap();
        merge.stage_location(id, 3, 1, SourceId(2)).unwrap();
        assert_eq!(merge.new_source_ids().unwrap(), vec![SourceId(1), SourceId(2)]);

        merge.insert_source(SourceId(1), "a.cpp").unwrap();
        assert_eq!(merge.new_source_ids().unwrap(), vec![SourceId(2)]);
    }
}
