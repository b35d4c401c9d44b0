//! Merge engine
//!
//! Reconciles one staged batch into the persistent tables with five
//! set-based steps, all inside the batch's immediate transaction:
//!
//! 1. seed symbols for staged usrs not yet known
//! 2. resolve staged symbols to their `symbolId`
//! 3. propagate the resolution to staged locations
//! 4. replace every location of each touched source
//! 5. clear the staging tables
//!
//! Either the whole batch becomes visible on commit or none of it does.

use std::fmt;
use serde::Serialize;
use crate::symbol::{SourceId, TemporarySymbolId};
use crate::{Error, Result};
use super::database::{Database, SqlValue};
use super::staging::StagingArea;
use super::statements;
use super::transaction::Transaction;

/// Counters describing one committed batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub staged_symbols: usize,
    pub staged_locations: usize,
    pub new_symbols: usize,
    pub touched_sources: usize,
    pub removed_locations: usize,
    pub inserted_locations: usize,
}

impl fmt::Display for MergeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Merge Statistics:")?;
        writeln!(f, "  Staged symbols: {}", self.staged_symbols)?;
        writeln!(f, "  Staged locations: {}", self.staged_locations)?;
        writeln!(f, "  New symbols: {}", self.new_symbols)?;
        writeln!(f, "  Touched sources: {}", self.touched_sources)?;
        writeln!(f, "  Removed locations: {}", self.removed_locations)?;
        write!(f, "  Inserted locations: {}", self.inserted_locations)
    }
}

/// One open merge batch.
///
/// Created by [`SymbolStore::begin_merge`](super::SymbolStore::begin_merge).
/// Stage the batch, then [`commit`](Self::commit). Dropping it without
/// committing discards everything staged.
pub struct MergeTransaction<'a, D: Database + ?Sized> {
    transaction: Transaction<'a, D>,
    staging: StagingArea<'a, D>,
}

impl<'a, D: Database + ?Sized> MergeTransaction<'a, D> {
    pub(crate) fn begin(db: &'a D) -> Result<Self> {
        let transaction = Transaction::begin(db)?;
        let staging = StagingArea::open(db)?;
        Ok(Self { transaction, staging })
    }

    /// Stage a symbol, returning its batch-local id
    pub fn stage_symbol(&mut self, usr: &str, name: &str) -> Result<TemporarySymbolId> {
        self.staging.stage_symbol(usr, name)
    }

    /// Stage a location of a symbol staged earlier in this batch
    pub fn stage_location(
        &mut self,
        symbol: TemporarySymbolId,
        line: u32,
        column: u32,
        source_id: SourceId,
    ) -> Result<()> {
        self.staging.stage_location(symbol, line, column, source_id)
    }

    /// Source ids referenced by this batch that are not registered yet
    pub fn new_source_ids(&self) -> Result<Vec<SourceId>> {
        self.staging.new_source_ids()
    }

    /// Register a source path as part of this batch
    pub fn insert_source(&mut self, source_id: SourceId, path: &str) -> Result<()> {
        self.staging.insert_source(source_id, path)
    }

    /// Merge the staged batch and commit.
    ///
    /// On any failure the transaction is rolled back and the persistent
    /// tables are left exactly as they were before the batch.
    pub fn commit(mut self) -> Result<MergeStats> {
        let stats = match merge_staged(&mut self.staging) {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!("Merge failed, rolling back batch: {}", e);
                if let Err(rollback_err) = self.transaction.rollback() {
                    tracing::warn!("Rollback failed: {}", rollback_err);
                }
                return Err(e);
            }
        };

        self.transaction.commit()?;
        tracing::info!(
            "Merged batch: {} new symbols, {} locations across {} sources",
            stats.new_symbols,
            stats.inserted_locations,
            stats.touched_sources
        );
        Ok(stats)
    }

    /// Discard the batch
    pub fn rollback(self) -> Result<()> {
        tracing::debug!(
            "Rolling back batch with {} staged symbols",
            self.staging.staged_symbols()
        );
        self.transaction.rollback()
    }
}

/// Run the five merge steps against the staging area's database
fn merge_staged<D: Database + ?Sized>(staging: &mut StagingArea<'_, D>) -> Result<MergeStats> {
    let db = staging.database();
    let mut stats = MergeStats {
        staged_symbols: staging.staged_symbols(),
        staged_locations: staging.staged_locations(),
        ..MergeStats::default()
    };

    stats.new_symbols = db.execute_bound(statements::ADD_NEW_SYMBOLS_TO_SYMBOLS, &[])?;
    tracing::debug!("Step 1: seeded {} new symbols", stats.new_symbols);

    db.execute_bound(statements::SYNC_NEW_SYMBOLS_FROM_SYMBOLS, &[])?;
    tracing::debug!("Step 2: resolved {} staged symbols", stats.staged_symbols);

    db.execute_bound(statements::SYNC_SYMBOLS_INTO_NEW_LOCATIONS, &[])?;
    check_locations_resolved(db)?;
    tracing::debug!("Step 3: resolved {} staged locations", stats.staged_locations);

    stats.touched_sources = count(db.query_scalar(statements::COUNT_TOUCHED_SOURCES, &[])?);
    stats.removed_locations =
        db.execute_bound(statements::DELETE_ALL_LOCATIONS_FROM_UPDATED_FILES, &[])?;
    stats.inserted_locations =
        db.execute_bound(statements::INSERT_NEW_LOCATIONS_IN_LOCATIONS, &[])?;
    tracing::debug!(
        "Step 4: replaced {} locations with {} in {} sources",
        stats.removed_locations,
        stats.inserted_locations,
        stats.touched_sources
    );

    staging.reset()?;
    tracing::debug!("Step 5: staging cleared");

    Ok(stats)
}

/// Every staged location must point at a staged symbol
fn check_locations_resolved<D: Database + ?Sized>(db: &D) -> Result<()> {
    let unresolved = db.query_scalar(statements::COUNT_UNRESOLVED_NEW_LOCATIONS, &[])?;
    if unresolved == 0 {
        return Ok(());
    }

    let ids: Vec<String> = db
        .query_rows(statements::SELECT_UNRESOLVED_TEMPORARY_IDS, &[])?
        .iter()
        .map(|row| match row.first() {
            Some(SqlValue::Integer(id)) => id.to_string(),
            _ => "NULL".to_string(),
        })
        .collect();

    Err(Error::ConstraintViolation(format!(
        "{} staged locations reference unstaged temporary symbol ids [{}]",
        unresolved,
        ids.join(", ")
    )))
}

fn count(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::testing::{FailingDatabase, RecordingDatabase};
    use crate::storage::{SqliteDatabase, SymbolStore};
    use crate::storage::transaction::{BEGIN_IMMEDIATE, COMMIT, ROLLBACK};
    use crate::symbol::{Location, SymbolId};

    fn store() -> SymbolStore<SqliteDatabase> {
        SymbolStore::open_in_memory().unwrap()
    }

    /// Stage one symbol with one location per (line, source) pair and commit
    fn merge_one(store: &mut SymbolStore<SqliteDatabase>, usr: &str, spots: &[(u32, i64)]) -> MergeStats {
        let mut merge = store.begin_merge().unwrap();
        let id = merge.stage_symbol(usr, usr).unwrap();
        for (line, source) in spots {
            merge.stage_location(id, *line, 1, SourceId(*source)).unwrap();
        }
        merge.commit().unwrap()
    }

    fn symbol_id(store: &SymbolStore<SqliteDatabase>, usr: &str) -> SymbolId {
        store.symbol_by_usr(usr).unwrap().unwrap().id
    }

    #[test]
    fn test_end_to_end() {
        let mut store = store();

        let mut merge = store.begin_merge().unwrap();
        let id = merge.stage_symbol("foo", "foo").unwrap();
        assert_eq!(id, TemporarySymbolId(1));
        merge.stage_location(id, 3, 1, SourceId(7)).unwrap();
        let stats = merge.commit().unwrap();

        assert_eq!(stats.new_symbols, 1);
        assert_eq!(stats.inserted_locations, 1);
        assert_eq!(stats.touched_sources, 1);

        let symbols = store.symbols().unwrap();
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].usr, "foo");
        assert_eq!(symbols[0].name, "foo");

        let locations = store.locations_in_source(SourceId(7)).unwrap();
        assert_eq!(locations, vec![Location::new(symbols[0].id, 3, 1, SourceId(7))]);

        let stats = store.stats().unwrap();
        assert_eq!(stats.staged_symbols, 0);
        assert_eq!(stats.staged_locations, 0);
    }

    #[test]
    fn test_dedup_within_batch_first_name_wins() {
        let mut store = store();

        let mut merge = store.begin_merge().unwrap();
        let a = merge.stage_symbol("X::f()", "f").unwrap();
        let b = merge.stage_symbol("X::f()", "f_renamed").unwrap();
        merge.stage_location(a, 1, 1, SourceId(1)).unwrap();
        merge.stage_location(b, 2, 1, SourceId(1)).unwrap();
        let stats = merge.commit().unwrap();

        assert_eq!(stats.new_symbols, 1);
        let symbols = store.symbols().unwrap();
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "f");

        // Both staged rows resolve to the same symbol
        let locations = store.locations_in_source(SourceId(1)).unwrap();
        assert_eq!(locations.len(), 2);
        assert!(locations.iter().all(|l| l.symbol_id == symbols[0].id));
    }

    #[test]
    fn test_existing_symbol_is_reused_and_untouched() {
        let mut store = store();
        merge_one(&mut store, "X::f()", &[(1, 1)]);
        let original = store.symbol_by_usr("X::f()").unwrap().unwrap();

        let mut merge = store.begin_merge().unwrap();
        let id = merge.stage_symbol("X::f()", "other name").unwrap();
        merge.stage_location(id, 4, 2, SourceId(2)).unwrap();
        let stats = merge.commit().unwrap();

        assert_eq!(stats.new_symbols, 0);
        assert_eq!(store.symbol_by_usr("X::f()").unwrap().unwrap(), original);
        assert_eq!(
            store.locations_in_source(SourceId(2)).unwrap(),
            vec![Location::new(original.id, 4, 2, SourceId(2))]
        );
    }

    #[test]
    fn test_touched_source_is_replaced() {
        let mut store = store();
        merge_one(&mut store, "A", &[(5, 1)]);

        let stats = merge_one(&mut store, "B", &[(9, 1)]);
        assert_eq!(stats.removed_locations, 1);

        let b = symbol_id(&store, "B");
        assert_eq!(
            store.locations_in_source(SourceId(1)).unwrap(),
            vec![Location::new(b, 9, 1, SourceId(1))]
        );
        // A stays even though nothing references it any more
        assert!(store.symbol_by_usr("A").unwrap().is_some());
    }

    #[test]
    fn test_untouched_source_is_isolated() {
        let mut store = store();
        merge_one(&mut store, "A", &[(5, 1), (6, 2), (7, 2)]);
        let before = store.locations_in_source(SourceId(2)).unwrap();

        merge_one(&mut store, "B", &[(9, 1)]);

        assert_eq!(store.locations_in_source(SourceId(2)).unwrap(), before);
        assert_eq!(store.locations_in_source(SourceId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let mut store = store();
        merge_one(&mut store, "A", &[(5, 1)]);

        let stats = store.begin_merge().unwrap().commit().unwrap();
        assert_eq!(stats, MergeStats::default());
        assert_eq!(store.locations_in_source(SourceId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_dangling_temporary_id_rolls_back() {
        let mut store = store();
        merge_one(&mut store, "A", &[(5, 1)]);

        let mut merge = store.begin_merge().unwrap();
        let id = merge.stage_symbol("B", "B").unwrap();
        merge.stage_location(id, 9, 1, SourceId(1)).unwrap();
        merge.stage_location(TemporarySymbolId(42), 10, 1, SourceId(1)).unwrap();
        let err = merge.commit().unwrap_err();

        match err {
            Error::ConstraintViolation(msg) => assert!(msg.contains("[42]")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(store.symbol_by_usr("B").unwrap().is_none());
        assert_eq!(store.locations_in_source(SourceId(1)).unwrap().len(), 1);

        let stats = store.stats().unwrap();
        assert_eq!(stats.staged_symbols, 0);
        assert_eq!(stats.staged_locations, 0);
    }

    #[test]
    fn test_failure_after_seeding_leaves_store_unchanged() {
        let db = FailingDatabase::new(
            SqliteDatabase::open_in_memory().unwrap(),
            statements::SYNC_NEW_SYMBOLS_FROM_SYMBOLS,
        );
        let mut store = SymbolStore::new(db).unwrap();
        {
            let mut merge = store.begin_merge().unwrap();
            let id = merge.stage_symbol("A", "A").unwrap();
            merge.stage_location(id, 5, 1, SourceId(1)).unwrap();
            assert!(merge.commit().is_err());
        }
        assert!(store.database().tripped());

        let stats = store.stats().unwrap();
        assert_eq!(stats.symbols, 0);
        assert_eq!(stats.locations, 0);
        assert_eq!(stats.staged_symbols, 0);

        // The store keeps working after the failed batch
        let mut merge = store.begin_merge().unwrap();
        let id = merge.stage_symbol("A", "A").unwrap();
        merge.stage_location(id, 5, 1, SourceId(1)).unwrap();
        merge.commit().unwrap();
        assert_eq!(store.stats().unwrap().symbols, 1);
    }

    #[test]
    fn test_dropped_merge_discards_batch() {
        let mut store = store();
        {
            let mut merge = store.begin_merge().unwrap();
            let id = merge.stage_symbol("A", "A").unwrap();
            merge.stage_location(id, 5, 1, SourceId(1)).unwrap();
        }
        let stats = store.stats().unwrap();
        assert_eq!(stats.symbols, 0);
        assert_eq!(stats.staged_symbols, 0);
        assert_eq!(stats.staged_locations, 0);
    }

    #[test]
    fn test_explicit_rollback() {
        let mut store = store();
        let mut merge = store.begin_merge().unwrap();
        merge.stage_symbol("A", "A").unwrap();
        merge.rollback().unwrap();
        assert_eq!(store.stats().unwrap().symbols, 0);
    }

    #[test]
    fn test_merge_statement_sequence() {
        let db = RecordingDatabase::new();
        let mut merge = MergeTransaction::begin(&db).unwrap();
        let id = merge.stage_symbol("foo", "foo").unwrap();
        merge.stage_location(id, 3, 1, SourceId(7)).unwrap();
        merge.commit().unwrap();

        assert_eq!(
            db.recorded(),
            vec![
                BEGIN_IMMEDIATE,
                statements::COUNT_NEW_SYMBOLS,
                statements::COUNT_NEW_LOCATIONS,
                statements::INSERT_NEW_SYMBOL,
                statements::INSERT_NEW_LOCATION,
                statements::ADD_NEW_SYMBOLS_TO_SYMBOLS,
                "UPDATE newSymbols SET symbolId = (SELECT symbolId FROM symbols WHERE newSymbols.usr = symbols.usr)",
                "UPDATE newLocations SET symbolId = (SELECT symbolId FROM newSymbols WHERE newSymbols.temporarySymbolId = newLocations.temporarySymbolId)",
                statements::COUNT_UNRESOLVED_NEW_LOCATIONS,
                statements::COUNT_TOUCHED_SOURCES,
                "DELETE FROM locations WHERE sourceId IN (SELECT DISTINCT sourceId FROM newLocations)",
                "INSERT INTO locations(symbolId, line, column, sourceId) SELECT symbolId, line, column, sourceId FROM newLocations",
                "DELETE FROM newSymbols",
                "DELETE FROM newLocations",
                COMMIT,
            ]
        );
    }

    #[test]
    fn test_failed_step_issues_rollback() {
        let db = FailingDatabase::new(
            RecordingDatabase::new(),
            statements::DELETE_ALL_LOCATIONS_FROM_UPDATED_FILES,
        );
        let merge = MergeTransaction::begin(&db).unwrap();
        assert!(merge.commit().is_err());

        let recorded = db.inner.recorded();
        assert_eq!(recorded.last().map(String::as_str), Some(ROLLBACK));
        assert!(!recorded.iter().any(|s| s == COMMIT));
    }
}
