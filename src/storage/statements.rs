//! Staging and merge statements
//!
//! Every statement the merge issues, kept together so the set-based steps
//! can be read top to bottom.

// ========== Staging ==========

pub const INSERT_NEW_SYMBOL: &str =
    "INSERT INTO newSymbols(temporarySymbolId, usr, symbolName) VALUES(?,?,?)";

pub const INSERT_NEW_LOCATION: &str =
    "INSERT INTO newLocations(temporarySymbolId, line, column, sourceId) VALUES(?,?,?,?)";

pub const SELECT_NEW_SOURCE_IDS: &str =
    "SELECT DISTINCT sourceId FROM newLocations WHERE NOT EXISTS (SELECT sourceId FROM sources WHERE newLocations.sourceId == sources.sourceId) ORDER BY sourceId";

pub const INSERT_SOURCE: &str = "INSERT INTO sources(sourceId, sourcePath) VALUES(?,?)";

pub const COUNT_NEW_SYMBOLS: &str = "SELECT COUNT(*) FROM newSymbols";

pub const COUNT_NEW_LOCATIONS: &str = "SELECT COUNT(*) FROM newLocations";

// ========== Merge steps ==========

/// Step 1. The first staged row of each usr supplies the name.
pub const ADD_NEW_SYMBOLS_TO_SYMBOLS: &str =
    "INSERT INTO symbols(usr, symbolName) SELECT usr, symbolName FROM newSymbols WHERE temporarySymbolId = (SELECT MIN(earlier.temporarySymbolId) FROM newSymbols AS earlier WHERE earlier.usr = newSymbols.usr) AND NOT EXISTS (SELECT usr FROM symbols WHERE symbols.usr == newSymbols.usr) ORDER BY temporarySymbolId";

/// Step 2
pub const SYNC_NEW_SYMBOLS_FROM_SYMBOLS: &str =
    "UPDATE newSymbols SET symbolId = (SELECT symbolId FROM symbols WHERE newSymbols.usr = symbols.usr)";

/// Step 3
pub const SYNC_SYMBOLS_INTO_NEW_LOCATIONS: &str =
    "UPDATE newLocations SET symbolId = (SELECT symbolId FROM newSymbols WHERE newSymbols.temporarySymbolId = newLocations.temporarySymbolId)";

pub const COUNT_UNRESOLVED_NEW_LOCATIONS: &str =
    "SELECT COUNT(*) FROM newLocations WHERE symbolId IS NULL";

pub const SELECT_UNRESOLVED_TEMPORARY_IDS: &str =
    "SELECT DISTINCT temporarySymbolId FROM newLocations WHERE symbolId IS NULL ORDER BY temporarySymbolId LIMIT 10";

pub const COUNT_TOUCHED_SOURCES: &str = "SELECT COUNT(DISTINCT sourceId) FROM newLocations";

/// Step 4a
pub const DELETE_ALL_LOCATIONS_FROM_UPDATED_FILES: &str =
    "DELETE FROM locations WHERE sourceId IN (SELECT DISTINCT sourceId FROM newLocations)";

/// Step 4b
pub const INSERT_NEW_LOCATIONS_IN_LOCATIONS: &str =
    "INSERT INTO locations(symbolId, line, column, sourceId) SELECT symbolId, line, column, sourceId FROM newLocations";

/// Step 5
pub const DELETE_NEW_SYMBOLS_TABLE: &str = "DELETE FROM newSymbols";

pub const DELETE_NEW_LOCATIONS_TABLE: &str = "DELETE FROM newLocations";

// ========== Lookups ==========

pub const SELECT_SYMBOL_BY_USR: &str = "SELECT symbolId, usr, symbolName FROM symbols WHERE usr = ?";

pub const SELECT_ALL_SYMBOLS: &str = "SELECT symbolId, usr, symbolName FROM symbols ORDER BY symbolId";

pub const SELECT_LOCATIONS_IN_SOURCE: &str =
    "SELECT symbolId, line, column, sourceId FROM locations WHERE sourceId = ? ORDER BY line, column, symbolId";

pub const SELECT_LOCATIONS_OF_USR: &str =
    "SELECT locations.symbolId, line, column, sourceId FROM locations JOIN symbols ON symbols.symbolId = locations.symbolId WHERE symbols.usr = ? ORDER BY sourceId, line, column";

pub const SELECT_SOURCE_PATH: &str = "SELECT sourceId, sourcePath FROM sources WHERE sourceId = ?";

pub const SELECT_ALL_SOURCES: &str = "SELECT sourceId, sourcePath FROM sources ORDER BY sourceId";

pub const COUNT_SYMBOLS: &str = "SELECT COUNT(*) FROM symbols";

pub const COUNT_LOCATIONS: &str = "SELECT COUNT(*) FROM locations";

pub const COUNT_SOURCES: &str = "SELECT COUNT(*) FROM sources";
