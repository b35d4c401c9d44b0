//! Database schema definitions
//!
//! Column layout of every table is a contract with the query layer;
//! indexes are additive.

/// SQL to create the symbols table
pub const CREATE_SYMBOLS_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS symbols(symbolId INTEGER PRIMARY KEY, usr TEXT, symbolName TEXT)";

/// SQL to create the locations table
pub const CREATE_LOCATIONS_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS locations(symbolId INTEGER, line INTEGER, column INTEGER, sourceId INTEGER)";

/// SQL to create the sources table
pub const CREATE_SOURCES_TABLE: &str =
    "CREATE TABLE IF NOT EXISTS sources(sourceId INTEGER PRIMARY KEY, sourcePath TEXT)";

/// SQL to create the staging symbols table.
/// Temporary, so it is private to the connection running the merge.
pub const CREATE_NEW_SYMBOLS_TABLE: &str =
    "CREATE TEMPORARY TABLE IF NOT EXISTS newSymbols(temporarySymbolId INTEGER PRIMARY KEY, symbolId INTEGER, usr TEXT, symbolName TEXT)";

/// SQL to create the staging locations table
pub const CREATE_NEW_LOCATIONS_TABLE: &str =
    "CREATE TEMPORARY TABLE IF NOT EXISTS newLocations(temporarySymbolId INTEGER, symbolId INTEGER, line INTEGER, column INTEGER, sourceId INTEGER)";

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS index_symbols_usr ON symbols(usr)",
    "CREATE INDEX IF NOT EXISTS index_locations_sourceId ON locations(sourceId)",
    "CREATE INDEX IF NOT EXISTS index_locations_symbolId ON locations(symbolId)",
    "CREATE INDEX IF NOT EXISTS temp.index_newSymbols_usr ON newSymbols(usr)",
    "CREATE INDEX IF NOT EXISTS temp.index_newLocations_sourceId ON newLocations(sourceId)",
];

/// Persistent tables, in creation order
pub const PERSISTENT_TABLES: &[&str] = &["symbols", "locations", "sources"];

/// Staging tables, in creation order
pub const STAGING_TABLES: &[&str] = &["newSymbols", "newLocations"];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_SYMBOLS_TABLE,
        CREATE_LOCATIONS_TABLE,
        CREATE_SOURCES_TABLE,
        CREATE_NEW_SYMBOLS_TABLE,
        CREATE_NEW_LOCATIONS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
