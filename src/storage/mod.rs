//! Storage Layer - staged, atomic merges into SQLite
//!
//! Persistent tables:
//! - symbols(symbolId, usr, symbolName)
//! - locations(symbolId, line, column, sourceId)
//! - sources(sourceId, sourcePath)
//!
//! Connection-private staging tables:
//! - newSymbols(temporarySymbolId, symbolId, usr, symbolName)
//! - newLocations(temporarySymbolId, symbolId, line, column, sourceId)

pub mod database;
pub mod merge;
pub mod schema;
pub mod sqlite;
pub mod staging;
pub mod statements;
pub mod store;
pub mod transaction;

pub use database::{Database, SqlValue};
pub use merge::{MergeStats, MergeTransaction};
pub use sqlite::SqliteDatabase;
pub use store::{StoreStats, SymbolStore};
pub use transaction::Transaction;
