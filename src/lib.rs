//! # symstore - Incremental Symbol Index Store
//!
//! Persists code symbols (keyed by their cross-translation-unit `usr`) and
//! the per-file locations where they occur, so lookups never need a re-parse.
//!
//! symstore provides:
//! - A backend-agnostic `Database` trait with a SQLite adapter
//! - Idempotent schema creation for persistent and staging tables
//! - Staged, set-based merge batches committed in one immediate transaction
//! - Read-side lookups for the query layer

pub mod symbol;
pub mod storage;
pub mod batch;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use symbol::{Location, Source, SourceId, Symbol, SymbolId, TemporarySymbolId};
pub use storage::{Database, MergeStats, MergeTransaction, SqliteDatabase, SymbolStore};
pub use batch::Batch;

/// Result type alias for symstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for symstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[source] Box<Error>),

    #[error("Transaction error: {0}")]
    Transaction(#[source] Box<Error>),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Batch error: {0}")]
    Batch(String),
}
