//! Symbol index rows
//!
//! The persistent model is three tables:
//! - `symbols`: one row per distinct `usr`
//! - `sources`: one row per indexed file
//! - `locations`: every place a symbol occurs in a source

use serde::{Deserialize, Serialize};
use std::fmt;

/// Surrogate key of a row in `symbols`, assigned by the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub i64);

/// Key of a row in `sources`, chosen by the extraction pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub i64);

/// Batch-local key of a staged symbol.
///
/// Only meaningful inside the merge transaction that handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemporarySymbolId(pub i64);

macro_rules! impl_id_display {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        })*
    };
}

impl_id_display!(SymbolId, SourceId, TemporarySymbolId);

/// A persisted symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    /// Stable cross-translation-unit reference, unique across all symbols
    pub usr: String,
    /// Display name
    pub name: String,
}

/// A persisted source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: SourceId,
    pub path: String,
}

/// One occurrence of a symbol in a source file.
///
/// Locations have no identity beyond the full tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub symbol_id: SymbolId,
    pub line: u32,
    pub column: u32,
    pub source_id: SourceId,
}

impl Location {
    pub fn new(symbol_id: SymbolId, line: u32, column: u32, source_id: SourceId) -> Self {
        Self {
            symbol_id,
            line,
            column,
            source_id,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{} (symbol {})", self.source_id, self.line, self.column, self.symbol_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&SourceId(7)).unwrap();
        assert_eq!(json, "7");

        let id: TemporarySymbolId = serde_json::from_str("3").unwrap();
        assert_eq!(id, TemporarySymbolId(3));
    }

    #[test]
    fn test_location_ordering() {
        let a = Location::new(SymbolId(1), 3, 1, SourceId(7));
        let b = Location::new(SymbolId(1), 9, 1, SourceId(7));
        assert!(a < b);
        assert_eq!(a.to_string(), "7:3:1 (symbol 1)");
    }
}
