//! Merge batch files
//!
//! A batch is the output of one re-indexing pass, serialized as JSON:
//!
//! ```json
//! {
//!   "sources":   [{"sourceId": 7, "sourcePath": "src/foo.cpp"}],
//!   "symbols":   [{"usr": "c:@F@foo#", "name": "foo"}],
//!   "locations": [{"symbol": 0, "line": 3, "column": 1, "sourceId": 7}]
//! }
//! ```
//!
//! `locations[].symbol` indexes into `symbols` of the same batch.

use std::collections::HashSet;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::storage::{Database, MergeStats, SymbolStore};
use crate::symbol::{SourceId, TemporarySymbolId};
use crate::{Error, Result};

/// Temporary ids start at 1, so this one never names a staged symbol.
const DANGLING_TEMPORARY_ID: TemporarySymbolId = TemporarySymbolId(0);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub sources: Vec<BatchSource>,
    #[serde(default)]
    pub symbols: Vec<BatchSymbol>,
    #[serde(default)]
    pub locations: Vec<BatchLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSource {
    pub source_id: SourceId,
    pub source_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSymbol {
    pub usr: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchLocation {
    pub symbol: usize,
    pub line: u32,
    pub column: u32,
    pub source_id: SourceId,
}

impl Batch {
    /// Parse a batch from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Batch(e.to_string()))
    }

    /// Read a batch file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Each source may be listed once
    fn check_sources(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.sources.len());
        for source in &self.sources {
            if !seen.insert(source.source_id) {
                return Err(Error::Batch(format!("duplicate sourceId {}", source.source_id)));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty() && self.locations.is_empty() && self.sources.is_empty()
    }

    /// Stage the whole batch and merge it in one transaction.
    ///
    /// Only sources that are referenced by the batch and not yet known are
    /// registered; paths of existing sources are left as they are.
    pub fn apply<D: Database>(&self, store: &mut SymbolStore<D>) -> Result<MergeStats> {
        self.check_sources()?;
        let mut merge = store.begin_merge()?;

        let mut temporary_ids = Vec::with_capacity(self.symbols.len());
        for symbol in &self.symbols {
            temporary_ids.push(merge.stage_symbol(&symbol.usr, &symbol.name)?);
        }

        for location in &self.locations {
            // Out-of-range indexes stage a dangling id; the merge rejects it.
            let temporary_id = temporary_ids
                .get(location.symbol)
                .copied()
                .unwrap_or(DANGLING_TEMPORARY_ID);
            merge.stage_location(temporary_id, location.line, location.column, location.source_id)?;
        }

        let new_sources = merge.new_source_ids()?;
        for source in &self.sources {
            if new_sources.contains(&source.source_id) {
                merge.insert_source(source.source_id, &source.source_path)?;
            }
        }

        let unnamed = new_sources
            .iter()
            .filter(|id| !self.sources.iter().any(|s| s.source_id == **id))
            .count();
        if unnamed > 0 {
            tracing::debug!("{} referenced sources have no path in this batch", unnamed);
        }

        merge.commit()
    }
}
