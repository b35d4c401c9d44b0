//! `symstore.toml` handling
//!
//! The file only names where the index lives and how long a merge waits for
//! a competing writer. Command-line flags win over the file, the file wins
//! over built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::storage::sqlite::DEFAULT_BUSY_TIMEOUT_MS;
use crate::storage::SymbolStore;

pub const CONFIG_FILE_NAME: &str = "symstore.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SymstoreConfig {
    pub database: Option<String>,
    /// How long a merge waits for another writer before failing
    pub busy_timeout_ms: Option<u64>,
}

/// Where and how to open the index, after every override is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    pub database: PathBuf,
    pub busy_timeout: Duration,
}

impl SymstoreConfig {
    /// Read the config file; a missing file yields the defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: SymstoreConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write the config file, refusing to clobber one unless `force` is set
    pub fn save(&self, path: &Path, force: bool) -> anyhow::Result<()> {
        if path.exists() && !force {
            anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
        }

        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Pin the database path, e.g. after `init` picked one
    pub fn pinned_to(&self, location: &StoreLocation) -> Self {
        Self {
            database: Some(location.database.display().to_string()),
            ..self.clone()
        }
    }

    /// Apply the `--database` override and fill in defaults
    pub fn resolve(&self, database_override: Option<&Path>) -> StoreLocation {
        let database = database_override
            .map(Path::to_path_buf)
            .or_else(|| self.database.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_database_path);
        StoreLocation {
            database,
            busy_timeout: Duration::from_millis(self.busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS)),
        }
    }
}

impl StoreLocation {
    /// Open the index, creating its parent directory on first use
    pub fn open(&self) -> anyhow::Result<SymbolStore> {
        if let Some(parent) = self.database.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(SymbolStore::open_with_timeout(&self.database, self.busy_timeout)?)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from(".symstore").join("index.db")
}
