//! Indexer configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is valid:
//!
//! ```toml
//! namespace = "block_events"
//!
//! [storage]
//! db_path = "./data/block_index.redb"
//! cache_size = 67108864
//! ```

use std::path::{Path, PathBuf};

use blockidx_storage::RedbStoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

/// Namespace block event entries are stored under by default
pub const DEFAULT_NAMESPACE: &str = "block_events";

/// Configuration for [`crate::BlockIndexer::open`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Key prefix separating this index from other data in the same database
    pub namespace: String,
    pub storage: RedbStoreConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            storage: RedbStoreConfig::default(),
        }
    }
}

impl IndexerConfig {
    /// Parse configuration from a TOML document
    pub fn from_toml_str(content: &str) -> IndexResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| IndexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> IndexResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| IndexError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Use a different database file
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage.db_path = path.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn validate(&self) -> IndexResult<()> {
        if self.namespace.is_empty() {
            return Err(IndexError::Config("namespace must not be empty".into()));
        }
        if self.storage.cache_size == 0 {
            return Err(IndexError::Config("storage.cache_size must be positive".into()));
        }
        Ok(())
    }
}
