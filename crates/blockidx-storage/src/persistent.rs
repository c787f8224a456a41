//! redb-backed persistent store
//!
//! All index entries live in a single `&[u8] -> &[u8]` table. Each commit
//! is one redb write transaction and each scan runs inside one read
//! transaction, so readers always see a consistent snapshot.

use std::ops::{Bound, ControlFlow};
use std::path::PathBuf;
use std::sync::Arc;

use redb::backends::InMemoryBackend;
use redb::{Builder, Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use crate::error::StorageError;
use crate::{KvStore, WriteBatch, range_is_empty};

// Key: encoded index key, Value: empty (the key carries everything)
pub const BLOCK_INDEX: TableDefinition<&[u8], &[u8]> = TableDefinition::new("block_index");

/// Configuration for redb storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedbStoreConfig {
    /// Path to the database file
    pub db_path: PathBuf,
    /// Cache size in bytes
    pub cache_size: usize,
}

impl Default for RedbStoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/block_index.redb"),
            cache_size: 64 * 1024 * 1024, // 64MB
        }
    }
}

/// Persistent [`KvStore`] backed by redb
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database
    #[instrument(skip(config), fields(path = %config.db_path.display()))]
    pub fn open(config: &RedbStoreConfig) -> Result<Self, StorageError> {
        // Ensure parent directory exists
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Builder::new()
            .set_cache_size(config.cache_size)
            .create(&config.db_path)?;

        info!("Opened redb database");
        Self::init(db)
    }

    /// Create a database that lives only in memory
    pub fn in_memory() -> Result<Self, StorageError> {
        let db = Builder::new().create_with_backend(InMemoryBackend::new())?;
        Self::init(db)
    }

    /// Create the index table so read transactions can always open it
    fn init(db: Database) -> Result<Self, StorageError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(BLOCK_INDEX)?;
        write_txn.commit()?;

        debug!("Initialized redb tables");
        Ok(Self { db: Arc::new(db) })
    }

    /// Get a reference to the database
    pub fn db(&self) -> &Database {
        &self.db
    }
}

impl KvStore for RedbStore {
    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let count = batch.len();
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(BLOCK_INDEX)?;
            for (key, value) in batch.iter() {
                table.insert(key, value)?;
            }
        }
        // An error before this point drops the transaction, which aborts it
        write_txn.commit()?;

        trace!(entries = count, "Committed batch to redb");
        Ok(())
    }

    fn scan(
        &self,
        lower: Bound<&[u8]>,
        upper: Bound<&[u8]>,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), StorageError> {
        if range_is_empty(lower, upper) {
            return Ok(());
        }

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BLOCK_INDEX)?;

        for entry in table.range::<&[u8]>((lower, upper))? {
            let (key, value) = entry?;
            if visit(key.value(), value.value()).is_break() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (RedbStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = RedbStoreConfig {
            db_path: temp_dir.path().join("test.redb"),
            ..Default::default()
        };
        let storage = RedbStore::open(&config).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_put_get() {
        let (storage, _temp) = create_test_storage();

        storage.put(b"test_key", b"test_value").unwrap();

        let retrieved = storage.get(b"test_key").unwrap();
        assert_eq!(retrieved, Some(b"test_value".to_vec()));
    }

    #[test]
    fn test_scan_prefix() {
        let (storage, _temp) = create_test_storage();

        let mut batch = WriteBatch::new();
        batch.put(b"user:alice".as_slice(), b"data1".as_slice());
        batch.put(b"user:bob".as_slice(), b"data2".as_slice());
        batch.put(b"user:charlie".as_slice(), b"data3".as_slice());
        batch.put(b"group:admins".as_slice(), b"data4".as_slice());
        storage.commit(batch).unwrap();

        let users = storage.scan_prefix(b"user:").unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0].0, b"user:alice".to_vec());

        let groups = storage.scan_prefix(b"group:").unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_exclusive_bounds() {
        let storage = RedbStore::in_memory().unwrap();
        for key in [b"k1", b"k2", b"k3"] {
            storage.put(key, b"").unwrap();
        }

        let mut keys = Vec::new();
        storage
            .scan(
                Bound::Excluded(b"k1".as_slice()),
                Bound::Excluded(b"k3".as_slice()),
                &mut |key, _| {
                    keys.push(key.to_vec());
                    ControlFlow::Continue(())
                },
            )
            .unwrap();
        assert_eq!(keys, vec![b"k2".to_vec()]);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let config = RedbStoreConfig {
            db_path: temp_dir.path().join("nested").join("index.redb"),
            ..Default::default()
        };

        {
            let storage = RedbStore::open(&config).unwrap();
            storage.put(b"persistent", b"data").unwrap();
        }

        let storage = RedbStore::open(&config).unwrap();
        assert_eq!(storage.get(b"persistent").unwrap(), Some(b"data".to_vec()));
    }
}
