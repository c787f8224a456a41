//! In-memory storage implementation
//!
//! This module provides an in-memory [`KvStore`], suitable for testing and
//! for hosts that rebuild the index on startup.

use std::collections::BTreeMap;
use std::ops::{Bound, ControlFlow};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::StorageError;
use crate::{KvStore, WriteBatch, range_is_empty};

/// In-memory implementation of KvStore
///
/// Uses a `BTreeMap` behind a read-write lock. A commit holds the write
/// lock for the whole batch, so readers never see half of one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl KvStore for MemoryStore {
    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let count = batch.len();
        let mut data = self.data.write();
        for (key, value) in batch {
            data.insert(key, value);
        }
        trace!(entries = count, "Committed batch to memory store");
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

        let data = self.data.read();
        for (key, value) in data.range::<[u8], _>((lower, upper)) {
            if visit(key, value).is_break() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> MemoryStore {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        for key in ["a", "b", "c", "d"] {
            batch.put(key.as_bytes(), key.to_uppercase().into_bytes());
        }
        store.commit(batch).unwrap();
        store
    }

    fn collect(store: &MemoryStore, lower: Bound<&[u8]>, upper: Bound<&[u8]>) -> Vec<String> {
        let mut keys = Vec::new();
        store
            .scan(lower, upper, &mut |key, _| {
                keys.push(String::from_utf8(key.to_vec()).unwrap());
                ControlFlow::Continue(())
            })
            .unwrap();
        keys
    }

    #[test]
    fn test_commit_and_get() {
        let store = populated();
        assert_eq!(store.len(), 4);
        assert_eq!(store.get(b"c").unwrap(), Some(b"C".to_vec()));
        assert_eq!(store.get(b"z").unwrap(), None);
    }

    #[test]
    fn test_scan_bounds() {
        let store = populated();
        let b = b"b".as_slice();
        let d = b"d".as_slice();

        assert_eq!(collect(&store, Bound::Included(b), Bound::Excluded(d)), vec!["b", "c"]);
        assert_eq!(collect(&store, Bound::Excluded(b), Bound::Included(d)), vec!["c", "d"]);
        assert_eq!(collect(&store, Bound::Unbounded, Bound::Included(b)), vec!["a", "b"]);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let store = populated();
        let b = b"b".as_slice();
        let d = b"d".as_slice();

        assert!(collect(&store, Bound::Included(d), Bound::Included(b)).is_empty());
        assert!(collect(&store, Bound::Excluded(b), Bound::Excluded(b)).is_empty());
    }

    #[test]
    fn test_scan_stops_on_break() {
        let store = populated();
        let mut seen = 0;
        store
            .scan(Bound::Unbounded, Bound::Unbounded, &mut |_, _| {
                seen += 1;
                if seen == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(seen, 2);
    }
}
