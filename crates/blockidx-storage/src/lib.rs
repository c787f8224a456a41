//! # Blockidx Storage
//!
//! Ordered key-value storage for the block event index.
//!
//! The indexer only needs a narrow capability set from its store: atomic
//! multi-key commits and ascending iteration between two byte-key bounds.
//! [`KvStore`] captures exactly that, and this crate ships three backends.
//!
//! ## Features
//!
//! - **KvStore trait**: Atomic batch commit plus bounded range iteration
//! - **RedbStore**: Persistent implementation backed by redb
//! - **MemoryStore**: In-memory implementation for testing
//! - **PrefixStore**: Namespaces an existing store under a key prefix
//!
//! ## Example
//!
//! ```rust,ignore
//! use blockidx_storage::{KvStore, MemoryStore, WriteBatch};
//!
//! let store = MemoryStore::new();
//!
//! let mut batch = WriteBatch::new();
//! batch.put(b"a".to_vec(), Vec::new());
//! batch.put(b"b".to_vec(), Vec::new());
//! store.commit(batch).unwrap();
//!
//! let entries = store.scan_prefix(b"").unwrap();
//! assert_eq!(entries.len(), 2);
//! ```

pub mod batch;
pub mod error;
pub mod memory;
pub mod persistent;
pub mod prefix;

// Re-exports
pub use batch::WriteBatch;
pub use error::StorageError;
pub use memory::MemoryStore;
pub use persistent::{RedbStore, RedbStoreConfig};
pub use prefix::PrefixStore;

use std::ops::{Bound, ControlFlow};
use std::sync::Arc;

/// Type alias for scan results to simplify complex type
pub type ScanResults = Vec<(Vec<u8>, Vec<u8>)>;

/// Ordered byte-key store with atomic batch writes
///
/// Keys are compared lexicographically as unsigned bytes. Reads must be
/// safe to run concurrently with each other and with a commit; a reader
/// observes either all or none of a batch.
pub trait KvStore: Send + Sync {
    /// Atomically apply every put in the batch
    ///
    /// On error nothing from the batch is visible.
    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError>;

    /// Visit entries in ascending key order between two bounds
    ///
    /// Iteration stops when the visitor returns [`ControlFlow::Break`].
    fn scan(
        &self,
        lower: Bound<&[u8]>,
        upper: Bound<&[u8]>,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), StorageError>;

    /// Put a single key-value pair
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let mut batch = WriteBatch::with_capacity(1);
        batch.put(key, value);
        self.commit(batch)
    }

    /// Get the value stored under a key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let mut found = None;
        self.scan(Bound::Included(key), Bound::Included(key), &mut |_, value| {
            found = Some(value.to_vec());
            ControlFlow::Break(())
        })?;
        Ok(found)
    }

    /// Collect every entry whose key starts with `prefix`
    fn scan_prefix(&self, prefix: &[u8]) -> Result<ScanResults, StorageError> {
        let end = prefix_end(prefix);
        let upper = match &end {
            Some(end) => Bound::Excluded(end.as_slice()),
            None => Bound::Unbounded,
        };

        let mut results = Vec::new();
        self.scan(Bound::Included(prefix), upper, &mut |key, value| {
            results.push((key.to_vec(), value.to_vec()));
            ControlFlow::Continue(())
        })?;
        Ok(results)
    }
}

impl<S: KvStore + ?Sized> KvStore for Arc<S> {
    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        (**self).commit(batch)
    }

    fn scan(
        &self,
        lower: Bound<&[u8]>,
        upper: Bound<&[u8]>,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), StorageError> {
        (**self).scan(lower, upper, visit)
    }
}

/// Smallest key that sorts after every key starting with `prefix`
///
/// Returns `None` when no such key exists (empty or all-`0xFF` prefix),
/// in which case the range is unbounded above.
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Whether the bounds can contain no key at all
///
/// Backends use this to skip inverted ranges, which some ordered maps
/// reject outright.
pub fn range_is_empty(lower: Bound<&[u8]>, upper: Bound<&[u8]>) -> bool {
    match (lower, upper) {
        (_, Bound::Excluded(upper)) if upper.is_empty() => true,
        (Bound::Included(lower), Bound::Included(upper)) => lower > upper,
        (Bound::Included(lower), Bound::Excluded(upper))
        | (Bound::Excluded(lower), Bound::Included(upper))
        | (Bound::Excluded(lower), Bound::Excluded(upper)) => lower >= upper,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the KvStore trait is object-safe
    fn _assert_object_safe(_: &dyn KvStore) {}

    #[test]
    fn test_prefix_end() {
        assert_eq!(prefix_end(b"abc"), Some(b"abd".to_vec()));
        assert_eq!(prefix_end(&[0x01, 0xFF]), Some(vec![0x02]));
        assert_eq!(prefix_end(&[0xFF, 0xFF]), None);
        assert_eq!(prefix_end(&[]), None);
    }

    #[test]
    fn test_range_is_empty() {
        use Bound::*;

        let a = b"a".as_slice();
        let b = b"b".as_slice();

        assert!(!range_is_empty(Included(a), Included(a)));
        assert!(range_is_empty(Excluded(a), Included(a)));
        assert!(range_is_empty(Included(a), Excluded(a)));
        assert!(range_is_empty(Included(b), Included(a)));
        assert!(!range_is_empty(Included(a), Excluded(b)));
        assert!(!range_is_empty(Unbounded, Included(a)));
        assert!(range_is_empty(Unbounded, Excluded(&[])));
        assert!(!range_is_empty(Excluded(b), Unbounded));
    }

    #[test]
    fn test_provided_methods_through_arc() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());

        store.put(b"user:alice", b"1").unwrap();
        store.put(b"user:bob", b"2").unwrap();
        store.put(b"group:admins", b"3").unwrap();

        assert_eq!(store.get(b"user:bob").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"user:carol").unwrap(), None);

        let users = store.scan_prefix(b"user:").unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].0, b"user:alice".to_vec());
    }
}
