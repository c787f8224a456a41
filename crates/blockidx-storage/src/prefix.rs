//! Prefixed store
//!
//! Wraps a store so that every key is transparently placed under a
//! namespace prefix, letting several indexes share one database.

use std::ops::{Bound, ControlFlow};

use crate::error::StorageError;
use crate::{KvStore, WriteBatch, prefix_end};

/// A [`KvStore`] view restricted to keys under a fixed prefix
///
/// Callers see un-prefixed keys on both the write and read paths.
#[derive(Debug, Clone)]
pub struct PrefixStore<S> {
    inner: S,
    prefix: Vec<u8>,
    prefix_end: Option<Vec<u8>>,
}

impl<S: KvStore> PrefixStore<S> {
    /// Namespace `inner` under `prefix`
    ///
    /// A `/` separator is appended so that `block_events` and
    /// `block_events2` never overlap.
    pub fn new(inner: S, prefix: impl AsRef<[u8]>) -> Self {
        let mut prefix = prefix.as_ref().to_vec();
        prefix.push(b'/');
        let end = prefix_end(&prefix);
        Self {
            inner,
            prefix,
            prefix_end: end,
        }
    }

    /// The full key prefix, including the separator
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn wrap(&self, key: &[u8]) -> Vec<u8> {
        let mut wrapped = Vec::with_capacity(self.prefix.len() + key.len());
        wrapped.extend_from_slice(&self.prefix);
        wrapped.extend_from_slice(key);
        wrapped
    }
}

impl<S: KvStore> KvStore for PrefixStore<S> {
    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        self.inner.commit(batch.prefixed(&self.prefix))
    }

    fn scan(
        &self,
        lower: Bound<&[u8]>,
        upper: Bound<&[u8]>,
        visit: &mut dyn FnMut(&[u8], &[u8]) -> ControlFlow<()>,
    ) -> Result<(), StorageError> {
        let lower_key = match lower {
            Bound::Included(key) | Bound::Excluded(key) => self.wrap(key),
            Bound::Unbounded => self.prefix.clone(),
        };
        let upper_key = match upper {
            Bound::Included(key) | Bound::Excluded(key) => Some(self.wrap(key)),
            Bound::Unbounded => self.prefix_end.clone(),
        };

        let lower = match lower {
            Bound::Excluded(_) => Bound::Excluded(lower_key.as_slice()),
            _ => Bound::Included(lower_key.as_slice()),
        };
        let upper = match (upper, &upper_key) {
            (Bound::Included(_), Some(key)) => Bound::Included(key.as_slice()),
            (_, Some(key)) => Bound::Excluded(key.as_slice()),
            (_, None) => Bound::Unbounded,
        };

        let prefix = self.prefix.as_slice();
        self.inner.scan(lower, upper, &mut |key, value| match key.strip_prefix(prefix) {
            Some(key) => visit(key, value),
            None => ControlFlow::Continue(()),
        })
    }
}
