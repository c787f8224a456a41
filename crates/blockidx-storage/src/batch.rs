//! Write batches
//!
//! A [`WriteBatch`] collects puts that a backend applies in one atomic
//! transaction. Dropping a batch without committing it discards it.

/// Ordered list of key-value puts applied atomically by [`crate::KvStore::commit`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    puts: Vec<(Vec<u8>, Vec<u8>)>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty batch with room for `capacity` puts
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            puts: Vec::with_capacity(capacity),
        }
    }

    /// Queue a put; later puts to the same key win
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.puts.push((key.into(), value.into()));
    }

    pub fn len(&self) -> usize {
        self.puts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puts.is_empty()
    }

    /// Iterate over queued puts in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.puts.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }

    /// Prepend `prefix` to every queued key
    pub fn prefixed(self, prefix: &[u8]) -> Self {
        let puts = self
            .puts
            .into_iter()
            .map(|(key, value)| {
                let mut prefixed = Vec::with_capacity(prefix.len() + key.len());
                prefixed.extend_from_slice(prefix);
                prefixed.extend_from_slice(&key);
                (prefixed, value)
            })
            .collect();
        Self { puts }
    }
}

impl IntoIterator for WriteBatch {
    type Item = (Vec<u8>, Vec<u8>);
    type IntoIter = std::vec::IntoIter<(Vec<u8>, Vec<u8>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.puts.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_preserves_order() {
        let mut batch = WriteBatch::new();
        batch.put(b"b".as_slice(), b"2".as_slice());
        batch.put(b"a".as_slice(), b"1".as_slice());

        assert_eq!(batch.len(), 2);
        let keys: Vec<_> = batch.iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(keys, vec![b"b".to_vec(), b"a".to_vec()]);
    }

    #[test]
    fn test_prefixed() {
        let mut batch = WriteBatch::new();
        batch.put(b"key".as_slice(), b"value".as_slice());

        let prefixed: Vec<_> = batch.prefixed(b"ns/").into_iter().collect();
        assert_eq!(prefixed, vec![(b"ns/key".to_vec(), b"value".to_vec())]);
    }

    #[test]
    fn test_empty_batch() {
        let batch = WriteBatch::with_capacity(8);
        assert!(batch.is_empty());
        assert_eq!(batch.iter().count(), 0);
    }
}
