//! Block indexer
//!
//! [`BlockIndexer`] owns the store and turns each block's events into index
//! entries. Every call to [`BlockIndexer::index`] writes one atomic batch.

use std::ops::{Bound, ControlFlow};

use blockidx_core::{BLOCK_HEIGHT_FIELD, BlockEvents, composite_field};
use blockidx_storage::{KvStore, PrefixStore, RedbStore, WriteBatch, prefix_end};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::codec::{IndexKey, KeyValue, value_prefix};
use crate::config::IndexerConfig;
use crate::error::{IndexError, IndexResult};

/// Indexes block events and answers height queries over them
#[derive(Debug, Clone)]
pub struct BlockIndexer<S> {
    store: S,
}

impl BlockIndexer<PrefixStore<RedbStore>> {
    /// Open the redb database named in `config`, namespaced under
    /// `config.namespace`
    #[instrument(skip(config), fields(namespace = %config.namespace))]
    pub fn open(config: &IndexerConfig) -> IndexResult<Self> {
        config.validate()?;
        let db = RedbStore::open(&config.storage)?;
        info!("Opened block indexer");
        Ok(Self::new(PrefixStore::new(db, &config.namespace)))
    }
}

impl<S: KvStore> BlockIndexer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Index every indexed attribute of `block`, plus its height
    ///
    /// All entries for the block become visible together or not at all.
    /// Indexing the same block twice writes the same keys again.
    #[instrument(skip(self, block, cancel), fields(height = block.height, events = block.events.len()))]
    pub fn index(&self, block: &BlockEvents, cancel: &CancellationToken) -> IndexResult<()> {
        let batch = match build_batch(block, cancel) {
            Ok(batch) => batch,
            Err(IndexError::Cancelled) => {
                warn!("Indexing cancelled before commit");
                return Err(IndexError::Cancelled);
            }
            Err(err) => return Err(err),
        };

        let entries = batch.len();
        self.store.commit(batch)?;
        debug!(entries, "Indexed block");
        Ok(())
    }

    /// Whether `height` has been indexed
    pub fn has(&self, height: i64) -> IndexResult<bool> {
        let prefix = value_prefix(BLOCK_HEIGHT_FIELD, &KeyValue::Numeric(height));
        let end = prefix_end(&prefix);
        let upper = match &end {
            Some(end) => Bound::Excluded(end.as_slice()),
            None => Bound::Unbounded,
        };

        let mut found = false;
        self.store.scan(Bound::Included(prefix.as_slice()), upper, &mut |_, _| {
            found = true;
            ControlFlow::Break(())
        })?;
        Ok(found)
    }
}

/// Build the write batch for one block
///
/// The height entry takes sequence 0 and attributes are numbered from 1 in
/// event order. Events without a type and attributes without a key are
/// skipped.
fn build_batch(block: &BlockEvents, cancel: &CancellationToken) -> IndexResult<WriteBatch> {
    let height = block.height;
    let attributes: usize = block.events.iter().map(|e| e.attributes.len()).sum();
    let mut batch = WriteBatch::with_capacity(1 + attributes);
    batch.put(
        IndexKey::new(BLOCK_HEIGHT_FIELD, KeyValue::Numeric(height), height, 0).encode(),
        Vec::new(),
    );

    let mut sequence = 0u64;
    for event in block.events.iter().filter(|e| !e.kind.is_empty()) {
        for attribute in event.indexed_attributes() {
            if cancel.is_cancelled() {
                return Err(IndexError::Cancelled);
            }
            if attribute.key.is_empty() {
                continue;
            }

            let field = composite_field(&event.kind, &attribute.key);
            if field == BLOCK_HEIGHT_FIELD {
                return Err(IndexError::ReservedField(field));
            }

            sequence += 1;
            let key = IndexKey::new(field, KeyValue::classify(&attribute.value), height, sequence);
            batch.put(key.encode(), Vec::new());
        }
    }

    if cancel.is_cancelled() {
        return Err(IndexError::Cancelled);
    }
    Ok(batch)
}
