//! # Blockidx Indexer
//!
//! Indexes the attributes of block events into an ordered key-value store
//! and answers conjunctive queries with the matching block heights.
//!
//! ## Key Components
//!
//! - [`BlockIndexer`]: Entry point; `index` writes a block, `search` queries
//! - [`codec`]: Order-preserving index key encoding
//! - [`RangeScanner`]: Evaluates one condition as a key range or prefix scan
//! - [`plan`]: Validates conditions and puts height conditions first
//! - [`intersect`]: Combines per-condition results
//!
//! ## Example
//!
//! ```rust,ignore
//! use blockidx_indexer::{BlockIndexer, CancellationToken};
//! use blockidx_core::{BlockEvents, Condition, Event, EventAttribute};
//! use blockidx_storage::MemoryStore;
//!
//! let indexer = BlockIndexer::new(MemoryStore::new());
//! let cancel = CancellationToken::new();
//!
//! let block = BlockEvents::new(1).with_event(
//!     Event::new("begin_event").with_attribute(EventAttribute::indexed("proposer", "FCAA001")),
//! );
//! indexer.index(&block, &cancel)?;
//!
//! let heights = indexer.search(&[Condition::eq("begin_event.proposer", "FCAA001")], &cancel)?;
//! assert_eq!(heights, vec![1]);
//! ```

pub mod codec;
pub mod combiner;
pub mod config;
pub mod error;
pub mod indexer;
pub mod planner;
pub mod scanner;
mod search;

// Re-exports
pub use codec::{IndexKey, KeyError, KeyValue, TypeTag};
pub use combiner::intersect;
pub use config::{DEFAULT_NAMESPACE, IndexerConfig};
pub use error::{IndexError, IndexResult};
pub use indexer::BlockIndexer;
pub use planner::{QueryPlan, plan};
pub use scanner::RangeScanner;
pub use tokio_util::sync::CancellationToken;
