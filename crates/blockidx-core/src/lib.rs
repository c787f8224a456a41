//! # Blockidx Core
//!
//! Plain data types shared by the block event indexer crates.
//!
//! ## Key Types
//!
//! - [`BlockEvents`]: A block height together with the events its execution emitted
//! - [`Event`] / [`EventAttribute`]: Typed events and their key/value attributes
//! - [`Condition`] / [`Operator`]: One compiled query condition, ANDed with others
//! - [`ValueKind`]: Numeric/text classification applied to stored values and operands
//!
//! Every attribute addresses a *composite field* `<event type>.<attribute key>`.
//! The reserved field [`BLOCK_HEIGHT_FIELD`] is bound to the block height itself.

pub mod event;
pub mod query;
pub mod value;

// Re-export main types
pub use event::*;
pub use query::*;
pub use value::*;
