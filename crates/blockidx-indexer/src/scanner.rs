//! Range scanner
//!
//! Evaluates a single condition against the store and returns the set of
//! heights with at least one matching entry.
//!
//! | Operator | Scanned keys                                   |
//! |----------|------------------------------------------------|
//! | `=`      | field, operand tag, operand value              |
//! | `<` `<=` | numeric entries of the field, below the operand |
//! | `>` `>=` | numeric entries of the field, above the operand |
//! | CONTAINS | every entry of the field, filtered on decode   |

use std::collections::BTreeSet;
use std::ops::{Bound, ControlFlow};

use blockidx_core::{Condition, Operator};
use blockidx_storage::{KvStore, prefix_end};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::codec::{IndexKey, KeyValue, TypeTag, field_prefix, tag_prefix, value_prefix, with_max_suffix};
use crate::error::{IndexError, IndexResult};

/// Evaluates conditions against one store
pub struct RangeScanner<'a, S: ?Sized> {
    store: &'a S,
    cancel: &'a CancellationToken,
}

impl<'a, S: KvStore + ?Sized> RangeScanner<'a, S> {
    pub fn new(store: &'a S, cancel: &'a CancellationToken) -> Self {
        Self { store, cancel }
    }

    /// Heights of every entry matching `condition`
    ///
    /// Range operators need an integer operand; anything else is an
    /// [`IndexError::InvalidQuery`].
    pub fn evaluate(&self, condition: &Condition) -> IndexResult<BTreeSet<i64>> {
        match condition.op {
            Operator::Eq => self.scan_eq(&condition.field, &condition.operand),
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
                let operand = condition.operand_kind().as_numeric().ok_or_else(|| {
                    IndexError::invalid_query(format!(
                        "operator {} requires an integer operand, got {:?}",
                        condition.op, condition.operand
                    ))
                })?;
                self.scan_range(&condition.field, condition.op, operand)
            }
            Operator::Contains => self.scan_contains(&condition.field, &condition.operand),
        }
    }

    fn scan_eq(&self, field: &str, operand: &str) -> IndexResult<BTreeSet<i64>> {
        let prefix = value_prefix(field, &KeyValue::classify(operand));
        self.scan_prefix(&prefix, |_| true)
    }

    fn scan_range(&self, field: &str, op: Operator, operand: i64) -> IndexResult<BTreeSet<i64>> {
        let base = tag_prefix(field, TypeTag::Numeric);
        let at = value_prefix(field, &KeyValue::Numeric(operand));
        let past = with_max_suffix(&at);
        let end = prefix_end(&base);
        let end = match &end {
            Some(end) => Bound::Excluded(end.as_slice()),
            None => Bound::Unbounded,
        };

        let (lower, upper) = match op {
            Operator::Lt => (Bound::Included(base.as_slice()), Bound::Excluded(at.as_slice())),
            Operator::Lte => (Bound::Included(base.as_slice()), Bound::Included(past.as_slice())),
            Operator::Gt => (Bound::Excluded(past.as_slice()), end),
            Operator::Gte => (Bound::Included(at.as_slice()), end),
            Operator::Eq | Operator::Contains => {
                return Err(IndexError::invalid_query(format!(
                    "operator {op} is not a range operator"
                )));
            }
        };

        self.collect(lower, upper, |_| true)
    }

    fn scan_contains(&self, field: &str, operand: &str) -> IndexResult<BTreeSet<i64>> {
        let prefix = field_prefix(field);
        self.scan_prefix(&prefix, |key| key.value.as_text().contains(operand))
    }

    fn scan_prefix(
        &self,
        prefix: &[u8],
        matches: impl FnMut(&IndexKey) -> bool,
    ) -> IndexResult<BTreeSet<i64>> {
        let end = prefix_end(prefix);
        let upper = match &end {
            Some(end) => Bound::Excluded(end.as_slice()),
            None => Bound::Unbounded,
        };
        self.collect(Bound::Included(prefix), upper, matches)
    }

    /// Decode every key between the bounds and keep the heights of matches
    ///
    /// Stops at the first undecodable key or once the token is cancelled.
    fn collect(
        &self,
        lower: Bound<&[u8]>,
        upper: Bound<&[u8]>,
        mut matches: impl FnMut(&IndexKey) -> bool,
    ) -> IndexResult<BTreeSet<i64>> {
        if self.cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        trace!(lower = %DisplayBound(lower), upper = %DisplayBound(upper), "Scanning index");

        let mut heights = BTreeSet::new();
        let mut failure = None;
        self.store.scan(lower, upper, &mut |key, _| {
            if self.cancel.is_cancelled() {
                failure = Some(IndexError::Cancelled);
                return ControlFlow::Break(());
            }
            match IndexKey::decode(key) {
                Ok(entry) => {
                    if matches(&entry) {
                        heights.insert(entry.height);
                    }
                    ControlFlow::Continue(())
                }
                Err(err) => {
                    failure = Some(err.into());
                    ControlFlow::Break(())
                }
            }
        })?;

        match failure {
            Some(err) => Err(err),
            None => Ok(heights),
        }
    }
}

/// Hex rendering of a scan bound for trace output
struct DisplayBound<'a>(Bound<&'a [u8]>);

impl std::fmt::Display for DisplayBound<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Bound::Included(key) => write!(f, "[{}", hex::encode(key)),
            Bound::Excluded(key) => write!(f, "({}", hex::encode(key)),
            Bound::Unbounded => f.write_str("*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockidx_storage::{MemoryStore, WriteBatch};

    fn entry(field: &str, raw: &str, height: i64, sequence: u64) -> Vec<u8> {
        IndexKey::new(field, KeyValue::classify(raw), height, sequence).encode()
    }

    fn store_with(entries: &[(&str, &str, i64)]) -> MemoryStore {
        let store = MemoryStore::new();
        let mut batch = WriteBatch::new();
        for (sequence, (field, raw, height)) in entries.iter().enumerate() {
            batch.put(entry(field, raw, *height, sequence as u64 + 1), Vec::new());
        }
        store.commit(batch).unwrap();
        store
    }

    fn eval(store: &MemoryStore, condition: Condition) -> Vec<i64> {
        let cancel = CancellationToken::new();
        RangeScanner::new(store, &cancel)
            .evaluate(&condition)
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_eq_matches_exact_value() {
        let store = store_with(&[
            ("tx.to", "alice", 1),
            ("tx.to", "alice", 1),
            ("tx.to", "alicia", 2),
            ("tx.to", "ali", 3),
            ("tx.from", "alice", 4),
        ]);
        assert_eq!(eval(&store, Condition::eq("tx.to", "alice")), vec![1]);
        assert_eq!(eval(&store, Condition::eq("tx.to", "bob")), Vec::<i64>::new());
    }

    #[test]
    fn test_eq_is_type_segregated() {
        let store = store_with(&[("a.n", "5", 1), ("a.n", "05", 2), ("a.n", "five", 3)]);
        // "05" parses as the integer 5
        assert_eq!(eval(&store, Condition::eq("a.n", "5")), vec![1, 2]);
        assert_eq!(eval(&store, Condition::eq("a.n", "five")), vec![3]);
    }

    #[test]
    fn test_range_operators() {
        let store = store_with(&[
            ("a.n", "-10", 1),
            ("a.n", "0", 2),
            ("a.n", "5", 3),
            ("a.n", "5", 4),
            ("a.n", "100", 5),
            ("a.n", "text", 6),
            ("a.m", "3", 7),
        ]);

        assert_eq!(eval(&store, Condition::lt("a.n", 5)), vec![1, 2]);
        assert_eq!(eval(&store, Condition::lte("a.n", 5)), vec![1, 2, 3, 4]);
        assert_eq!(eval(&store, Condition::gt("a.n", 5)), vec![5]);
        assert_eq!(eval(&store, Condition::gte("a.n", 5)), vec![3, 4, 5]);
        assert_eq!(eval(&store, Condition::lt("a.n", -10)), Vec::<i64>::new());
        assert_eq!(eval(&store, Condition::gt("a.n", i64::MAX)), Vec::<i64>::new());
        assert_eq!(eval(&store, Condition::gte("a.n", i64::MIN)), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_range_rejects_text_operand() {
        let store = MemoryStore::new();
        let cancel = CancellationToken::new();
        let err = RangeScanner::new(&store, &cancel)
            .evaluate(&Condition::gt("a.n", "abc"))
            .unwrap_err();
        assert!(matches!(err, IndexError::InvalidQuery(_)));
    }

    #[test]
    fn test_contains_covers_both_tags() {
        let store = store_with(&[
            ("a.s", "FCAA001", 1),
            ("a.s", "fcaa001", 2),
            ("a.s", "10", 3),
            ("a.s", "22", 4),
            ("a.t", "1", 5),
        ]);
        assert_eq!(eval(&store, Condition::contains("a.s", "1")), vec![1, 2, 3]);
        assert_eq!(eval(&store, Condition::contains("a.s", "CAA")), vec![1]);
        assert_eq!(eval(&store, Condition::contains("a.s", "")), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_corrupt_key_is_an_encoding_error() {
        let store = store_with(&[("a.s", "x", 1)]);
        let mut corrupt = field_prefix("a.s");
        corrupt.push(0x07);
        store.put(&corrupt, b"").unwrap();

        let cancel = CancellationToken::new();
        let err = RangeScanner::new(&store, &cancel)
            .evaluate(&Condition::contains("a.s", "x"))
            .unwrap_err();
        assert!(matches!(err, IndexError::Encoding(_)));
    }

    #[test]
    fn test_cancelled_scan() {
        let store = store_with(&[("a.s", "x", 1)]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = RangeScanner::new(&store, &cancel)
            .evaluate(&Condition::eq("a.s", "x"))
            .unwrap_err();
        assert!(matches!(err, IndexError::Cancelled));
    }

    #[test]
    fn test_display_bound() {
        let key = [0xAB, 0x01].as_slice();
        assert_eq!(DisplayBound(Bound::Included(key)).to_string(), "[ab01");
        assert_eq!(DisplayBound(Bound::Excluded(key)).to_string(), "(ab01");
        assert_eq!(DisplayBound(Bound::Unbounded).to_string(), "*");
    }
}
