//! Search orchestration
//!
//! Plan, evaluate each condition with the [`RangeScanner`], intersect.

use blockidx_core::Condition;
use blockidx_storage::KvStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::combiner::intersect;
use crate::error::{IndexError, IndexResult};
use crate::indexer::BlockIndexer;
use crate::planner::plan;
use crate::scanner::RangeScanner;

impl<S: KvStore> BlockIndexer<S> {
    /// Heights matching every condition, ascending and deduplicated
    ///
    /// The first failing condition aborts the whole search. Once one
    /// condition matches nothing the remaining ones are not scanned.
    #[instrument(skip(self, conditions, cancel), fields(conditions = conditions.len()))]
    pub fn search(&self, conditions: &[Condition], cancel: &CancellationToken) -> IndexResult<Vec<i64>> {
        let plan = plan(conditions)?;
        let scanner = RangeScanner::new(self.store(), cancel);

        let mut sets = Vec::with_capacity(plan.len());
        for condition in plan.iter() {
            let heights = match scanner.evaluate(condition) {
                Ok(heights) => heights,
                Err(IndexError::Cancelled) => {
                    warn!(%condition, "Search cancelled");
                    return Err(IndexError::Cancelled);
                }
                Err(err) => return Err(err),
            };
            debug!(%condition, matches = heights.len(), "Evaluated condition");

            let exhausted = heights.is_empty();
            sets.push(heights);
            if exhausted {
                break;
            }
        }

        let results = intersect(sets);
        debug!(results = results.len(), "Search complete");
        Ok(results)
    }
}
