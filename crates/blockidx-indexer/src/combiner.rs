//! Result combination

use std::collections::BTreeSet;

/// Intersect per-condition height sets
///
/// Returns heights in ascending order without duplicates. No sets at all
/// yields an empty result.
pub fn intersect<I>(sets: I) -> Vec<i64>
where
    I: IntoIterator<Item = BTreeSet<i64>>,
{
    let mut sets: Vec<BTreeSet<i64>> = sets.into_iter().collect();
    if sets.is_empty() {
        return Vec::new();
    }

    // Start from the smallest set so every retain pass is as short as possible
    sets.sort_by_key(BTreeSet::len);
    let mut rest = sets.into_iter();
    let mut acc = rest.next().unwrap_or_default();
    for set in rest {
        if acc.is_empty() {
            break;
        }
        acc.retain(|height| set.contains(height));
    }

    acc.into_iter().collect()
}
