use crate::models::ItemIndex;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Descending score, then ascending index. `-0.0` and `0.0` tie.
fn by_rank(a: &(ItemIndex, f64), b: &(ItemIndex, f64)) -> Ordering {
    (b.1 + 0.0)
        .total_cmp(&(a.1 + 0.0))
        .then_with(|| a.0.cmp(&b.0))
}

/// Returns up to `n` `(index, score)` pairs in rank order, skipping `excluded`.
///
/// Only the top `n` are fully sorted; the rest are partitioned away.
pub fn rank_top_n(
    scores: &[f64],
    excluded: &BTreeSet<ItemIndex>,
    n: usize,
) -> Vec<(ItemIndex, f64)> {
    let mut candidates: Vec<(ItemIndex, f64)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(index, _)| !excluded.contains(index))
        .collect();

    let take = n.min(candidates.len());
    if take == 0 {
        return Vec::new();
    }

    if take < candidates.len() {
        candidates.select_nth_unstable_by(take - 1, by_rank);
        candidates.truncate(take);
    }
    candidates.sort_unstable_by(by_rank);
    candidates
}
