//! Eviction Policy
//!
//! Picks the least recently used entries of a store for removal.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Select For Eviction ==
/// Returns up to `count` keys, oldest `last_used` first.
///
/// Entries without a timestamp count as `0`. Equal timestamps are ordered by
/// key so the selection does not depend on map iteration order.
pub fn select_for_eviction<E: CacheEntry>(
    entries: &HashMap<String, E>,
    count: usize,
) -> Vec<String> {
    let mut candidates: Vec<(&String, u64)> = entries
        .iter()
        .map(|(key, entry)| (key, entry.last_used()))
        .collect();

    candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    candidates
        .into_iter()
        .take(count)
        .map(|(key, _)| key.clone())
        .collect()
}
