// src/pipeline/select.rs

//! Picking and chunking the entries that still need to be delivered.

use std::collections::HashMap;

use crate::models::{FeedEntry, SeenState};

/// Entries of `genre` not yet in `seen`, newest first, at most `max`.
///
/// When the same link shows up more than once in `entries`, the occurrence
/// with the latest `published` is kept; on equal dates the first one wins.
/// Entries with equal dates keep their input order.
pub fn select_fresh(
    entries: Vec<FeedEntry>,
    seen: &SeenState,
    genre: &str,
    max: usize,
) -> Vec<FeedEntry> {
    let delivered = seen.link_set(genre);

    let mut fresh: Vec<FeedEntry> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        if delivered.contains(entry.link.as_str()) {
            continue;
        }
        match position.get(&entry.link) {
            Some(&i) => {
                if entry.published > fresh[i].published {
                    fresh[i] = entry;
                }
            }
            None => {
                position.insert(entry.link.clone(), fresh.len());
                fresh.push(entry);
            }
        }
    }

    // `sort_by` is stable, so ties keep their input order.
    fresh.sort_by(|a, b| b.published.cmp(&a.published));
    fresh.truncate(max);
    fresh
}

/// Split `entries` into consecutive groups of at most `size`.
pub fn chunk(entries: &[FeedEntry], size: usize) -> Vec<&[FeedEntry]> {
    entries.chunks(size.max(1)).collect()
}
