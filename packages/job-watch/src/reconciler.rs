//! Change detection between a freshly fetched snapshot and stored state.
//!
//! Both operations are pure: no I/O, inputs are borrowed immutably, and the
//! result depends only on the arguments.

use std::collections::HashSet;

use crate::record::{Delta, Record, Snapshot};

/// Records of `current` whose id does not appear anywhere in `stored`.
///
/// Keeps the order of `current`. Duplicate ids inside `current` are passed
/// through as-is; only the stored snapshot is used for filtering.
pub fn diff(current: &Snapshot, stored: &Snapshot) -> Delta {
    let known: HashSet<&str> = stored.ids().collect();

    current
        .iter()
        .filter(|record| !known.contains(record.id.as_str()))
        .cloned()
        .collect()
}

/// Union of `stored` and `delta`, compared by the full record.
///
/// Stored records keep their order and come first; delta records that are
/// not already present are appended in delta order.
pub fn merge(stored: &Snapshot, delta: &Delta) -> Snapshot {
    let mut seen: HashSet<&Record> = stored.iter().collect();
    let mut merged: Vec<Record> = Vec::with_capacity(stored.len() + delta.len());
    merged.extend(stored.iter().cloned());

    for record in delta {
        if seen.insert(record) {
            merged.push(record.clone());
        }
    }

    merged.into()
}
