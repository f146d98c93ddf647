// src/snapshot/attention.rs

//! Which departments currently have actionable work.

use std::collections::BTreeSet;

use crate::dag::graph::TaskGraph;
use crate::snapshot::model::TaskEntry;

/// Pending entries whose predecessors are all completed.
pub fn actionable_entries(entries: &[TaskEntry]) -> Vec<&TaskEntry> {
    TaskGraph::new(entries).actionable().collect()
}

/// Departments responsible for at least one actionable entry.
///
/// Always a fresh set; callers replace, never merge, the stored value.
pub fn compute_attention(entries: &[TaskEntry]) -> BTreeSet<String> {
    actionable_entries(entries)
        .into_iter()
        .flat_map(|e| e.responsible.iter().cloned())
        .collect()
}
