// src/dag/graph.rs

//! Readiness view over the entries of one snapshot.

use std::collections::HashMap;

use crate::snapshot::model::TaskEntry;

/// Order-code index plus reverse edges, borrowed from a snapshot's entries.
///
/// Built once per question ("who is actionable", "who did this completion
/// unblock") instead of rescanning `preceding` lists per entry. A
/// `preceding` code with no entry counts as an open predecessor.
#[derive(Debug, Clone)]
pub struct TaskGraph<'a> {
    entries: &'a [TaskEntry],
    by_order: HashMap<&'a str, usize>,
    dependents: HashMap<&'a str, Vec<usize>>,
}

impl<'a> TaskGraph<'a> {
    pub fn new(entries: &'a [TaskEntry]) -> Self {
        let by_order = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.order.as_str(), i))
            .collect();

        let mut dependents: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            for pred in entry.preceding.iter() {
                dependents.entry(pred.as_str()).or_default().push(i);
            }
        }

        Self {
            entries,
            by_order,
            dependents,
        }
    }

    pub fn get(&self, order: &str) -> Option<&'a TaskEntry> {
        self.by_order.get(order).map(|&i| &self.entries[i])
    }

    /// Predecessors of `entry` that are missing or not completed yet.
    pub fn open_predecessors<'e>(&self, entry: &'e TaskEntry) -> Vec<&'e str> {
        entry
            .preceding
            .iter()
            .filter(|p| !self.get(p.as_str()).is_some_and(TaskEntry::is_completed))
            .map(|p| p.as_str())
            .collect()
    }

    /// Every predecessor exists and is completed.
    pub fn is_ready(&self, entry: &TaskEntry) -> bool {
        self.open_predecessors(entry).is_empty()
    }

    /// Pending entries whose predecessors are all completed.
    pub fn actionable(&self) -> impl Iterator<Item = &'a TaskEntry> + '_ {
        self.entries
            .iter()
            .filter(|e| e.is_pending() && self.is_ready(e))
    }

    /// Entries listing `order` as a predecessor, in snapshot order.
    pub fn dependents_of(&self, order: &str) -> impl Iterator<Item = &'a TaskEntry> + '_ {
        self.dependents
            .get(order)
            .into_iter()
            .flatten()
            .map(|&i| &self.entries[i])
    }

    /// Pending dependents of `order` that are now actionable, i.e. whose
    /// other predecessors were already completed.
    pub fn unblocked_by(&self, order: &str) -> Vec<&'a TaskEntry> {
        self.dependents_of(order)
            .filter(|e| e.is_pending() && self.is_ready(e))
            .collect()
    }
}
