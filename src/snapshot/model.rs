// src/snapshot/model.rs

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::dag::order::OrderCode;
use crate::types::{SeasonId, SnapshotId, TaskId, TaskStatus};

/// Planned start/end of a task. Both are set or the whole value is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedDates {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ComputedDates {
    /// `end = start + lead_time` calendar days, or `None` when the end
    /// falls outside the representable date range.
    pub fn from_ready(ready: DateTime<Utc>, lead_time_days: u32) -> Option<Self> {
        let lead = TimeDelta::try_days(i64::from(lead_time_days))?;
        Some(Self {
            start: ready,
            end: ready.checked_add_signed(lead)?,
        })
    }
}

/// Metadata of a file attached to a task entry.
///
/// The blob lives in an attachment store; the snapshot only carries this
/// record and never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    /// blake3 hex digest of the content; doubles as the blob key.
    pub content_hash: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: String,
}

/// One task of a season, frozen from its template at season creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: TaskId,
    pub order: OrderCode,
    pub name: String,
    #[serde(default)]
    pub responsible: BTreeSet<String>,
    /// Order codes of entries in the *same snapshot*.
    #[serde(default)]
    pub preceding: BTreeSet<OrderCode>,
    pub lead_time: u32,
    pub status: TaskStatus,
    #[serde(default)]
    pub actual_completion: Option<DateTime<Utc>>,
    #[serde(default)]
    pub computed_dates: Option<ComputedDates>,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl TaskEntry {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

/// Per-season, independently mutable copy of the template graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub season_id: SeasonId,
    /// Season creation timestamp; the "ready" time of root tasks.
    pub season_created_at: DateTime<Utc>,
    pub entries: Vec<TaskEntry>,
    /// Optimistic concurrency counter, bumped by the store on every save.
    #[serde(default)]
    pub version: u64,
}

impl Snapshot {
    pub fn new(season_id: SeasonId, season_created_at: DateTime<Utc>, entries: Vec<TaskEntry>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            season_id,
            season_created_at,
            entries,
            version: 0,
        }
    }

    pub fn entry(&self, id: TaskId) -> Option<&TaskEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entry_mut(&mut self, id: TaskId) -> Option<&mut TaskEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn entry_by_order(&self, order: &str) -> Option<&TaskEntry> {
        self.entries.iter().find(|e| e.order.as_str() == order)
    }

    pub fn contains_order(&self, order: &str) -> bool {
        self.entry_by_order(order).is_some()
    }

    /// `true` once every entry is completed (vacuously true when empty).
    pub fn all_completed(&self) -> bool {
        self.entries.iter().all(TaskEntry::is_completed)
    }
}

/// Index of entries by order code.
pub fn index_by_order(entries: &[TaskEntry]) -> HashMap<&str, usize> {
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.order.as_str(), i))
        .collect()
}
