// src/ports/activity.rs

//! Append-only activity log.

use std::fmt;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{SeasonId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    SeasonCreated,
    SeasonDeleted,
    StatusChanged,
    SeasonAutoClosed,
    RemarksUpdated,
    TaskCompleted,
    CompletionAmended,
    AttachmentAdded,
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityAction::SeasonCreated => "season_created",
            ActivityAction::SeasonDeleted => "season_deleted",
            ActivityAction::StatusChanged => "status_changed",
            ActivityAction::SeasonAutoClosed => "season_auto_closed",
            ActivityAction::RemarksUpdated => "remarks_updated",
            ActivityAction::TaskCompleted => "task_completed",
            ActivityAction::CompletionAmended => "completion_amended",
            ActivityAction::AttachmentAdded => "attachment_added",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub season_id: SeasonId,
    pub task_id: Option<TaskId>,
    pub actor_id: String,
    pub action: ActivityAction,
    pub details: String,
    pub at: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        season_id: SeasonId,
        task_id: Option<TaskId>,
        actor_id: impl Into<String>,
        action: ActivityAction,
        details: impl Into<String>,
    ) -> Self {
        Self {
            season_id,
            task_id,
            actor_id: actor_id.into(),
            action,
            details: details.into(),
            at: Utc::now(),
        }
    }
}

/// Best-effort activity sink. Errors are logged by the caller and never
/// abort the operation that produced the entry.
pub trait ActivityLogger: Send + Sync {
    fn record(&self, entry: &ActivityEntry) -> Result<()>;
}

/// Emits each entry as a structured `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct TracingActivityLog;

impl ActivityLogger for TracingActivityLog {
    fn record(&self, entry: &ActivityEntry) -> Result<()> {
        info!(
            target: "seasonflow::activity",
            season = %entry.season_id,
            task = ?entry.task_id,
            actor = %entry.actor_id,
            action = %entry.action,
            details = %entry.details,
            "activity"
        );
        Ok(())
    }
}

/// Keeps entries in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryActivityLog {
    entries: Arc<Mutex<Vec<ActivityEntry>>>,
}

impl MemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn actions(&self) -> Vec<ActivityAction> {
        self.entries().iter().map(|e| e.action).collect()
    }
}

impl ActivityLogger for MemoryActivityLog {
    fn record(&self, entry: &ActivityEntry) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("activity log lock poisoned"))?
            .push(entry.clone());
        Ok(())
    }
}
