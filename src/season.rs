// src/season.rs

//! Season record and its status state machine.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::snapshot::attention::compute_attention;
use crate::snapshot::model::TaskEntry;
use crate::types::{SeasonId, SeasonStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub name: String,
    pub buyer: String,
    pub status: SeasonStatus,
    /// Departments with actionable work. Always empty unless `Open`.
    #[serde(default)]
    pub require_attention: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    /// Optimistic concurrency counter, bumped by the store on every save.
    #[serde(default)]
    pub version: u64,
}

/// Result of a status change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Open -> Open: nothing to do.
    Unchanged,
    Changed { from: SeasonStatus, to: SeasonStatus },
}

impl Season {
    pub fn new(
        name: impl Into<String>,
        buyer: impl Into<String>,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            name: name.into(),
            buyer: buyer.into(),
            status: SeasonStatus::Open,
            require_attention: BTreeSet::new(),
            created_at,
            created_by: created_by.into(),
            version: 0,
        }
    }

    /// Replace `require_attention` from snapshot state.
    ///
    /// Seasons that are not `Open` are never actionable, so the set is
    /// cleared regardless of task readiness.
    pub fn refresh_attention(&mut self, entries: &[TaskEntry]) {
        self.require_attention = if self.status.is_open() {
            compute_attention(entries)
        } else {
            BTreeSet::new()
        };
        debug!(
            season = %self.name,
            status = %self.status,
            attention = ?self.require_attention,
            "refreshed require_attention"
        );
    }

    /// Apply a status transition.
    ///
    /// Leaving `Open` clears attention; entering `Open` re-derives it from
    /// the snapshot rather than restoring an older value.
    pub fn change_status(&mut self, to: SeasonStatus, entries: &[TaskEntry]) -> StatusChange {
        let from = self.status;
        if from == SeasonStatus::Open && to == SeasonStatus::Open {
            return StatusChange::Unchanged;
        }

        self.status = to;
        self.refresh_attention(entries);
        StatusChange::Changed { from, to }
    }
}
