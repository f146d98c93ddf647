// src/engine/mod.rs

//! Season lifecycle engine.
//!
//! The pure core lives in [`progress`]: it mutates in-memory season and
//! snapshot values and returns the side effects (activity entries,
//! notifications) the caller must carry out. The IO shell in [`service`]
//! loads records from a [`Store`](crate::ports::Store), runs the core,
//! persists with version checks and then performs the effects best-effort.

use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::{Result, SeasonflowError};
use crate::snapshot::propagate::DEFAULT_PROPAGATION_SLACK;

pub mod progress;
pub mod service;

pub use progress::{Effect, StatusOutcome, TaskChange, UpdateOutcome, change_status, update_task_and_progress};
pub use service::SeasonService;

/// Options shared by the core and the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Propagation runs at most `entries + propagation_slack` passes.
    pub propagation_slack: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            propagation_slack: DEFAULT_PROPAGATION_SLACK,
        }
    }
}

/// Requested change to one task entry. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub actual_completion: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

impl TaskUpdate {
    pub fn completed_on(at: DateTime<Utc>) -> Self {
        Self {
            actual_completion: Some(at),
            remarks: None,
        }
    }

    pub fn remarks(text: impl Into<String>) -> Self {
        Self {
            actual_completion: None,
            remarks: Some(text.into()),
        }
    }
}

/// Parse a completion date given as `YYYY-MM-DD` (midnight UTC) or RFC 3339.
pub fn parse_completion_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            SeasonflowError::Validation(format!(
                "malformed completion date '{raw}' (expected YYYY-MM-DD or RFC 3339)"
            ))
        })
}
