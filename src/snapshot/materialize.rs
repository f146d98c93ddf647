// src/snapshot/materialize.rs

//! Season creation: freeze the template library into task entries.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::dag::template::TaskTemplate;
use crate::snapshot::attention::compute_attention;
use crate::snapshot::model::TaskEntry;
use crate::snapshot::propagate::{DEFAULT_PROPAGATION_SLACK, PropagationReport, propagate_dates_with_slack};
use crate::types::TaskStatus;

/// Result of materializing a template library for a new season.
#[derive(Debug, Clone)]
pub struct MaterializedSnapshot {
    /// Entries sorted by order code, with initial dates already propagated.
    pub entries: Vec<TaskEntry>,
    /// Seed value for the season's `require_attention`.
    pub require_attention: BTreeSet<String>,
    pub propagation: PropagationReport,
}

/// Materialize with the default propagation slack.
pub fn materialize_snapshot(
    templates: &[TaskTemplate],
    season_created_at: DateTime<Utc>,
) -> MaterializedSnapshot {
    materialize_snapshot_with_slack(templates, season_created_at, DEFAULT_PROPAGATION_SLACK)
}

/// Copy every template (active or not) into a fresh entry list, then seed
/// computed dates and attention.
///
/// Inactive templates become entries that are already completed and carry
/// no dates; they stay out of the live graph.
pub fn materialize_snapshot_with_slack(
    templates: &[TaskTemplate],
    season_created_at: DateTime<Utc>,
    slack: usize,
) -> MaterializedSnapshot {
    let mut sorted: Vec<&TaskTemplate> = templates.iter().collect();
    sorted.sort_by(|a, b| a.order.cmp(&b.order));

    let mut entries: Vec<TaskEntry> = sorted
        .into_iter()
        .map(|t| TaskEntry {
            id: uuid::Uuid::new_v4(),
            order: t.order.clone(),
            name: t.name.clone(),
            responsible: t.responsible.clone(),
            preceding: t.preceding.clone(),
            lead_time: t.effective_lead_time(),
            status: if t.active {
                TaskStatus::Pending
            } else {
                TaskStatus::Completed
            },
            actual_completion: None,
            computed_dates: None,
            remarks: String::new(),
            attachments: Vec::new(),
        })
        .collect();

    let propagation = propagate_dates_with_slack(&mut entries, season_created_at, slack);
    let require_attention = compute_attention(&entries);

    info!(
        entries = entries.len(),
        inactive = entries.iter().filter(|e| e.is_completed()).count(),
        attention = ?require_attention,
        "materialized season snapshot"
    );

    MaterializedSnapshot {
        entries,
        require_attention,
        propagation,
    }
}
