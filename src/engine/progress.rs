// src/engine/progress.rs

//! Pure core of the task completion transaction.
//!
//! Nothing here performs IO. Every precondition is checked before the first
//! field is touched, so an `Err` leaves season and snapshot exactly as they
//! were handed in.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::dag::TaskGraph;
use crate::engine::{EngineOptions, TaskUpdate};
use crate::errors::{Result, SeasonflowError};
use crate::ports::activity::{ActivityAction, ActivityEntry};
use crate::ports::notify::Notification;
use crate::season::{Season, StatusChange};
use crate::snapshot::model::{Snapshot, TaskEntry};
use crate::snapshot::propagate::{PropagationReport, propagate_dates_with_slack};
use crate::types::{Actor, SeasonStatus, TaskId, TaskStatus};

/// Side effect requested by the core, carried out by the IO shell after the
/// records are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Record(ActivityEntry),
    Notify(Notification),
}

/// A field change applied to the target entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    Remarks {
        from: String,
        to: String,
    },
    Completion {
        previous: Option<DateTime<Utc>>,
        completed_on: DateTime<Utc>,
    },
}

/// Everything a task update did.
#[derive(Debug, Clone, Default)]
pub struct UpdateOutcome {
    pub changes: Vec<TaskChange>,
    pub effects: Vec<Effect>,
    /// Present when the update moved completion facts.
    pub propagation: Option<PropagationReport>,
    /// Pending entries that became actionable through this update.
    pub newly_actionable: Vec<TaskId>,
    /// The season was auto-closed because every task is completed.
    pub season_closed: bool,
}

impl UpdateOutcome {
    /// `true` for the idempotent "no changes" result.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Result of a season status change.
#[derive(Debug, Clone)]
pub struct StatusOutcome {
    pub change: StatusChange,
    pub effects: Vec<Effect>,
}

struct CompletionPlan {
    completed_on: DateTime<Utc>,
    previous: Option<DateTime<Utc>>,
    was_completed: bool,
}

/// Apply `update` to the entry `task_id` and progress the season.
///
/// Order of work:
/// 1. locate the entry (`NotFound`)
/// 2. decide on a remarks change
/// 3. decide on a completion change (`Forbidden` / `Validation`)
/// 4. nothing to do: return a no-op outcome
/// 5. mutate, propagate dates, find newly actionable dependents, refresh
///    attention
/// 6. auto-close the season once every task is completed
pub fn update_task_and_progress(
    actor: &Actor,
    season: &mut Season,
    snapshot: &mut Snapshot,
    task_id: TaskId,
    update: &TaskUpdate,
    options: &EngineOptions,
) -> Result<UpdateOutcome> {
    let idx = snapshot
        .entries
        .iter()
        .position(|e| e.id == task_id)
        .ok_or_else(|| {
            SeasonflowError::NotFound(format!("task {} in season '{}'", task_id, season.name))
        })?;

    let entry = &snapshot.entries[idx];
    let new_remarks = update
        .remarks
        .as_ref()
        .filter(|r| **r != entry.remarks)
        .cloned();
    let completion = plan_completion(actor, entry, &snapshot.entries, update)?;

    if new_remarks.is_none() && completion.is_none() {
        debug!(task = %entry.order, "no changes");
        return Ok(UpdateOutcome::default());
    }

    let mut outcome = UpdateOutcome::default();
    let order = entry.order.to_string();

    if let Some(to) = new_remarks {
        let entry = &mut snapshot.entries[idx];
        let from = std::mem::replace(&mut entry.remarks, to.clone());
        outcome.effects.push(Effect::Record(ActivityEntry::new(
            season.id,
            Some(task_id),
            &actor.id,
            ActivityAction::RemarksUpdated,
            format!("{}: remarks set to '{}'", order, to),
        )));
        outcome.changes.push(TaskChange::Remarks { from, to });
    }

    if let Some(plan) = completion {
        apply_completion(actor, season, snapshot, idx, plan, options, &mut outcome);
    }

    if snapshot.all_completed() && season.status != SeasonStatus::Closed {
        let from = season.status;
        season.status = SeasonStatus::Closed;
        season.require_attention.clear();
        outcome.season_closed = true;
        outcome.effects.push(Effect::Record(ActivityEntry::new(
            season.id,
            None,
            &actor.id,
            ActivityAction::SeasonAutoClosed,
            format!("all tasks completed; status {} -> {} (automatic)", from, SeasonStatus::Closed),
        )));
        info!(season = %season.name, "all tasks completed; season closed automatically");
    }

    Ok(outcome)
}

/// Record the completion, propagate dates, notify newly actionable
/// dependents and refresh attention. Remarks alone never get here.
fn apply_completion(
    actor: &Actor,
    season: &mut Season,
    snapshot: &mut Snapshot,
    idx: usize,
    plan: CompletionPlan,
    options: &EngineOptions,
    outcome: &mut UpdateOutcome,
) {
    let (task_id, order) = {
        let entry = &mut snapshot.entries[idx];
        entry.actual_completion = Some(plan.completed_on);
        entry.status = TaskStatus::Completed;
        (entry.id, entry.order.to_string())
    };

    let action = if plan.was_completed {
        ActivityAction::CompletionAmended
    } else {
        ActivityAction::TaskCompleted
    };
    outcome.effects.push(Effect::Record(ActivityEntry::new(
        season.id,
        Some(task_id),
        &actor.id,
        action,
        format!("{}: completed on {}", order, plan.completed_on.date_naive()),
    )));
    outcome.changes.push(TaskChange::Completion {
        previous: plan.previous,
        completed_on: plan.completed_on,
    });
    info!(
        season = %season.name,
        task = %order,
        completed_on = %plan.completed_on.date_naive(),
        amended = plan.was_completed,
        "task completion recorded"
    );

    let report = propagate_dates_with_slack(
        &mut snapshot.entries,
        snapshot.season_created_at,
        options.propagation_slack,
    );
    outcome.propagation = Some(report);

    if !plan.was_completed {
        for dependent in newly_actionable(&snapshot.entries, &order) {
            outcome.newly_actionable.push(dependent.id);
            outcome
                .effects
                .push(Effect::Notify(actionable_notice(season, dependent)));
        }
    }

    season.refresh_attention(&snapshot.entries);
}

/// Decide whether `update` changes the completion of `entry`, enforcing
/// privilege and topological order. Does not mutate.
fn plan_completion(
    actor: &Actor,
    entry: &TaskEntry,
    entries: &[TaskEntry],
    update: &TaskUpdate,
) -> Result<Option<CompletionPlan>> {
    let Some(completed_on) = update.actual_completion else {
        return Ok(None);
    };
    let previous = entry.actual_completion;
    if previous.map(|d| d.date_naive()) == Some(completed_on.date_naive()) {
        return Ok(None);
    }

    let was_completed = entry.is_completed();
    if was_completed && !actor.role.is_elevated() {
        warn!(task = %entry.order, actor = %actor.id, "non-elevated amend of completed task refused");
        return Err(SeasonflowError::Forbidden(format!(
            "task '{}' is already completed; only a manager or admin may amend it",
            entry.order
        )));
    }

    let open = TaskGraph::new(entries).open_predecessors(entry);
    if !open.is_empty() {
        return Err(SeasonflowError::Validation(format!(
            "task '{}' cannot be completed before its preceding task(s) {:?}",
            entry.order, open
        )));
    }

    Ok(Some(CompletionPlan {
        completed_on,
        previous,
        was_completed,
    }))
}

/// Pending dependents of `order` whose predecessors are now all completed.
fn newly_actionable<'a>(entries: &'a [TaskEntry], order: &str) -> Vec<&'a TaskEntry> {
    TaskGraph::new(entries).unblocked_by(order)
}

fn actionable_notice(season: &Season, entry: &TaskEntry) -> Notification {
    let due = entry
        .computed_dates
        .map(|d| d.end.date_naive().to_string())
        .unwrap_or_else(|| "-".to_string());
    Notification {
        season_id: season.id,
        task_id: Some(entry.id),
        recipients: entry.responsible.iter().cloned().collect(),
        subject: format!("[{}] {} {} is ready to start", season.name, entry.order, entry.name),
        body: format!(
            "All preceding tasks of {} ({}) in season {} for {} are completed.\nPlanned due date: {}.",
            entry.order, entry.name, season.name, season.buyer, due
        ),
    }
}

/// Apply a season status change requested by `actor`.
pub fn change_status(
    actor: &Actor,
    season: &mut Season,
    snapshot: &Snapshot,
    to: SeasonStatus,
) -> StatusOutcome {
    let change = season.change_status(to, &snapshot.entries);
    let mut effects = Vec::new();

    match change {
        StatusChange::Unchanged => {
            debug!(season = %season.name, "season already open; no change");
        }
        StatusChange::Changed { from, to } => {
            info!(season = %season.name, %from, %to, "season status changed");
            effects.push(Effect::Record(ActivityEntry::new(
                season.id,
                None,
                &actor.id,
                ActivityAction::StatusChanged,
                format!("status {} -> {}", from, to),
            )));
        }
    }

    StatusOutcome { change, effects }
}
