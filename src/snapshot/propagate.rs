// src/snapshot/propagate.rs

//! Date propagation: recompute planned start/end of every unresolved task
//! from the current completion facts.
//!
//! Each pass walks all non-completed entries:
//! - no predecessors: ready at the season creation timestamp
//! - all predecessors completed: ready at the latest of their completions
//! - otherwise: not schedulable yet, dates cleared
//!
//! Passes repeat until one changes no start date, bounded by
//! `entries + slack` passes. Hitting the bound is logged as an integrity
//! error and the dates are left as they are.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::errors::SeasonflowError;
use crate::snapshot::model::{ComputedDates, TaskEntry};

/// Extra passes allowed on top of the entry count.
pub const DEFAULT_PROPAGATION_SLACK: usize = 5;

/// What a propagation run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationReport {
    /// Number of passes executed (including the final quiet pass).
    pub passes: usize,
    /// `false` if the ceiling was reached while dates were still moving.
    pub converged: bool,
}

impl PropagationReport {
    /// The integrity error to surface when propagation did not settle.
    pub fn non_termination(&self) -> Option<SeasonflowError> {
        if self.converged {
            None
        } else {
            Some(SeasonflowError::PropagationNonTermination {
                passes: self.passes,
            })
        }
    }
}

/// Recompute computed dates with the default slack.
pub fn propagate_dates(
    entries: &mut [TaskEntry],
    season_created_at: DateTime<Utc>,
) -> PropagationReport {
    propagate_dates_with_slack(entries, season_created_at, DEFAULT_PROPAGATION_SLACK)
}

/// Recompute computed dates; at most `entries.len() + slack` passes.
pub fn propagate_dates_with_slack(
    entries: &mut [TaskEntry],
    season_created_at: DateTime<Utc>,
    slack: usize,
) -> PropagationReport {
    let ceiling = entries.len() + slack;
    let index: HashMap<String, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.order.to_string(), i))
        .collect();

    let mut passes = 0;
    while passes < ceiling {
        passes += 1;
        let mut changed = false;

        for i in 0..entries.len() {
            if entries[i].is_completed() {
                continue;
            }

            let next = ready_timestamp(&entries[i], entries, &index, season_created_at).and_then(|ready| {
                let dates = ComputedDates::from_ready(ready, entries[i].lead_time);
                if dates.is_none() {
                    warn!(
                        task = %entries[i].order,
                        lead_time = entries[i].lead_time,
                        "planned end out of range; task left unscheduled"
                    );
                }
                dates
            });

            let entry = &mut entries[i];
            if entry.computed_dates.map(|d| d.start) != next.map(|d| d.start) {
                debug!(
                    task = %entry.order,
                    from = ?entry.computed_dates.map(|d| d.start),
                    to = ?next.map(|d| d.start),
                    "computed start moved"
                );
                changed = true;
            }
            entry.computed_dates = next;
        }

        if !changed {
            debug!(passes, entries = entries.len(), "date propagation settled");
            return PropagationReport {
                passes,
                converged: true,
            };
        }
    }

    let report = PropagationReport {
        passes,
        converged: false,
    };
    if let Some(err) = report.non_termination() {
        error!(
            error = %err,
            ceiling,
            "date propagation hit its iteration ceiling; computed dates may be stale"
        );
    }
    report
}

/// When `entry` became (or becomes) ready, or `None` if it is not
/// schedulable yet.
fn ready_timestamp(
    entry: &TaskEntry,
    entries: &[TaskEntry],
    index: &HashMap<String, usize>,
    season_created_at: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if entry.preceding.is_empty() {
        return Some(season_created_at);
    }

    let mut latest: Option<DateTime<Utc>> = None;
    for pred in entry.preceding.iter() {
        let Some(&j) = index.get(pred.as_str()) else {
            warn!(
                task = %entry.order,
                preceding = %pred,
                "preceding task missing from snapshot"
            );
            return None;
        };

        let pred_entry = &entries[j];
        if !pred_entry.is_completed() {
            return None;
        }
        // Completed without a date: inactive at season creation. Satisfied,
        // but contributes nothing.
        if let Some(done) = pred_entry.actual_completion {
            latest = Some(latest.map_or(done, |l| l.max(done)));
        }
    }

    Some(latest.unwrap_or(season_created_at))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::TimeZone;

    use super::*;
    use crate::dag::order::OrderCode;
    use crate::types::TaskStatus;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn entry(order: &str, preceding: &[&str], lead_time: u32) -> TaskEntry {
        TaskEntry {
            id: uuid::Uuid::new_v4(),
            order: OrderCode::parse(order).unwrap(),
            name: format!("task {order}"),
            responsible: BTreeSet::from(["OPS".to_string()]),
            preceding: preceding.iter().map(|p| OrderCode::parse(p).unwrap()).collect(),
            lead_time,
            status: TaskStatus::Pending,
            actual_completion: None,
            computed_dates: None,
            remarks: String::new(),
            attachments: Vec::new(),
        }
    }

    fn complete(e: &mut TaskEntry, on: DateTime<Utc>) {
        e.status = TaskStatus::Completed;
        e.actual_completion = Some(on);
    }

    #[test]
    fn roots_start_at_season_creation() {
        let mut entries = vec![entry("A", &[], 2), entry("B", &["A"], 3)];
        let report = propagate_dates(&mut entries, day(1));

        assert!(report.converged);
        assert_eq!(
            entries[0].computed_dates,
            Some(ComputedDates { start: day(1), end: day(3) })
        );
        assert_eq!(entries[1].computed_dates, None);
    }

    #[test]
    fn dependents_start_at_latest_predecessor_completion() {
        let mut entries = vec![
            entry("A", &[], 1),
            entry("B", &[], 1),
            entry("C", &["A", "B"], 4),
        ];
        complete(&mut entries[0], day(3));
        complete(&mut entries[1], day(5));

        propagate_dates(&mut entries, day(1));

        assert_eq!(
            entries[2].computed_dates,
            Some(ComputedDates { start: day(5), end: day(9) })
        );
    }

    #[test]
    fn one_open_predecessor_clears_dates() {
        let mut entries = vec![entry("A", &[], 1), entry("B", &[], 1), entry("C", &["A", "B"], 1)];
        complete(&mut entries[0], day(2));
        entries[2].computed_dates = ComputedDates::from_ready(day(2), 1);

        propagate_dates(&mut entries, day(1));

        assert_eq!(entries[2].computed_dates, None);
    }

    #[test]
    fn completed_entries_keep_their_history() {
        let mut entries = vec![entry("A", &[], 2)];
        let historical = Some(ComputedDates { start: day(7), end: day(9) });
        complete(&mut entries[0], day(8));
        entries[0].computed_dates = historical;

        propagate_dates(&mut entries, day(1));

        assert_eq!(entries[0].computed_dates, historical);
        assert_eq!(entries[0].actual_completion, Some(day(8)));
    }

    #[test]
    fn inactive_predecessor_counts_as_satisfied() {
        let mut entries = vec![entry("A", &[], 1), entry("B", &["A"], 2)];
        entries[0].status = TaskStatus::Completed;

        propagate_dates(&mut entries, day(1));

        assert_eq!(
            entries[1].computed_dates,
            Some(ComputedDates { start: day(1), end: day(3) })
        );
    }

    #[test]
    fn rerun_on_settled_entries_is_a_no_op() {
        let mut entries = vec![entry("A", &[], 2), entry("B", &["A"], 3)];
        complete(&mut entries[0], day(2));
        propagate_dates(&mut entries, day(1));
        let settled = entries.clone();

        let report = propagate_dates(&mut entries, day(1));

        assert_eq!(entries, settled);
        assert_eq!(report.passes, 1);
        assert!(report.converged);
    }

    #[test]
    fn zero_ceiling_reports_non_termination() {
        let mut entries: Vec<TaskEntry> = Vec::new();
        let report = propagate_dates_with_slack(&mut entries, day(1), 0);

        assert!(!report.converged);
        assert!(matches!(
            report.non_termination(),
            Some(SeasonflowError::PropagationNonTermination { passes: 0 })
        ));
    }

    #[test]
    fn dangling_reference_leaves_entry_unscheduled() {
        let mut entries = vec![entry("B", &["A"], 1)];
        let report = propagate_dates(&mut entries, day(1));

        assert!(report.converged);
        assert_eq!(entries[0].computed_dates, None);
    }

    #[test]
    fn out_of_range_end_leaves_entry_unscheduled() {
        let mut entries = vec![entry("A", &[], u32::MAX), entry("B", &[], 2)];
        let report = propagate_dates(&mut entries, day(1));

        assert!(report.converged);
        assert_eq!(entries[0].computed_dates, None);
        assert_eq!(
            entries[1].computed_dates,
            Some(ComputedDates { start: day(1), end: day(3) })
        );
    }
}
