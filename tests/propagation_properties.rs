// tests/propagation_properties.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;

use seasonflow::dag::validate::{PrecedenceMap, validate_template_graph};
use seasonflow::dag::TaskTemplate;
use seasonflow::errors::SeasonflowError;
use seasonflow::snapshot::model::{TaskEntry, index_by_order};
use seasonflow::snapshot::{materialize_snapshot, propagate_dates};
use seasonflow::types::TaskStatus;
use seasonflow_test_utils::builders::TemplateBuilder;
use seasonflow_test_utils::day;

fn code(i: usize) -> String {
    ((b'A' + i as u8) as char).to_string()
}

// Task i may only precede on tasks 0..i, which keeps every generated library
// ordered (and therefore acyclic).
fn library_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<TaskTemplate>> {
    (1..=max_tasks).prop_flat_map(|n| {
        (
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), n),
            proptest::collection::vec(0u32..10, n),
        )
            .prop_map(move |(raw_deps, leads)| {
                (0..n)
                    .map(|i| {
                        let deps: BTreeSet<usize> = if i == 0 {
                            BTreeSet::new()
                        } else {
                            raw_deps[i].iter().map(|d| d % i).collect()
                        };
                        let mut t = TemplateBuilder::new(&code(i), &format!("task {i}"))
                            .responsible(&format!("D{}", i % 3))
                            .lead_time(leads[i]);
                        for d in deps {
                            t = t.after(&code(d));
                        }
                        t.build()
                    })
                    .collect()
            })
    })
}

fn complete_prefix(entries: &mut [TaskEntry], k: usize, offsets: &[i64], created: DateTime<Utc>) {
    for (i, entry) in entries.iter_mut().take(k).enumerate() {
        entry.status = TaskStatus::Completed;
        entry.actual_completion = Some(created + Duration::days(offsets[i % offsets.len()]));
    }
}

proptest! {
    #[test]
    fn propagation_settles_within_ceiling(
        templates in library_strategy(12),
        k in 0usize..12,
        offsets in proptest::collection::vec(0i64..30, 1..12),
    ) {
        let created = day(2024, 1, 1);
        let mut entries = materialize_snapshot(&templates, created).entries;
        complete_prefix(&mut entries, k, &offsets, created);

        let report = propagate_dates(&mut entries, created);
        prop_assert!(report.converged);
        prop_assert!(report.passes <= entries.len() + 5);
        prop_assert!(report.non_termination().is_none());
    }

    #[test]
    fn propagation_is_idempotent(
        templates in library_strategy(12),
        k in 0usize..12,
        offsets in proptest::collection::vec(0i64..30, 1..12),
    ) {
        let created = day(2024, 1, 1);
        let mut entries = materialize_snapshot(&templates, created).entries;
        complete_prefix(&mut entries, k, &offsets, created);
        propagate_dates(&mut entries, created);

        let settled = entries.clone();
        let report = propagate_dates(&mut entries, created);
        prop_assert_eq!(report.passes, 1);
        prop_assert_eq!(entries, settled);
    }

    #[test]
    fn ready_entries_start_at_latest_predecessor_completion(
        templates in library_strategy(12),
        k in 0usize..12,
        offsets in proptest::collection::vec(0i64..30, 1..12),
    ) {
        let created = day(2024, 1, 1);
        let mut entries = materialize_snapshot(&templates, created).entries;
        complete_prefix(&mut entries, k, &offsets, created);
        propagate_dates(&mut entries, created);

        let index = index_by_order(&entries);
        for e in entries.iter().filter(|e| !e.is_completed()) {
            let preds: Vec<&TaskEntry> = e
                .preceding
                .iter()
                .map(|p| &entries[index[p.as_str()]])
                .collect();

            if preds.iter().all(|p| p.is_completed()) {
                let expected = preds
                    .iter()
                    .filter_map(|p| p.actual_completion)
                    .max()
                    .unwrap_or(created);
                let dates = e.computed_dates.expect("ready entry has dates");
                prop_assert_eq!(dates.start, expected);
                prop_assert_eq!(dates.end, expected + Duration::days(i64::from(e.lead_time)));
            } else {
                prop_assert!(e.computed_dates.is_none());
            }
        }
    }

    #[test]
    fn later_codes_can_never_precede(i in 0usize..20, gap in 1usize..6) {
        let (owner, later) = (code(i), code(i + gap));
        let existing: PrecedenceMap = [(later.clone(), Vec::new())].into_iter().collect();

        let result = validate_template_graph(&owner, &[later.clone()], &existing);
        let is_ordering_violation = matches!(
            result,
            Err(SeasonflowError::OrderingViolation { ref offending, .. }) if offending.len() == 1 && offending[0] == later
        );
        prop_assert!(is_ordering_violation);
    }
}
