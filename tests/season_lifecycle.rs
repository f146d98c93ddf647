// tests/season_lifecycle.rs

mod common;

use std::collections::BTreeSet;

use common::{harness, recording, two_step_library};
use seasonflow::engine::{Effect, TaskUpdate};
use seasonflow::ports::{ActivityAction, Delivery, LogNotifier, Notifier, Store};
use seasonflow::types::{SeasonStatus, TaskStatus};
use seasonflow_test_utils::builders::{LibraryBuilder, TemplateBuilder};
use seasonflow_test_utils::{day, manager, member};

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn completing_tasks_moves_dates_attention_and_closes_the_season() {
    let (notifier, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let actor = member("alice");

    let season = h
        .service
        .create_season_at(&actor, "FW25", "Acme", day(2024, 1, 1))
        .unwrap();
    assert_eq!(season.require_attention, set(&["PUR"]));

    let (_, snapshot) = h.service.load(season.id).unwrap();
    let a = snapshot.entry_by_order("A").unwrap().clone();
    let b = snapshot.entry_by_order("B").unwrap().clone();
    assert_eq!(a.computed_dates.unwrap().start, day(2024, 1, 1));
    assert_eq!(a.computed_dates.unwrap().end, day(2024, 1, 3));
    assert!(b.computed_dates.is_none());

    let outcome = h
        .service
        .update_task(&actor, season.id, a.id, &TaskUpdate::completed_on(day(2024, 1, 2)))
        .unwrap();
    assert_eq!(outcome.newly_actionable, vec![b.id]);
    assert!(!outcome.season_closed);

    let (season_now, snapshot) = h.service.load(season.id).unwrap();
    let b_now = snapshot.entry_by_order("B").unwrap();
    assert_eq!(b_now.computed_dates.unwrap().start, day(2024, 1, 2));
    assert_eq!(b_now.computed_dates.unwrap().end, day(2024, 1, 5));
    assert!(season_now.require_attention.contains("DEV"));
    assert!(!season_now.require_attention.contains("PUR"));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipients, vec!["DEV".to_string()]);
    assert!(sent[0].subject.contains("B Sampling"));

    let outcome = h
        .service
        .update_task(&actor, season.id, b.id, &TaskUpdate::completed_on(day(2024, 1, 5)))
        .unwrap();
    assert!(outcome.season_closed);

    let (closed, snapshot) = h.service.load(season.id).unwrap();
    assert_eq!(closed.status, SeasonStatus::Closed);
    assert!(closed.require_attention.is_empty());
    assert!(snapshot.entries.iter().all(|e| e.status == TaskStatus::Completed));

    assert_eq!(
        h.activity.actions(),
        vec![
            ActivityAction::SeasonCreated,
            ActivityAction::TaskCompleted,
            ActivityAction::TaskCompleted,
            ActivityAction::SeasonAutoClosed,
        ]
    );
}

#[test]
fn completing_before_predecessors_is_rejected_and_nothing_is_written() {
    let (notifier, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let actor = member("alice");
    let season = h
        .service
        .create_season_at(&actor, "FW25", "Acme", day(2024, 1, 1))
        .unwrap();
    let (_, before) = h.service.load(season.id).unwrap();
    let b = before.entry_by_order("B").unwrap().id;

    let err = h
        .service
        .update_task(&actor, season.id, b, &TaskUpdate::completed_on(day(2024, 1, 2)))
        .unwrap_err();
    assert!(err.is_validation(), "unexpected error: {err:?}");
    assert!(err.to_string().contains('A'));

    let (_, after) = h.service.load(season.id).unwrap();
    assert_eq!(before, after);
    assert!(notifier.sent().is_empty());
}

#[test]
fn amending_a_completed_task_needs_an_elevated_role() {
    let (notifier, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let season = h
        .service
        .create_season_at(&member("alice"), "FW25", "Acme", day(2024, 1, 1))
        .unwrap();
    let (_, snapshot) = h.service.load(season.id).unwrap();
    let a = snapshot.entry_by_order("A").unwrap().id;

    h.service
        .update_task(&member("alice"), season.id, a, &TaskUpdate::completed_on(day(2024, 1, 2)))
        .unwrap();

    let err = h
        .service
        .update_task(&member("bob"), season.id, a, &TaskUpdate::completed_on(day(2024, 1, 4)))
        .unwrap_err();
    assert!(matches!(err, seasonflow::errors::SeasonflowError::Forbidden(_)));

    let outcome = h
        .service
        .update_task(&manager("carol"), season.id, a, &TaskUpdate::completed_on(day(2024, 1, 4)))
        .unwrap();
    assert!(!outcome.is_noop());
    assert!(outcome.newly_actionable.is_empty());

    let (_, snapshot) = h.service.load(season.id).unwrap();
    let b = snapshot.entry_by_order("B").unwrap();
    assert_eq!(b.computed_dates.unwrap().start, day(2024, 1, 4));
    assert_eq!(b.computed_dates.unwrap().end, day(2024, 1, 7));

    // Only the first completion announced B.
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(
        h.activity.actions().last(),
        Some(&ActivityAction::CompletionAmended)
    );
}

#[test]
fn same_date_and_same_remarks_is_a_noop() {
    let (_, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let actor = member("alice");
    let season = h
        .service
        .create_season_at(&actor, "FW25", "Acme", day(2024, 1, 1))
        .unwrap();
    let (_, snapshot) = h.service.load(season.id).unwrap();
    let a = snapshot.entry_by_order("A").unwrap().id;

    h.service
        .update_task(&actor, season.id, a, &TaskUpdate::completed_on(day(2024, 1, 2)))
        .unwrap();
    let version = h.service.load(season.id).unwrap().1.version;

    let outcome = h
        .service
        .update_task(&actor, season.id, a, &TaskUpdate::completed_on(day(2024, 1, 2)))
        .unwrap();
    assert!(outcome.is_noop());
    assert_eq!(h.service.load(season.id).unwrap().1.version, version);
}

#[test]
fn remarks_change_is_recorded_without_moving_dates() {
    let (notifier, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let actor = member("alice");
    let season = h
        .service
        .create_season_at(&actor, "FW25", "Acme", day(2024, 1, 1))
        .unwrap();
    let (_, before) = h.service.load(season.id).unwrap();
    let a = before.entry_by_order("A").unwrap();

    let outcome = h
        .service
        .update_task(&actor, season.id, a.id, &TaskUpdate::remarks("waiting on mill"))
        .unwrap();
    assert!(outcome.propagation.is_none());

    let (season_now, after) = h.service.load(season.id).unwrap();
    let a_now = after.entry_by_order("A").unwrap();
    assert_eq!(a_now.remarks, "waiting on mill");
    assert_eq!(a_now.computed_dates, a.computed_dates);
    assert_eq!(a_now.status, TaskStatus::Pending);
    assert_eq!(season_now.require_attention, set(&["PUR"]));
    assert!(notifier.sent().is_empty());
    assert_eq!(h.activity.actions().last(), Some(&ActivityAction::RemarksUpdated));
}

#[test]
fn failing_notifier_does_not_fail_the_update() {
    let notifier = seasonflow_test_utils::notifiers::FailingNotifier::new();
    let mut h = common::harness(two_step_library().into_store(), Box::new(notifier.clone()));
    let actor = member("alice");
    let season = h
        .service
        .create_season_at(&actor, "FW25", "Acme", day(2024, 1, 1))
        .unwrap();
    let (_, snapshot) = h.service.load(season.id).unwrap();
    let a = snapshot.entry_by_order("A").unwrap().id;

    let outcome = h
        .service
        .update_task(&actor, season.id, a, &TaskUpdate::completed_on(day(2024, 1, 2)))
        .unwrap();

    assert_eq!(notifier.attempts(), 1);
    assert_eq!(outcome.newly_actionable.len(), 1);
    let (_, snapshot) = h.service.load(season.id).unwrap();
    assert!(snapshot.entry_by_order("A").unwrap().is_completed());
}

#[test]
fn unknown_season_and_task_are_not_found() {
    let (_, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let actor = member("alice");

    let err = h
        .service
        .update_task(&actor, uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), &TaskUpdate::remarks("x"))
        .unwrap_err();
    assert!(matches!(err, seasonflow::errors::SeasonflowError::NotFound(_)));

    let season = h
        .service
        .create_season_at(&actor, "FW25", "Acme", day(2024, 1, 1))
        .unwrap();
    let err = h
        .service
        .update_task(&actor, season.id, uuid::Uuid::new_v4(), &TaskUpdate::remarks("x"))
        .unwrap_err();
    assert!(matches!(err, seasonflow::errors::SeasonflowError::NotFound(_)));
}

#[test]
fn duplicate_season_name_is_rejected() {
    let (_, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let actor = member("alice");
    h.service.create_season(&actor, "FW25", "Acme").unwrap();

    let err = h.service.create_season(&actor, " FW25 ", "Globex").unwrap_err();
    assert!(err.is_validation());
    assert_eq!(h.service.store().list_seasons().unwrap().len(), 1);
}

#[test]
fn hold_clears_attention_and_reopen_rederives_it() {
    let (_, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let actor = member("alice");
    let season = h
        .service
        .create_season_at(&actor, "FW25", "Acme", day(2024, 1, 1))
        .unwrap();

    h.service
        .change_season_status(&actor, season.id, SeasonStatus::OnHold)
        .unwrap();
    let (held, _) = h.service.load(season.id).unwrap();
    assert_eq!(held.status, SeasonStatus::OnHold);
    assert!(held.require_attention.is_empty());

    h.service
        .change_season_status(&actor, season.id, SeasonStatus::Open)
        .unwrap();
    let (open, _) = h.service.load(season.id).unwrap();
    assert_eq!(open.require_attention, set(&["PUR"]));

    let outcome = h
        .service
        .change_season_status(&actor, season.id, SeasonStatus::Open)
        .unwrap();
    assert!(outcome.effects.is_empty());
}

#[test]
fn inactive_templates_are_satisfied_predecessors() {
    let store = LibraryBuilder::new()
        .with(TemplateBuilder::new("A", "Legacy check").responsible("QA").inactive())
        .with(TemplateBuilder::new("B", "Sampling").responsible("DEV").after("A").lead_time(3))
        .into_store();
    let (_, boxed) = recording();
    let mut h = harness(store, boxed);

    let season = h
        .service
        .create_season_at(&member("alice"), "SS26", "Acme", day(2024, 3, 1))
        .unwrap();
    let (_, snapshot) = h.service.load(season.id).unwrap();

    let a = snapshot.entry_by_order("A").unwrap();
    assert!(a.is_completed());
    assert!(a.actual_completion.is_none());
    let b = snapshot.entry_by_order("B").unwrap();
    assert_eq!(b.computed_dates.unwrap().start, day(2024, 3, 1));
    assert_eq!(season.require_attention, set(&["DEV"]));
}

#[test]
fn template_edits_need_an_elevated_role_and_stay_acyclic() {
    let (_, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);

    let c = TemplateBuilder::new("C", "Costing").responsible("FIN").after("B").build();
    let err = h.service.sync_template(&member("alice"), &c).unwrap_err();
    assert!(matches!(err, seasonflow::errors::SeasonflowError::Forbidden(_)));

    h.service.sync_template(&manager("carol"), &c).unwrap();
    assert!(h.service.store().load_template("C").unwrap().is_some());

    let bad = TemplateBuilder::new("B", "Sampling").after("C").build();
    let err = h.service.sync_template(&manager("carol"), &bad).unwrap_err();
    assert!(matches!(
        err,
        seasonflow::errors::SeasonflowError::OrderingViolation { .. }
    ));
}

#[test]
fn templates_in_use_cannot_be_deleted() {
    let (_, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let admin = manager("carol");

    let err = h.service.delete_template(&admin, "A").unwrap_err();
    assert!(err.is_validation());

    h.service.create_season(&admin, "FW25", "Acme").unwrap();
    let err = h.service.delete_template(&admin, "B").unwrap_err();
    assert!(err.to_string().contains("snapshot"));

    let d = TemplateBuilder::new("D", "Spare").build();
    h.service.sync_template(&admin, &d).unwrap();
    h.service.delete_template(&admin, "D").unwrap();
    assert!(h.service.store().load_template("D").unwrap().is_none());
}

#[test]
fn seasons_with_tasks_cannot_be_deleted() {
    let (_, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let admin = manager("carol");
    let season = h.service.create_season(&admin, "FW25", "Acme").unwrap();

    let err = h.service.delete_season(&admin, season.id).unwrap_err();
    assert!(err.is_validation());
    assert!(h.service.store().load_season(season.id).unwrap().is_some());
}

#[test]
fn attachments_are_stored_by_content_hash() {
    let (_, boxed) = recording();
    let mut h = harness(two_step_library().into_store(), boxed);
    let actor = member("alice");
    let season = h.service.create_season(&actor, "FW25", "Acme").unwrap();
    let (_, snapshot) = h.service.load(season.id).unwrap();
    let a = snapshot.entry_by_order("A").unwrap().id;

    let att = h
        .service
        .attach_file(&actor, season.id, a, "swatch.pdf", b"%PDF-1.7")
        .unwrap();
    assert_eq!(att.size, 8);
    assert_eq!(att.uploaded_by, "alice");

    let (_, snapshot) = h.service.load(season.id).unwrap();
    assert_eq!(snapshot.entry(a).unwrap().attachments, vec![att.clone()]);
    assert_eq!(
        h.service.read_attachment(season.id, a, &att.content_hash).unwrap(),
        b"%PDF-1.7".to_vec()
    );
    assert_eq!(h.blobs.paths().len(), 1);
    assert_eq!(h.activity.actions().last(), Some(&ActivityAction::AttachmentAdded));
}

#[test]
fn dependents_are_notified_only_once_all_their_predecessors_are_done() {
    let store = LibraryBuilder::new()
        .with(TemplateBuilder::new("A", "Fabric sourcing").responsible("PUR"))
        .with(TemplateBuilder::new("B", "Trim sourcing").responsible("DEV"))
        .with(TemplateBuilder::new("C", "Sampling").responsible("QA").after("A").after("B"))
        .with(TemplateBuilder::new("D", "Lab dips").responsible("SHIP").after("A"))
        .into_store();
    let (notifier, boxed) = recording();
    let mut h = harness(store, boxed);
    let actor = member("alice");
    let season = h
        .service
        .create_season_at(&actor, "FW25", "Acme", day(2024, 1, 1))
        .unwrap();
    let (_, snapshot) = h.service.load(season.id).unwrap();
    let id = |order: &str| snapshot.entry_by_order(order).unwrap().id;

    let outcome = h
        .service
        .update_task(&actor, season.id, id("A"), &TaskUpdate::completed_on(day(2024, 1, 2)))
        .unwrap();
    assert_eq!(outcome.newly_actionable, vec![id("D")]);
    assert_eq!(notifier.subjects(), vec!["[FW25] D Lab dips is ready to start".to_string()]);

    let outcome = h
        .service
        .update_task(&actor, season.id, id("B"), &TaskUpdate::completed_on(day(2024, 1, 3)))
        .unwrap();
    assert_eq!(outcome.newly_actionable, vec![id("C")]);
    assert_eq!(
        notifier.subjects(),
        vec![
            "[FW25] D Lab dips is ready to start".to_string(),
            "[FW25] C Sampling is ready to start".to_string(),
        ]
    );

    let (season_now, snapshot) = h.service.load(season.id).unwrap();
    assert_eq!(season_now.require_attention, set(&["QA", "SHIP"]));
    assert_eq!(
        snapshot.entry_by_order("C").unwrap().computed_dates.unwrap().start,
        day(2024, 1, 3)
    );
}

#[test]
fn disabled_notifications_are_suppressed_by_the_log_notifier() {
    let cfg = two_step_library()
        .propagation_slack(2)
        .notifications_enabled(false)
        .build_config();
    assert_eq!(cfg.engine_options().propagation_slack, 2);

    let notifier = LogNotifier::new(cfg.notifier_config());
    let mut h = harness(two_step_library().into_store(), Box::new(notifier.clone()));
    let actor = member("alice");
    let season = h
        .service
        .create_season_at(&actor, "FW25", "Acme", day(2024, 1, 1))
        .unwrap();
    let (_, snapshot) = h.service.load(season.id).unwrap();
    let a = snapshot.entry_by_order("A").unwrap().id;

    let outcome = h
        .service
        .update_task(&actor, season.id, a, &TaskUpdate::completed_on(day(2024, 1, 2)))
        .unwrap();

    let notice = outcome
        .effects
        .iter()
        .find_map(|e| match e {
            Effect::Notify(n) => Some(n.clone()),
            Effect::Record(_) => None,
        })
        .expect("completion of A announces B");
    assert_eq!(notifier.notify(&notice), Delivery::Suppressed);
}
