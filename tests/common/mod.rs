#![allow(dead_code)]

use seasonflow::engine::{EngineOptions, SeasonService};
use seasonflow::fs::mock::MockFileSystem;
use seasonflow::ports::{FileAttachmentStore, MemoryActivityLog, MemoryStore, Notifier};
use seasonflow_test_utils::builders::{LibraryBuilder, TemplateBuilder};
use seasonflow_test_utils::notifiers::RecordingNotifier;

/// Service over in-memory collaborators, with handles to inspect them.
pub struct Harness {
    pub service: SeasonService<MemoryStore>,
    pub activity: MemoryActivityLog,
    pub blobs: MockFileSystem,
}

pub fn harness(store: MemoryStore, notifier: Box<dyn Notifier>) -> Harness {
    seasonflow_test_utils::init_tracing();
    let activity = MemoryActivityLog::new();
    let blobs = MockFileSystem::new();
    let service = SeasonService::new(
        store,
        notifier,
        Box::new(activity.clone()),
        Box::new(FileAttachmentStore::new(blobs.clone(), "attachments")),
        EngineOptions::default(),
    );
    Harness {
        service,
        activity,
        blobs,
    }
}

/// A (PUR, 2 days) -> B (DEV, 3 days).
pub fn two_step_library() -> LibraryBuilder {
    LibraryBuilder::new()
        .with(TemplateBuilder::new("A", "Fabric sourcing").responsible("PUR").lead_time(2))
        .with(
            TemplateBuilder::new("B", "Sampling")
                .responsible("DEV")
                .after("A")
                .lead_time(3),
        )
}

pub fn recording() -> (RecordingNotifier, Box<dyn Notifier>) {
    let notifier = RecordingNotifier::new();
    (notifier.clone(), Box::new(notifier))
}
