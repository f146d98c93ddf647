// src/ports/mod.rs

//! Collaborators consumed by the season service.
//!
//! - [`store`]: records (templates, seasons, snapshots) with versioned saves.
//! - [`notify`]: best-effort outbound notifications.
//! - [`activity`]: append-only, best-effort activity log.
//! - [`attachments`]: content-addressed blob storage for task files.

pub mod activity;
pub mod attachments;
pub mod notify;
pub mod store;

pub use activity::{ActivityAction, ActivityEntry, ActivityLogger, MemoryActivityLog, TracingActivityLog};
pub use attachments::{AttachmentStore, FileAttachmentStore};
pub use notify::{Delivery, LogNotifier, Notification, Notifier, NotifierConfig};
pub use store::{JsonFileStore, MemoryStore, Store};
