// src/ports/notify.rs

//! Outbound notifications ("task now actionable").

use tracing::{info, warn};

use crate::types::{SeasonId, TaskId};

/// Notifier settings, handed to each notifier explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierConfig {
    /// When `false`, every notification is suppressed.
    pub enabled: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// A message for one or more departments (or users).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub season_id: SeasonId,
    pub task_id: Option<TaskId>,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Notifications are disabled by configuration.
    Suppressed,
    Failed(String),
}

/// Delivery channel. Implementations must not panic; failures are reported
/// as [`Delivery::Failed`] and never fail the calling transaction.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Delivery;
}

/// Writes notifications to the log. Used by the CLI as its outbox.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    config: NotifierConfig,
}

impl LogNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        Self { config }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Delivery {
        if !self.config.enabled {
            return Delivery::Suppressed;
        }
        if notification.recipients.is_empty() {
            warn!(subject = %notification.subject, "notification has no recipients");
            return Delivery::Failed("no recipients".to_string());
        }

        info!(
            target: "seasonflow::outbox",
            season = %notification.season_id,
            recipients = ?notification.recipients,
            subject = %notification.subject,
            body = %notification.body,
            "notification"
        );
        Delivery::Delivered
    }
}
