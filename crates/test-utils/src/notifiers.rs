use std::sync::{Arc, Mutex};

use seasonflow::ports::{Delivery, Notification, Notifier};

/// Records every notification it is asked to deliver. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier lock").clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent().into_iter().map(|n| n.subject).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> Delivery {
        self.sent.lock().expect("notifier lock").push(notification.clone());
        Delivery::Delivered
    }
}

/// Fails every delivery, counting attempts.
#[derive(Debug, Clone, Default)]
pub struct FailingNotifier {
    attempts: Arc<Mutex<usize>>,
}

impl FailingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().expect("notifier lock")
    }
}

impl Notifier for FailingNotifier {
    fn notify(&self, _notification: &Notification) -> Delivery {
        *self.attempts.lock().expect("notifier lock") += 1;
        Delivery::Failed("smtp relay unreachable".to_string())
    }
}
