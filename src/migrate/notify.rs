//! User-visible notifications emitted after a migration.

use std::sync::Mutex;

use tracing::info;

/// Title of the post-migration notification.
pub const UPGRADE_TITLE: &str = "SoundBoard Upgrade";

/// Message of the post-migration notification.
pub const UPGRADE_MESSAGE: &str = "A major update was performed. A backup has been made.";

/// Sink for title/message notifications.
pub trait Notifier {
    fn notify(&self, title: &str, message: &str);
}

/// Emits notifications as `info` log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(target: "sb::notify", title, message, "Notification");
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// Keeps every notification in memory, for callers that display them later.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far, oldest first.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, message: &str) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(Notification {
                title: title.to_string(),
                message: message.to_string(),
            });
        }
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, title: &str, message: &str) {
        (**self).notify(title, message);
    }
}
