//! User-facing notifications.
//!
//! Every validation failure, success, and pipeline failure yields exactly
//! one short message. The message text is stable; how it is shown (toast,
//! banner, log line) belongs to the host.

use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Shown when a file passes intake and crop mode opens.
pub const IMAGE_SELECTED: &str = "Image selected. Adjust the crop and confirm.";

/// Shown when a crop is confirmed and encoded.
pub const CROP_SUCCEEDED: &str = "Image cropped successfully";

/// Prefix of the message shown when confirm fails.
pub const CROP_FAILED: &str = "Failed to crop image";

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// One message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Delivers notifications to the host UI.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => tracing::warn!("{}", notification.message),
            _ => tracing::info!("{}", notification.message),
        }
    }
}

/// Forwards notifications over a channel to whatever renders them.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end for the renderer.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            // Renderer gone; nothing left to show the message to
            tracing::debug!("Notification dropped: receiver closed");
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Messages only, in order.
    pub fn messages(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_delivers() {
        let (notifier, mut rx) = ChannelNotifier::channel();
        notifier.notify(Notification::success(CROP_SUCCEEDED));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.level, NotificationLevel::Success);
        assert_eq!(received.message, CROP_SUCCEEDED);
    }

    #[test]
    fn test_channel_notifier_tolerates_closed_receiver() {
        let (notifier, rx) = ChannelNotifier::channel();
        drop(rx);
        notifier.notify(Notification::info("ignored"));
    }

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify(Notification::info("first"));
        notifier.notify(Notification::error("second"));
        assert_eq!(notifier.messages(), vec!["first", "second"]);
        assert_eq!(notifier.notifications()[1].level, NotificationLevel::Error);
    }

    #[test]
    fn test_notification_serializes_level_lowercase() {
        let json = serde_json::to_string(&Notification::error("x")).unwrap();
        assert!(json.contains("\"level\":\"error\""));
    }
}
