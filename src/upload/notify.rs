use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: Option<String>,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn upload_finished() -> Self {
        Self {
            title: "Upload finished".to_string(),
            description: Some("We'll process your document in the background.".to_string()),
            level: NotificationLevel::Success,
        }
    }

    pub fn upload_failed(message: &str) -> Self {
        Self {
            title: "Upload failed".to_string(),
            description: Some(message.to_string()),
            level: NotificationLevel::Error,
        }
    }

    pub fn summary_ready() -> Self {
        Self {
            title: "Summary ready".to_string(),
            description: Some("Open \"Check status\" to review.".to_string()),
            level: NotificationLevel::Info,
        }
    }

    pub fn processing_failed() -> Self {
        Self {
            title: "Processing failed".to_string(),
            description: None,
            level: NotificationLevel::Error,
        }
    }
}

/// Somewhere to surface user-facing notifications.
pub trait Notifier: Send + Sync {
    fn add(&self, notification: Notification);
}

/// Sends notifications to the log. Used when there is no window.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn add(&self, notification: Notification) {
        let description = notification.description.as_deref().unwrap_or("");
        match notification.level {
            NotificationLevel::Error => warn!("{}: {}", notification.title, description),
            _ => info!("{}: {}", notification.title, description),
        }
    }
}
