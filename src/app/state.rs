use crate::upload::{Notification, Notifier};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub notification: Notification,
    pub shown_at: Instant,
}

#[derive(Debug, Default)]
struct Toasts {
    next_id: u64,
    items: Vec<Toast>,
}

/// Notifications waiting to be drawn by the window.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Mutex<Toasts>,
}

impl ToastQueue {
    /// Drops expired toasts and returns the ones still visible, oldest first.
    pub fn visible(&self, now: Instant) -> Vec<Toast> {
        let mut toasts = self.toasts.lock().unwrap_or_else(|p| p.into_inner());
        toasts
            .items
            .retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_LIFETIME);
        toasts.items.clone()
    }

    pub fn dismiss(&self, id: u64) {
        let mut toasts = self.toasts.lock().unwrap_or_else(|p| p.into_inner());
        toasts.items.retain(|t| t.id != id);
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.lock().map(|t| t.items.is_empty()).unwrap_or(true)
    }

    fn push(&self, notification: Notification, shown_at: Instant) -> u64 {
        let mut toasts = self.toasts.lock().unwrap_or_else(|p| p.into_inner());
        let id = toasts.next_id;
        toasts.next_id += 1;
        toasts.items.push(Toast {
            id,
            notification,
            shown_at,
        });
        id
    }
}

impl Notifier for ToastQueue {
    fn add(&self, notification: Notification) {
        self.push(notification, Instant::now());
    }
}
