//! User-facing notification queue.
//!
//! Errors that leave the UI in a state the user has to know about are pushed
//! here so the presentation layer can surface them; nothing is dropped until
//! it is drained.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Cloneable handle to the session's notification queue
#[derive(Clone, Default)]
pub struct Notifications {
    entries: Arc<RwLock<Vec<Notification>>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, level: NotificationLevel, title: &str, message: String) {
        let mut entries = self.entries.write().await;
        entries.push(Notification {
            level,
            title: title.to_string(),
            message,
            created_at: Utc::now(),
        });
        debug!("Queued notification, total pending: {}", entries.len());
    }

    pub async fn push_error(&self, title: &str, message: String) {
        self.push(NotificationLevel::Error, title, message).await;
    }

    pub async fn push_info(&self, title: &str, message: String) {
        self.push(NotificationLevel::Info, title, message).await;
    }

    /// Take every pending notification, oldest first.
    pub async fn drain(&self) -> Vec<Notification> {
        let mut entries = self.entries.write().await;
        std::mem::take(&mut *entries)
    }

    pub async fn pending_count(&self) -> usize {
        self.entries.read().await.len()
    }
}
