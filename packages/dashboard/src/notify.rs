//! Transient status notifications.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: TimeDelta = TimeDelta::seconds(5);

/// Notification severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Danger,
    Warning,
    Info,
}

/// One status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn new(level: NotificationLevel, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: now,
            expires_at: now + NOTIFICATION_TTL,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Status messages shown above the dashboard, oldest first.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    notifications: Vec<Notification>,
}

impl StatusBoard {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            notifications: Vec::new(),
        }
    }

    /// Posts a message timestamped now.
    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.push_at(level, message, Utc::now());
    }

    pub fn push_at(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        let notification = Notification::new(level, message, now);
        log::debug!("[{}] {}", notification.level, notification.message);
        self.notifications.push(notification);
    }

    /// Messages still visible at `now`.
    #[must_use]
    pub fn active(&self, now: DateTime<Utc>) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| !n.is_expired(now))
            .collect()
    }

    /// Drops messages that have expired by `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.notifications.retain(|n| !n.is_expired(now));
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }

    /// Every message posted since the last clear, expired or not.
    #[must_use]
    pub fn all(&self) -> &[Notification] {
        &self.notifications
    }
}
