//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::EntityKind;

/// Delivery channel for a notification. `in_app` is satisfied by
/// persistence alone; the rest are best-effort side deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    InApp,
    Email,
    Sms,
    Push,
}

/// An in-app notification raised by a lifecycle transition. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    /// Recipient
    pub user_id: String,
    /// Machine-readable kind (e.g. "offer_received", "payment_failed")
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub entity_type: Option<EntityKind>,
    pub entity_id: Option<String>,
    pub channels: Vec<NotificationChannel>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// An unread in-app notification referencing the entity it was raised for.
    pub fn new(
        user_id: impl Into<String>,
        kind: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        entity_type: EntityKind,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            kind: kind.into(),
            title: title.into(),
            message: message.into(),
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.into()),
            channels: vec![NotificationChannel::InApp],
            is_read: false,
            created_at: Utc::now(),
        }
    }

    /// Request additional best-effort delivery channels.
    pub fn with_channels(mut self, channels: Vec<NotificationChannel>) -> Self {
        self.channels = channels;
        self
    }
}
