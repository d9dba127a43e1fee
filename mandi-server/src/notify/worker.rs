//! Notification background worker
//!
//! Consumes queued notifications, persists them, and fans out to the
//! side channels. Email, SMS, and push are logged stubs until a real
//! provider is wired in. redb writes are synchronous and short.

use shared::models::{Notification, NotificationChannel};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::storage::MarketStorage;

/// Worker that drains the notification queue.
pub struct NotifyWorker {
    storage: MarketStorage,
}

impl NotifyWorker {
    pub fn new(storage: MarketStorage) -> Self {
        Self { storage }
    }

    /// Run the worker until the channel closes or shutdown is signalled.
    /// On shutdown, already-queued notifications are drained first.
    pub async fn run(self, mut rx: mpsc::Receiver<Notification>, shutdown: CancellationToken) {
        tracing::info!("Notification worker started");

        loop {
            tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(notification) => self.handle(notification),
                    None => {
                        tracing::info!("Notification channel closed, worker stopping");
                        break;
                    }
                },
                _ = shutdown.cancelled() => {
                    while let Ok(notification) = rx.try_recv() {
                        self.handle(notification);
                    }
                    tracing::info!("Notification worker stopping");
                    break;
                }
            }
        }
    }

    fn handle(&self, notification: Notification) {
        if let Err(e) = self.storage.insert_notification(&notification) {
            tracing::error!(
                user_id = %notification.user_id,
                kind = %notification.kind,
                error = %e,
                "Failed to persist notification"
            );
            return;
        }

        tracing::debug!(
            user_id = %notification.user_id,
            kind = %notification.kind,
            "Notification stored"
        );
        self.deliver_side_channels(&notification);
    }

    /// Best-effort channels beyond the persisted in-app row.
    fn deliver_side_channels(&self, notification: &Notification) {
        for channel in &notification.channels {
            match channel {
                NotificationChannel::InApp => {}
                NotificationChannel::Email => {
                    tracing::info!(
                        user_id = %notification.user_id,
                        title = %notification.title,
                        "Would send email notification"
                    );
                }
                NotificationChannel::Sms => {
                    tracing::info!(
                        user_id = %notification.user_id,
                        title = %notification.title,
                        "Would send SMS notification"
                    );
                }
                NotificationChannel::Push => {
                    tracing::info!(
                        user_id = %notification.user_id,
                        title = %notification.title,
                        "Would send push notification"
                    );
                }
            }
        }
    }
}
