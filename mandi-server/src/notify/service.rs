//! Notification queue handle

use shared::models::Notification;
use tokio::sync::mpsc;

/// Sending half of the notification pipeline.
///
/// Held by the lifecycle manager and cloned freely. `enqueue` never
/// blocks; when the queue is full the notification is dropped and
/// logged, the command that produced it has already committed.
#[derive(Debug, Clone)]
pub struct NotifyService {
    tx: mpsc::Sender<Notification>,
}

impl NotifyService {
    pub fn new(buffer_size: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (Self { tx }, rx)
    }

    /// Queue a notification for delivery.
    pub fn enqueue(&self, notification: Notification) {
        if let Err(e) = self.tx.try_send(notification) {
            tracing::warn!(error = %e, "Notification queue full or closed, dropping notification");
        }
    }
}
