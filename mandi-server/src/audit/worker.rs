//! Audit background worker

use shared::models::AuditLog;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::storage::MarketStorage;

/// Worker that drains the audit queue into storage.
pub struct AuditWorker {
    storage: MarketStorage,
}

impl AuditWorker {
    pub fn new(storage: MarketStorage) -> Self {
        Self { storage }
    }

    /// Run the worker until the channel closes or shutdown is signalled.
    /// On shutdown, already-queued entries are drained first.
    pub async fn run(self, mut rx: mpsc::Receiver<AuditLog>, shutdown: CancellationToken) {
        tracing::info!("Audit worker started");

        loop {
            tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(entry) => self.handle(entry),
                    None => {
                        tracing::info!("Audit channel closed, worker stopping");
                        break;
                    }
                },
                _ = shutdown.cancelled() => {
                    while let Ok(entry) = rx.try_recv() {
                        self.handle(entry);
                    }
                    tracing::info!("Audit worker stopping");
                    break;
                }
            }
        }
    }

    fn handle(&self, entry: AuditLog) {
        match self.storage.insert_audit_log(&entry) {
            Ok(()) => {
                tracing::debug!(
                    entity_type = ?entry.entity_type,
                    entity_id = %entry.entity_id,
                    action = ?entry.action,
                    "Audit entry recorded"
                );
            }
            Err(e) => {
                tracing::error!(
                    entity_id = %entry.entity_id,
                    action = ?entry.action,
                    error = %e,
                    "Failed to write audit entry"
                );
            }
        }
    }
}
