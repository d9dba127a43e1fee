//! Audit queue handle

use shared::models::AuditLog;
use tokio::sync::mpsc;

/// Sending half of the audit pipeline.
///
/// `enqueue` never blocks. A dropped entry is logged with its action
/// so the gap is at least visible in the server log.
#[derive(Debug, Clone)]
pub struct AuditService {
    tx: mpsc::Sender<AuditLog>,
}

impl AuditService {
    pub fn new(buffer_size: usize) -> (Self, mpsc::Receiver<AuditLog>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (Self { tx }, rx)
    }

    /// Queue an audit entry for persistence.
    pub fn enqueue(&self, entry: AuditLog) {
        if let Err(e) = self.tx.try_send(entry) {
            tracing::warn!(error = %e, "Audit queue full or closed, dropping audit entry");
        }
    }
}
