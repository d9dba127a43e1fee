//! LifecycleManager - command execution and side-effect dispatch
//!
//! # Command Flow
//!
//! ```text
//! execute(action, metadata)
//!     ├─ 1. Idempotency check (command_id, replay recorded response)
//!     ├─ 2. Begin write transaction
//!     ├─ 3. Re-check idempotency inside the transaction
//!     ├─ 4. Run the handler (all entity mutations)
//!     ├─ 5. Record the response for replay
//!     ├─ 6. Commit
//!     ├─ 7. Queue notifications and audit entries, broadcast events
//!     └─ 8. Return output
//! ```
//!
//! A handler error aborts before commit, so a failed command leaves no
//! trace: no mutations, no recorded response, no side effects. redb
//! permits one writer at a time, which is what serializes conditional
//! checks like the stock decrement on offer acceptance.

use tokio::sync::broadcast;

use shared::event::LifecycleEvent;

use crate::audit::AuditService;
use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata, SideEffects};
use crate::notify::NotifyService;
use crate::storage::{MarketStorage, StorageError};

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Runs lifecycle commands against storage and dispatches their
/// side effects after commit.
pub struct LifecycleManager {
    storage: MarketStorage,
    event_tx: broadcast::Sender<LifecycleEvent>,
    notifier: Option<NotifyService>,
    audit_sink: Option<AuditService>,
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("storage", &"<MarketStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("notifier", &self.notifier.is_some())
            .field("audit_sink", &self.audit_sink.is_some())
            .finish()
    }
}

impl Clone for LifecycleManager {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            event_tx: self.event_tx.clone(),
            notifier: self.notifier.clone(),
            audit_sink: self.audit_sink.clone(),
        }
    }
}

impl LifecycleManager {
    pub fn new(storage: MarketStorage) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            event_tx,
            notifier: None,
            audit_sink: None,
        }
    }

    /// Set the notification queue handle
    pub fn set_notifier(&mut self, notifier: NotifyService) {
        self.notifier = Some(notifier);
    }

    /// Set the audit queue handle
    pub fn set_audit_sink(&mut self, audit_sink: AuditService) {
        self.audit_sink = Some(audit_sink);
    }

    /// Subscribe to committed lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &MarketStorage {
        &self.storage
    }

    /// Execute a command
    ///
    /// Retrying with the same `command_id` replays the recorded output
    /// instead of running the handler again.
    pub fn execute<A: CommandHandler>(
        &self,
        action: &A,
        metadata: &CommandMetadata,
    ) -> Result<A::Output, LifecycleError> {
        tracing::info!(
            command_id = %metadata.command_id,
            actor_id = %metadata.actor_id,
            "Processing command"
        );

        // 1. Idempotency check (before transaction)
        if let Some(recorded) = self.storage.get_command_response(&metadata.command_id)? {
            tracing::warn!(command_id = %metadata.command_id, "Duplicate command, replaying response");
            return Self::replay(&recorded);
        }

        // 2. Begin write transaction
        let txn = self.storage.begin_write()?;

        // 3. Double-check idempotency within the transaction
        if let Some(recorded) = self
            .storage
            .get_command_response_txn(&txn, &metadata.command_id)?
        {
            return Self::replay(&recorded);
        }

        // 4. Run the handler
        let mut ctx = CommandContext::new(&txn, &self.storage);
        let output = action.execute(&mut ctx, metadata)?;

        // 5. Record the response for replay
        let recorded = serde_json::to_vec(&output).map_err(|e| {
            LifecycleError::Internal(format!("Failed to serialize command response: {e}"))
        })?;
        self.storage
            .record_command_response(&txn, &metadata.command_id, &recorded)?;

        // 6. Commit
        let effects = ctx.into_side_effects();
        txn.commit().map_err(StorageError::from)?;

        // 7. Dispatch side effects, post-commit only
        self.dispatch(effects);

        Ok(output)
    }

    fn replay<T: serde::de::DeserializeOwned>(recorded: &[u8]) -> Result<T, LifecycleError> {
        serde_json::from_slice(recorded).map_err(|e| {
            LifecycleError::Internal(format!("Recorded command response is corrupt: {e}"))
        })
    }

    fn dispatch(&self, effects: SideEffects) {
        let SideEffects {
            notifications,
            audits,
            events,
        } = effects;

        match &self.notifier {
            Some(notifier) => {
                for notification in notifications {
                    notifier.enqueue(notification);
                }
            }
            None if !notifications.is_empty() => {
                tracing::debug!(count = notifications.len(), "No notifier configured");
            }
            None => {}
        }

        match &self.audit_sink {
            Some(audit_sink) => {
                for entry in audits {
                    audit_sink.enqueue(entry);
                }
            }
            None if !audits.is_empty() => {
                tracing::debug!(count = audits.len(), "No audit sink configured");
            }
            None => {}
        }

        // send only fails when nobody is subscribed
        for event in events {
            let _ = self.event_tx.send(event);
        }
    }
}
