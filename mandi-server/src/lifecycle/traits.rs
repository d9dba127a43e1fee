//! Core traits and context types for lifecycle command processing
//!
//! A command handler performs one lifecycle transition: it validates the
//! actor and entity state, mutates entities through the write transaction
//! in [`CommandContext`], and queues notifications, audit entries and
//! events. The queued side effects are dispatched by the manager only
//! after the transaction commits.

use redb::WriteTransaction;
use serde::Serialize;
use serde::de::DeserializeOwned;

use shared::UserRole;
use shared::event::LifecycleEvent;
use shared::models::{AuditLog, Notification};

use super::error::LifecycleError;
use crate::auth::CurrentUser;
use crate::storage::MarketStorage;

/// Actor id recorded for scheduled transitions with no human actor.
pub const SYSTEM_ACTOR: &str = "system";

/// Who triggered a command, plus its idempotency key.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// Idempotency key. A key already processed replays the recorded
    /// response instead of re-executing.
    pub command_id: String,
    /// `SYSTEM_ACTOR` for scheduled sweeps
    pub actor_id: String,
    pub actor_name: String,
    /// None for system-initiated commands
    pub actor_role: Option<UserRole>,
}

impl CommandMetadata {
    /// Metadata for a user-initiated command. Generates a fresh command id
    /// when the caller did not supply an idempotency key.
    pub fn for_user(command_id: Option<String>, user: &CurrentUser) -> Self {
        Self {
            command_id: command_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            actor_id: user.id.clone(),
            actor_name: user.name.clone(),
            actor_role: Some(user.role),
        }
    }

    /// Metadata for a system-initiated command (expiry sweep).
    pub fn system() -> Self {
        Self {
            command_id: uuid::Uuid::new_v4().to_string(),
            actor_id: SYSTEM_ACTOR.to_string(),
            actor_name: SYSTEM_ACTOR.to_string(),
            actor_role: None,
        }
    }

    /// Actor id for audit rows: None when the system acted.
    pub fn audit_actor(&self) -> Option<String> {
        if self.actor_id == SYSTEM_ACTOR {
            None
        } else {
            Some(self.actor_id.clone())
        }
    }

    /// Reject actors without the given role.
    pub fn require_role(&self, role: UserRole, message: &str) -> Result<(), LifecycleError> {
        if self.actor_role == Some(role) {
            Ok(())
        } else {
            Err(LifecycleError::Forbidden(message.to_string()))
        }
    }
}

/// Side effects queued during command execution, dispatched after commit.
#[derive(Debug, Default)]
pub struct SideEffects {
    pub notifications: Vec<Notification>,
    pub audits: Vec<AuditLog>,
    pub events: Vec<LifecycleEvent>,
}

/// Command execution context
///
/// Holds the write transaction all entity mutations go through, plus the
/// side-effect queues. Everything written through `txn` commits or aborts
/// as one unit; everything queued here is dropped if the command fails.
pub struct CommandContext<'a> {
    pub txn: &'a WriteTransaction,
    pub storage: &'a MarketStorage,
    effects: SideEffects,
}

impl<'a> CommandContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a MarketStorage) -> Self {
        Self {
            txn,
            storage,
            effects: SideEffects::default(),
        }
    }

    // ========== Entity loads with not-found mapping ==========

    pub fn load_listing(&self, listing_id: &str) -> Result<shared::models::Listing, LifecycleError> {
        self.storage
            .get_listing_txn(self.txn, listing_id)?
            .ok_or_else(|| LifecycleError::NotFound("Listing not found".to_string()))
    }

    pub fn load_offer(&self, offer_id: &str) -> Result<shared::models::Offer, LifecycleError> {
        self.storage
            .get_offer_txn(self.txn, offer_id)?
            .ok_or_else(|| LifecycleError::NotFound("Offer not found".to_string()))
    }

    pub fn load_order(&self, order_id: &str) -> Result<shared::models::Order, LifecycleError> {
        self.storage
            .get_order_txn(self.txn, order_id)?
            .ok_or_else(|| LifecycleError::NotFound("Order not found".to_string()))
    }

    pub fn load_dispute(&self, dispute_id: &str) -> Result<shared::models::Dispute, LifecycleError> {
        self.storage
            .get_dispute_txn(self.txn, dispute_id)?
            .ok_or_else(|| LifecycleError::NotFound("Dispute not found".to_string()))
    }

    pub fn load_thread(&self, thread_id: &str) -> Result<shared::models::Thread, LifecycleError> {
        self.storage
            .get_thread_txn(self.txn, thread_id)?
            .ok_or_else(|| LifecycleError::NotFound("Thread not found".to_string()))
    }

    // ========== Side-effect queues ==========

    /// Queue a notification for post-commit delivery.
    pub fn notify(&mut self, notification: Notification) {
        self.effects.notifications.push(notification);
    }

    /// Queue an audit entry for post-commit persistence.
    pub fn audit(&mut self, entry: AuditLog) {
        self.effects.audits.push(entry);
    }

    /// Queue a lifecycle event for post-commit broadcast.
    pub fn emit(&mut self, event: LifecycleEvent) {
        self.effects.events.push(event);
    }

    /// Queued notifications (assertable in tests before commit).
    pub fn notifications(&self) -> &[Notification] {
        &self.effects.notifications
    }

    /// Queued audit entries.
    pub fn audits(&self) -> &[AuditLog] {
        &self.effects.audits
    }

    /// Queued events.
    pub fn events(&self) -> &[LifecycleEvent] {
        &self.effects.events
    }

    /// Consume the context, releasing the transaction borrow for commit.
    pub fn into_side_effects(self) -> SideEffects {
        self.effects
    }
}

/// One lifecycle transition.
///
/// Handlers are synchronous: redb transactions are blocking and short,
/// so async API handlers run them inline through the manager.
pub trait CommandHandler {
    /// Success payload, recorded for idempotent replay.
    type Output: Serialize + DeserializeOwned;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Self::Output, LifecycleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_metadata_has_no_audit_actor() {
        let meta = CommandMetadata::system();
        assert_eq!(meta.actor_id, SYSTEM_ACTOR);
        assert_eq!(meta.audit_actor(), None);
        assert!(meta.actor_role.is_none());
    }

    #[test]
    fn user_metadata_generates_command_id_when_absent() {
        let user = CurrentUser {
            id: "user-1".to_string(),
            name: "Asha".to_string(),
            role: UserRole::Trader,
        };
        let meta = CommandMetadata::for_user(None, &user);
        assert!(!meta.command_id.is_empty());
        assert_eq!(meta.audit_actor(), Some("user-1".to_string()));

        let meta = CommandMetadata::for_user(Some("cmd-42".to_string()), &user);
        assert_eq!(meta.command_id, "cmd-42");
    }

    #[test]
    fn require_role_rejects_wrong_role() {
        let user = CurrentUser {
            id: "user-1".to_string(),
            name: "Asha".to_string(),
            role: UserRole::Farmer,
        };
        let meta = CommandMetadata::for_user(None, &user);
        assert!(meta.require_role(UserRole::Farmer, "farmers only").is_ok());
        assert!(matches!(
            meta.require_role(UserRole::Admin, "admins only"),
            Err(LifecycleError::Forbidden(_))
        ));
    }
}
