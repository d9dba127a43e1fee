//! ResolveDispute command handler
//!
//! Admin-only. Records the resolution text, stamps the resolver and
//! timestamp, and notifies both parties.

use chrono::Utc;

use shared::UserRole;
use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{AuditLog, Dispute, DisputeStatus, Notification};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::utils::validation::{MAX_TEXT_LEN, validate_command_text};

/// ResolveDispute action
#[derive(Debug, Clone)]
pub struct ResolveDisputeAction {
    pub dispute_id: String,
    pub resolution: String,
}

impl CommandHandler for ResolveDisputeAction {
    type Output = Dispute;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Dispute, LifecycleError> {
        // 1. Validate input and role
        validate_command_text(&self.resolution, "resolution", MAX_TEXT_LEN)?;
        metadata.require_role(UserRole::Admin, "Only admins can resolve disputes")?;

        // 2. Load the dispute; open and in_progress can be resolved
        let mut dispute = ctx.load_dispute(&self.dispute_id)?;
        if matches!(
            dispute.status,
            DisputeStatus::Resolved | DisputeStatus::Closed
        ) {
            return Err(LifecycleError::StateConflict(
                "Dispute has already been resolved".to_string(),
            ));
        }

        // 3. Resolve
        let now = Utc::now();
        dispute.status = DisputeStatus::Resolved;
        dispute.resolution = Some(self.resolution.clone());
        dispute.resolved_by = Some(metadata.actor_id.clone());
        dispute.resolved_at = Some(now);
        dispute.updated_at = now;
        ctx.storage.store_dispute(ctx.txn, &dispute)?;

        // 4. Notify both parties
        for user_id in [&dispute.raised_by_user_id, &dispute.respondent_user_id] {
            ctx.notify(Notification::new(
                user_id,
                "dispute_resolved",
                "Dispute Resolved",
                format!(
                    "Dispute on order #{} has been resolved.",
                    dispute.order_id
                ),
                EntityKind::Dispute,
                &dispute.id,
            ));
        }

        // 5. Audit
        ctx.audit(AuditLog::new(
            EntityKind::Dispute,
            &dispute.id,
            LifecycleAction::DisputeResolved,
            metadata.audit_actor(),
            serde_json::json!({
                "order_id": dispute.order_id,
                "resolution": self.resolution,
            }),
        ));

        // 6. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Dispute,
            &dispute.id,
            LifecycleAction::DisputeResolved,
            &metadata.actor_id,
        ));

        Ok(dispute)
    }
}
