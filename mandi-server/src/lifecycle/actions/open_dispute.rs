//! OpenDispute command handler
//!
//! Either party of an order can raise a dispute at any point in the
//! order's life. The order is flagged `disputed` and the other party
//! becomes the respondent.

use chrono::Utc;

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{AuditLog, Dispute, DisputeStatus, Notification, OrderStatus};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_TEXT_LEN, validate_command_optional_text, validate_command_text,
};

/// OpenDispute action
#[derive(Debug, Clone)]
pub struct OpenDisputeAction {
    pub order_id: String,
    pub reason: String,
    pub description: Option<String>,
}

impl CommandHandler for OpenDisputeAction {
    type Output = Dispute;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Dispute, LifecycleError> {
        // 1. Validate input
        validate_command_text(&self.reason, "reason", MAX_NOTE_LEN)?;
        validate_command_optional_text(&self.description, "description", MAX_TEXT_LEN)?;

        // 2. Load the order; only the buyer or seller can raise a dispute
        let mut order = ctx.load_order(&self.order_id)?;
        let party = order
            .party_of(&metadata.actor_id)
            .ok_or_else(|| LifecycleError::Forbidden("Not authorized".to_string()))?;
        let respondent_id = order.other_party_id(party).to_string();

        // 3. Create the dispute
        let now = Utc::now();
        let dispute = Dispute {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            raised_by_user_id: metadata.actor_id.clone(),
            respondent_user_id: respondent_id.clone(),
            reason: self.reason.clone(),
            description: self.description.clone(),
            evidence_urls: vec![],
            status: DisputeStatus::Open,
            resolution: None,
            resolved_by: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        };
        ctx.storage.store_dispute(ctx.txn, &dispute)?;
        ctx.storage.index_dispute(ctx.txn, &dispute)?;

        // 4. Flag the order
        order.status = OrderStatus::Disputed;
        order.updated_at = now;
        ctx.storage.store_order(ctx.txn, &order)?;

        // 5. Notify the respondent
        ctx.notify(Notification::new(
            &respondent_id,
            "dispute_opened",
            "Dispute Opened",
            format!(
                "A dispute has been raised on order #{}. Reason: {}",
                order.id, self.reason
            ),
            EntityKind::Dispute,
            &dispute.id,
        ));

        // 6. Audit
        ctx.audit(AuditLog::new(
            EntityKind::Dispute,
            &dispute.id,
            LifecycleAction::DisputeOpened,
            metadata.audit_actor(),
            serde_json::json!({
                "order_id": order.id,
                "reason": self.reason,
            }),
        ));

        // 7. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Dispute,
            &dispute.id,
            LifecycleAction::DisputeOpened,
            &metadata.actor_id,
        ));

        Ok(dispute)
    }
}
