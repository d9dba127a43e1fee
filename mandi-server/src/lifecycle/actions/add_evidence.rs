//! AddEvidence command handler
//!
//! Appends evidence URLs to an open dispute. The read-modify-write runs
//! inside the command transaction, so concurrent appends cannot drop
//! each other's entries.

use chrono::Utc;

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{AuditLog, Dispute, DisputeStatus};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::utils::validation::{MAX_URL_LEN, validate_command_text};

/// AddEvidence action
#[derive(Debug, Clone)]
pub struct AddEvidenceAction {
    pub dispute_id: String,
    pub evidence_urls: Vec<String>,
}

impl CommandHandler for AddEvidenceAction {
    type Output = Dispute;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Dispute, LifecycleError> {
        // 1. Validate input
        if self.evidence_urls.is_empty() {
            return Err(LifecycleError::Validation(
                "evidence_urls must not be empty".to_string(),
            ));
        }
        for url in &self.evidence_urls {
            validate_command_text(url, "evidence_url", MAX_URL_LEN)?;
        }

        // 2. Load the dispute; only its participants can add evidence
        let mut dispute = ctx.load_dispute(&self.dispute_id)?;
        if !dispute.involves(&metadata.actor_id) {
            return Err(LifecycleError::Forbidden("Not authorized".to_string()));
        }

        // 3. Settled disputes are immutable
        if matches!(
            dispute.status,
            DisputeStatus::Resolved | DisputeStatus::Closed
        ) {
            return Err(LifecycleError::StateConflict(
                "Dispute is no longer accepting evidence".to_string(),
            ));
        }

        // 4. Append
        dispute
            .evidence_urls
            .extend(self.evidence_urls.iter().cloned());
        dispute.updated_at = Utc::now();
        ctx.storage.store_dispute(ctx.txn, &dispute)?;

        // 5. Audit
        ctx.audit(AuditLog::new(
            EntityKind::Dispute,
            &dispute.id,
            LifecycleAction::EvidenceAdded,
            metadata.audit_actor(),
            serde_json::json!({
                "added": self.evidence_urls.len(),
                "total": dispute.evidence_urls.len(),
            }),
        ));

        // 6. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Dispute,
            &dispute.id,
            LifecycleAction::EvidenceAdded,
            &metadata.actor_id,
        ));

        Ok(dispute)
    }
}
