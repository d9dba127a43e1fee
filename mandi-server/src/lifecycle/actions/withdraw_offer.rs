//! WithdrawOffer command handler
//!
//! The buyer pulls back a pending offer before the seller acts on it.

use chrono::Utc;

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{AuditLog, Notification, Offer, OfferStatus};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};

/// WithdrawOffer action
#[derive(Debug, Clone)]
pub struct WithdrawOfferAction {
    pub offer_id: String,
}

impl CommandHandler for WithdrawOfferAction {
    type Output = Offer;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Offer, LifecycleError> {
        // 1. Load the offer; only pending offers can be withdrawn
        let mut offer = ctx.load_offer(&self.offer_id)?;
        if offer.status != OfferStatus::Pending {
            return Err(LifecycleError::StateConflict(
                "Offer is not pending".to_string(),
            ));
        }

        // 2. Only the offer's buyer may withdraw
        if offer.buyer_id != metadata.actor_id {
            return Err(LifecycleError::Forbidden("Not authorized".to_string()));
        }

        // 3. Flip to withdrawn and drop from the expiry queue
        offer.status = OfferStatus::Withdrawn;
        offer.updated_at = Utc::now();
        ctx.storage.store_offer(ctx.txn, &offer)?;
        ctx.storage.clear_offer_expiry(ctx.txn, &offer)?;

        // 4. Notify the seller
        let listing = ctx.load_listing(&offer.listing_id)?;
        ctx.notify(Notification::new(
            &listing.seller_id,
            "offer_withdrawn",
            "Offer Withdrawn",
            format!(
                "The buyer has withdrawn their offer for {}.",
                listing.title
            ),
            EntityKind::Offer,
            &offer.id,
        ));

        // 5. Audit
        ctx.audit(AuditLog::new(
            EntityKind::Offer,
            &offer.id,
            LifecycleAction::OfferWithdrawn,
            metadata.audit_actor(),
            serde_json::json!({ "listing_id": offer.listing_id }),
        ));

        // 6. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Offer,
            &offer.id,
            LifecycleAction::OfferWithdrawn,
            &metadata.actor_id,
        ));

        Ok(offer)
    }
}
