//! CancelOrder command handler
//!
//! Either party can cancel an order that has not shipped yet. Captured
//! payments are refunded, pending shipments cancelled, and the reserved
//! listing stock is returned to the market.

use chrono::Utc;

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{
    AuditLog, ListingStatus, Notification, OrderStatus, PaymentStatus, ShipmentStatus,
};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::utils::validation::{MAX_NOTE_LEN, validate_command_text};

/// CancelOrder action
#[derive(Debug, Clone)]
pub struct CancelOrderAction {
    pub order_id: String,
    pub reason: String,
}

impl CommandHandler for CancelOrderAction {
    type Output = ();

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), LifecycleError> {
        // 1. Validate input
        validate_command_text(&self.reason, "reason", MAX_NOTE_LEN)?;

        // 2. Load the order; only the buyer or seller can cancel
        let mut order = ctx.load_order(&self.order_id)?;
        let party = order
            .party_of(&metadata.actor_id)
            .ok_or_else(|| LifecycleError::Forbidden("Not authorized".to_string()))?;

        // 3. Shipped, completed, and already-cancelled orders stay put
        if !order.status.is_cancellable() {
            return Err(LifecycleError::StateConflict(
                "Order cannot be cancelled at this stage".to_string(),
            ));
        }

        // 4. Cancel the order
        let now = Utc::now();
        let original_status = order.status;
        order.status = OrderStatus::Cancelled;
        order.cancellation_reason = Some(self.reason.clone());
        order.cancelled_by = Some(party);
        order.notes = Some(format!("Cancelled by {}: {}", party, self.reason));
        order.updated_at = now;
        ctx.storage.store_order(ctx.txn, &order)?;

        // 5. Refund a captured payment
        let payments = ctx.storage.list_payments_for_order_txn(ctx.txn, &order.id)?;
        if let Some(mut payment) = payments
            .into_iter()
            .find(|p| p.status == PaymentStatus::Captured)
        {
            payment.status = PaymentStatus::Refunded;
            payment.refund_amount = Some(payment.amount);
            payment.updated_at = now;
            ctx.storage.store_payment(ctx.txn, &payment)?;
        }

        // 6. Cancel a shipment that has not been picked up
        if let Some(mut shipment) = ctx.storage.get_shipment_txn(ctx.txn, &order.id)?
            && shipment.status == ShipmentStatus::Pending
        {
            shipment.status = ShipmentStatus::Cancelled;
            shipment.updated_at = now;
            ctx.storage.store_shipment(ctx.txn, &shipment)?;
        }

        // 7. Return the reserved stock to the listing
        if let Some(mut listing) = ctx.storage.get_listing_txn(ctx.txn, &order.listing_id)? {
            listing.quantity_available += order.quantity;
            if listing.status == ListingStatus::Sold {
                listing.status = ListingStatus::Active;
            }
            listing.updated_at = now;
            ctx.storage.store_listing(ctx.txn, &listing)?;
        }

        // 8. Notify the other party, then confirm to the actor
        let other_party_id = order.other_party_id(party).to_string();
        ctx.notify(Notification::new(
            &other_party_id,
            "order_cancelled",
            "Order Cancelled",
            format!(
                "Order #{} has been cancelled by {}. Reason: {}",
                order.id, party, self.reason
            ),
            EntityKind::Order,
            &order.id,
        ));
        ctx.notify(Notification::new(
            &metadata.actor_id,
            "order_cancelled",
            "Order Cancelled",
            format!("You have successfully cancelled order #{}.", order.id),
            EntityKind::Order,
            &order.id,
        ));

        // 9. Audit
        ctx.audit(AuditLog::new(
            EntityKind::Order,
            &order.id,
            LifecycleAction::Cancelled,
            metadata.audit_actor(),
            serde_json::json!({
                "reason": self.reason,
                "cancelled_by": party,
                "original_status": original_status,
            }),
        ));

        // 10. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Order,
            &order.id,
            LifecycleAction::Cancelled,
            &metadata.actor_id,
        ));

        Ok(())
    }
}
