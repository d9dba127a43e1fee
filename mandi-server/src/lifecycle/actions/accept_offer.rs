//! AcceptOffer command handler
//!
//! The listing seller accepts a pending offer, spawning an order with
//! fees computed at acceptance time. Stock is decremented conditionally
//! inside the same transaction, so two accepts can never oversell.

use chrono::{Duration, Utc};

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{AuditLog, ListingStatus, Notification, Offer, OfferStatus, Order, OrderStatus};
use shared::types::Address;

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::pricing::calculate_order_fees;
use crate::utils::validation::{MAX_ADDRESS_LEN, MAX_SHORT_TEXT_LEN, validate_command_text};

/// Days the buyer has to pay after acceptance.
const PAYMENT_DUE_DAYS: i64 = 7;

/// AcceptOffer action
#[derive(Debug, Clone)]
pub struct AcceptOfferAction {
    pub offer_id: String,
    pub delivery_address: Address,
}

impl CommandHandler for AcceptOfferAction {
    type Output = Order;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Order, LifecycleError> {
        // 1. Validate the delivery address
        let address = &self.delivery_address;
        validate_command_text(&address.line1, "delivery_address.line1", MAX_ADDRESS_LEN)?;
        validate_command_text(&address.city, "delivery_address.city", MAX_SHORT_TEXT_LEN)?;
        validate_command_text(&address.state, "delivery_address.state", MAX_SHORT_TEXT_LEN)?;
        validate_command_text(&address.pincode, "delivery_address.pincode", MAX_SHORT_TEXT_LEN)?;

        // 2. Load the offer; only pending offers can be accepted
        let mut offer = ctx.load_offer(&self.offer_id)?;
        if offer.status != OfferStatus::Pending {
            return Err(LifecycleError::StateConflict(
                "Offer is not pending".to_string(),
            ));
        }

        // 3. Only the listing seller may accept
        let mut listing = ctx.load_listing(&offer.listing_id)?;
        if listing.seller_id != metadata.actor_id {
            return Err(LifecycleError::Forbidden("Not authorized".to_string()));
        }

        // 4. Conditional stock decrement; concurrent accepts against the
        //    same stock are serialized by the single-writer transaction
        if listing.quantity_available < offer.quantity {
            return Err(LifecycleError::StateConflict(
                "Insufficient stock to accept this offer".to_string(),
            ));
        }
        listing.quantity_available -= offer.quantity;
        if listing.quantity_available.is_zero() {
            listing.status = ListingStatus::Sold;
        }
        listing.updated_at = Utc::now();
        ctx.storage.store_listing(ctx.txn, &listing)?;

        // 5. Create the order with fees fixed at acceptance time
        let now = Utc::now();
        let fees = calculate_order_fees(offer.total_amount);
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            listing_id: listing.id.clone(),
            buyer_id: offer.buyer_id.clone(),
            seller_id: listing.seller_id.clone(),
            offer_id: offer.id.clone(),
            quantity: offer.quantity,
            unit_price: offer.price_per_unit,
            subtotal: fees.subtotal,
            platform_fee: fees.platform_fee,
            tax_amount: fees.tax_amount,
            total_amount: fees.total_amount,
            delivery_address: self.delivery_address.clone(),
            payment_due_date: now + Duration::days(PAYMENT_DUE_DAYS),
            status: OrderStatus::Pending,
            cancellation_reason: None,
            cancelled_by: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        ctx.storage.store_order(ctx.txn, &order)?;
        ctx.storage.index_order(ctx.txn, &order)?;

        // 6. Mark the offer accepted and drop it from the expiry queue
        offer.status = OfferStatus::Accepted;
        offer.updated_at = now;
        ctx.storage.store_offer(ctx.txn, &offer)?;
        ctx.storage.clear_offer_expiry(ctx.txn, &offer)?;

        // 7. Notify both parties
        ctx.notify(Notification::new(
            &order.buyer_id,
            "order_created",
            "Offer Accepted",
            format!(
                "Your offer for {} has been accepted. Order #{} created.",
                listing.title, order.id
            ),
            EntityKind::Order,
            &order.id,
        ));
        ctx.notify(Notification::new(
            &order.seller_id,
            "order_created",
            "New Order",
            format!("New order #{} created from accepted offer.", order.id),
            EntityKind::Order,
            &order.id,
        ));

        // 8. Audit the order creation
        ctx.audit(AuditLog::new(
            EntityKind::Order,
            &order.id,
            LifecycleAction::Created,
            metadata.audit_actor(),
            serde_json::json!({
                "offer_id": offer.id,
                "total_amount": order.total_amount,
            }),
        ));

        // 9. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Order,
            &order.id,
            LifecycleAction::Created,
            &metadata.actor_id,
        ));

        Ok(order)
    }
}
