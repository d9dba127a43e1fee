//! ConfirmDelivery command handler
//!
//! The buyer confirms receipt of a shipped order. This completes the
//! order, marks the shipment delivered, and releases the escrow to a
//! pending seller payout net of platform fee and tax.

use chrono::Utc;

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{
    AuditLog, Notification, OrderStatus, PaymentStatus, Payout, PayoutStatus, ShipmentStatus,
    TrackingEvent,
};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};

/// ConfirmDelivery action
#[derive(Debug, Clone)]
pub struct ConfirmDeliveryAction {
    pub order_id: String,
}

impl CommandHandler for ConfirmDeliveryAction {
    type Output = ();

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<(), LifecycleError> {
        // 1. Load the order; only the buyer confirms delivery
        let mut order = ctx.load_order(&self.order_id)?;
        if order.buyer_id != metadata.actor_id {
            return Err(LifecycleError::Forbidden("Not authorized".to_string()));
        }

        // 2. Only shipped orders can be confirmed
        if order.status != OrderStatus::Shipped {
            return Err(LifecycleError::StateConflict(
                "Order must be shipped to confirm delivery".to_string(),
            ));
        }

        // 3. Complete the order
        let now = Utc::now();
        order.status = OrderStatus::Completed;
        order.updated_at = now;
        ctx.storage.store_order(ctx.txn, &order)?;

        // 4. Mark the shipment delivered
        if let Some(mut shipment) = ctx.storage.get_shipment_txn(ctx.txn, &order.id)? {
            shipment.status = ShipmentStatus::Delivered;
            shipment.delivery_date = Some(now);
            shipment.tracking_events.push(TrackingEvent {
                timestamp: now,
                status: ShipmentStatus::Delivered,
                description: Some("Delivery confirmed by buyer".to_string()),
                location: None,
            });
            shipment.updated_at = now;
            ctx.storage.store_shipment(ctx.txn, &shipment)?;
        }

        // 5. Release the escrow: payout first, then flip the payment
        let payments = ctx.storage.list_payments_for_order_txn(ctx.txn, &order.id)?;
        if let Some(mut payment) = payments
            .into_iter()
            .find(|p| p.status == PaymentStatus::Captured)
        {
            let payout = Payout {
                id: uuid::Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                seller_id: order.seller_id.clone(),
                amount: order.total_amount - order.platform_fee - order.tax_amount,
                status: PayoutStatus::Pending,
                created_at: now,
            };
            ctx.storage.store_payout(ctx.txn, &payout)?;

            payment.status = PaymentStatus::Released;
            payment.released_at = Some(now);
            payment.updated_at = now;
            ctx.storage.store_payment(ctx.txn, &payment)?;
        }

        // 6. Notify both parties
        ctx.notify(Notification::new(
            &order.seller_id,
            "delivery_confirmed",
            "Delivery Confirmed",
            format!(
                "Order #{} has been delivered and confirmed by buyer.",
                order.id
            ),
            EntityKind::Order,
            &order.id,
        ));
        ctx.notify(Notification::new(
            &order.buyer_id,
            "order_completed",
            "Order Completed",
            format!(
                "Order #{} has been completed. You can now leave a review.",
                order.id
            ),
            EntityKind::Order,
            &order.id,
        ));

        // 7. Audit
        ctx.audit(AuditLog::new(
            EntityKind::Order,
            &order.id,
            LifecycleAction::DeliveryConfirmed,
            metadata.audit_actor(),
            serde_json::json!({ "confirmed_at": now }),
        ));

        // 8. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Order,
            &order.id,
            LifecycleAction::DeliveryConfirmed,
            &metadata.actor_id,
        ));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentUser;
    use crate::storage::MarketStorage;
    use rust_decimal::Decimal;
    use shared::UserRole;
    use shared::models::{Order, Payment, Shipment};
    use shared::types::Address;

    fn create_test_metadata(user_id: &str) -> CommandMetadata {
        let user = CurrentUser {
            id: user_id.to_string(),
            name: "Test User".to_string(),
            role: UserRole::Trader,
        };
        CommandMetadata::for_user(Some("cmd-1".to_string()), &user)
    }

    fn create_shipped_order(buyer_id: &str, seller_id: &str) -> Order {
        let now = Utc::now();
        Order {
            id: uuid::Uuid::new_v4().to_string(),
            listing_id: "listing-1".to_string(),
            buyer_id: buyer_id.to_string(),
            seller_id: seller_id.to_string(),
            offer_id: "offer-1".to_string(),
            quantity: Decimal::from(50),
            unit_price: Decimal::from(4500),
            subtotal: Decimal::from(225_000),
            platform_fee: Decimal::from(6750),
            tax_amount: Decimal::from(40_500),
            total_amount: Decimal::from(272_250),
            delivery_address: Address {
                name: None,
                phone: None,
                line1: "12 Mandi Road".to_string(),
                city: "Nashik".to_string(),
                state: "Maharashtra".to_string(),
                pincode: "422001".to_string(),
            },
            payment_due_date: now,
            status: OrderStatus::Shipped,
            cancellation_reason: None,
            cancelled_by: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn create_in_transit_shipment(order: &Order) -> Shipment {
        let now = Utc::now();
        Shipment {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            tracking_id: Some("AWB123".to_string()),
            carrier_name: Some("AgriTrans Express".to_string()),
            status: ShipmentStatus::InTransit,
            pickup_address: Some(order.delivery_address.clone()),
            delivery_address: Some(order.delivery_address.clone()),
            pickup_date: Some(now),
            delivery_date: None,
            tracking_events: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn create_captured_payment(order: &Order) -> Payment {
        let now = Utc::now();
        Payment {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            amount: order.total_amount,
            currency: "INR".to_string(),
            payment_method: "upi".to_string(),
            provider_payment_id: "pay_1".to_string(),
            provider_data: None,
            status: PaymentStatus::Captured,
            refund_amount: None,
            failure_reason: None,
            captured_at: Some(now),
            released_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_confirm_delivery_completes_order_and_releases_escrow() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_shipped_order("trader-1", "farmer-1");
        let shipment = create_in_transit_shipment(&order);
        let payment = create_captured_payment(&order);
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();
        storage.store_shipment(&txn, &shipment).unwrap();
        storage.store_payment(&txn, &payment).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = ConfirmDeliveryAction {
            order_id: order.id.clone(),
        };
        let metadata = create_test_metadata("trader-1");

        action.execute(&mut ctx, &metadata).unwrap();

        let effects = ctx.into_side_effects();
        txn.commit().unwrap();

        let stored_order = storage.get_order(&order.id).unwrap().unwrap();
        assert_eq!(stored_order.status, OrderStatus::Completed);

        let stored_shipment = storage.get_shipment(&order.id).unwrap().unwrap();
        assert_eq!(stored_shipment.status, ShipmentStatus::Delivered);
        assert!(stored_shipment.delivery_date.is_some());
        assert_eq!(stored_shipment.tracking_events.len(), 1);
        assert_eq!(
            stored_shipment.tracking_events[0].status,
            ShipmentStatus::Delivered
        );

        let payments = storage.list_payments_for_order(&order.id).unwrap();
        assert_eq!(payments[0].status, PaymentStatus::Released);
        assert!(payments[0].released_at.is_some());

        // Payout is the order total net of fee and tax
        let payouts = storage.list_payouts_for_seller("farmer-1").unwrap();
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].amount, Decimal::from(225_000));
        assert_eq!(payouts[0].status, PayoutStatus::Pending);

        assert_eq!(effects.notifications.len(), 2);
        assert_eq!(effects.notifications[0].user_id, "farmer-1");
        assert_eq!(effects.notifications[0].kind, "delivery_confirmed");
        assert_eq!(effects.notifications[1].user_id, "trader-1");
        assert_eq!(effects.notifications[1].kind, "order_completed");
        assert_eq!(effects.audits.len(), 1);
        assert_eq!(effects.audits[0].action, LifecycleAction::DeliveryConfirmed);
    }

    #[test]
    fn test_confirm_delivery_without_captured_payment_skips_payout() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_shipped_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = ConfirmDeliveryAction {
            order_id: order.id.clone(),
        };
        let metadata = create_test_metadata("trader-1");

        action.execute(&mut ctx, &metadata).unwrap();

        drop(ctx);
        txn.commit().unwrap();

        let stored_order = storage.get_order(&order.id).unwrap().unwrap();
        assert_eq!(stored_order.status, OrderStatus::Completed);
        assert!(storage.list_payouts_for_seller("farmer-1").unwrap().is_empty());
    }

    #[test]
    fn test_confirm_delivery_requires_shipped_status() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let mut order = create_shipped_order("trader-1", "farmer-1");
        order.status = OrderStatus::Confirmed;
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = ConfirmDeliveryAction {
            order_id: order.id.clone(),
        };
        let metadata = create_test_metadata("trader-1");

        let result = action.execute(&mut ctx, &metadata);
        match result {
            Err(LifecycleError::StateConflict(msg)) => {
                assert_eq!(msg, "Order must be shipped to confirm delivery");
            }
            other => panic!("Expected state conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_confirm_delivery_by_seller_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_shipped_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = ConfirmDeliveryAction {
            order_id: order.id.clone(),
        };
        let metadata = create_test_metadata("farmer-1");

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::Forbidden(_))));
    }

    #[test]
    fn test_confirm_delivery_on_missing_order_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let action = ConfirmDeliveryAction {
            order_id: "nonexistent".to_string(),
        };
        let metadata = create_test_metadata("trader-1");

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::NotFound(_))));
    }
}
