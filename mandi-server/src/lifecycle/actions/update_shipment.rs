//! UpdateShipment command handler
//!
//! Carrier updates reported by the seller. The shipment record is
//! created lazily on the first update; subsequent updates merge only
//! the supplied fields and append to the tracking event log. Order
//! status is derived from the reported shipment status.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{
    AuditLog, Notification, OrderStatus, Shipment, ShipmentStatus, TrackingEvent,
};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_command_optional_text,
};

/// Carrier event details attached to an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEventInput {
    /// Falls back to the update's status, then the shipment's
    pub status: Option<ShipmentStatus>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// UpdateShipment action
#[derive(Debug, Clone)]
pub struct UpdateShipmentAction {
    pub order_id: String,
    pub tracking_id: Option<String>,
    pub carrier_name: Option<String>,
    pub status: Option<ShipmentStatus>,
    pub tracking_event: Option<TrackingEventInput>,
}

impl CommandHandler for UpdateShipmentAction {
    type Output = Shipment;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Shipment, LifecycleError> {
        // 1. Validate input
        validate_command_optional_text(&self.tracking_id, "tracking_id", MAX_SHORT_TEXT_LEN)?;
        validate_command_optional_text(&self.carrier_name, "carrier_name", MAX_SHORT_TEXT_LEN)?;
        if let Some(ref event) = self.tracking_event {
            validate_command_optional_text(&event.description, "description", MAX_NOTE_LEN)?;
            validate_command_optional_text(&event.location, "location", MAX_SHORT_TEXT_LEN)?;
        }

        // 2. Load the order; only the seller reports carrier updates
        let mut order = ctx.load_order(&self.order_id)?;
        if order.seller_id != metadata.actor_id {
            return Err(LifecycleError::Forbidden("Not authorized".to_string()));
        }

        // 3. Get or lazily create the shipment. Seller addresses are not
        //    modeled; the order's delivery address stands in for pickup.
        let now = Utc::now();
        let mut shipment = match ctx.storage.get_shipment_txn(ctx.txn, &order.id)? {
            Some(existing) => existing,
            None => Shipment {
                id: uuid::Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                tracking_id: None,
                carrier_name: None,
                status: ShipmentStatus::Pending,
                pickup_address: Some(order.delivery_address.clone()),
                delivery_address: Some(order.delivery_address.clone()),
                pickup_date: None,
                delivery_date: None,
                tracking_events: Vec::new(),
                created_at: now,
                updated_at: now,
            },
        };

        // 4. Merge only the supplied fields
        if let Some(ref tracking_id) = self.tracking_id {
            shipment.tracking_id = Some(tracking_id.clone());
        }
        if let Some(ref carrier_name) = self.carrier_name {
            shipment.carrier_name = Some(carrier_name.clone());
        }
        if let Some(status) = self.status {
            shipment.status = status;
            match status {
                ShipmentStatus::PickedUp => shipment.pickup_date = Some(now),
                ShipmentStatus::Delivered => shipment.delivery_date = Some(now),
                _ => {}
            }
        }

        // 5. Append the carrier event, if one was reported
        if let Some(ref event) = self.tracking_event {
            shipment.tracking_events.push(TrackingEvent {
                timestamp: now,
                status: event.status.or(self.status).unwrap_or(shipment.status),
                description: event.description.clone(),
                location: event.location.clone(),
            });
        }
        shipment.updated_at = now;
        ctx.storage.store_shipment(ctx.txn, &shipment)?;

        // 6. Derive order status from the reported shipment status
        if let Some(status) = self.status {
            let derived = match status {
                ShipmentStatus::PickedUp if order.status == OrderStatus::Confirmed => {
                    Some(OrderStatus::Processing)
                }
                ShipmentStatus::InTransit
                    if matches!(
                        order.status,
                        OrderStatus::Confirmed | OrderStatus::Processing
                    ) =>
                {
                    Some(OrderStatus::Shipped)
                }
                _ => None,
            };
            if let Some(new_status) = derived {
                order.status = new_status;
                order.updated_at = now;
                ctx.storage.store_order(ctx.txn, &order)?;
            }
        }

        // 7. Notify the buyer of forward progress
        match self.status {
            Some(ShipmentStatus::PickedUp) => {
                ctx.notify(Notification::new(
                    &order.buyer_id,
                    "shipment_picked_up",
                    "Order Picked Up",
                    format!(
                        "Your order #{} has been picked up and is on its way.",
                        order.id
                    ),
                    EntityKind::Order,
                    &order.id,
                ));
            }
            Some(ShipmentStatus::InTransit) => {
                let message = match self.tracking_id {
                    Some(ref tracking_id) => format!(
                        "Your order #{} is in transit. Tracking ID: {tracking_id}",
                        order.id
                    ),
                    None => format!("Your order #{} is in transit.", order.id),
                };
                ctx.notify(Notification::new(
                    &order.buyer_id,
                    "shipment_in_transit",
                    "Order In Transit",
                    message,
                    EntityKind::Order,
                    &order.id,
                ));
            }
            Some(ShipmentStatus::OutForDelivery) => {
                ctx.notify(Notification::new(
                    &order.buyer_id,
                    "shipment_out_for_delivery",
                    "Out for Delivery",
                    format!(
                        "Your order #{} is out for delivery and will arrive soon.",
                        order.id
                    ),
                    EntityKind::Order,
                    &order.id,
                ));
            }
            _ => {}
        }

        // 8. Audit
        ctx.audit(AuditLog::new(
            EntityKind::Shipment,
            &shipment.id,
            LifecycleAction::Updated,
            metadata.audit_actor(),
            serde_json::json!({
                "order_id": order.id,
                "status": self.status,
                "tracking_id": self.tracking_id,
            }),
        ));

        // 9. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Shipment,
            &shipment.id,
            LifecycleAction::Updated,
            &metadata.actor_id,
        ));

        Ok(shipment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentUser;
    use crate::storage::MarketStorage;
    use rust_decimal::Decimal;
    use shared::UserRole;
    use shared::models::Order;
    use shared::types::Address;

    fn create_test_metadata(user_id: &str) -> CommandMetadata {
        let user = CurrentUser {
            id: user_id.to_string(),
            name: "Test User".to_string(),
            role: UserRole::Farmer,
        };
        CommandMetadata::for_user(Some("cmd-1".to_string()), &user)
    }

    fn create_confirmed_order(buyer_id: &str, seller_id: &str) -> Order {
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
            status: OrderStatus::Confirmed,
            cancellation_reason: None,
            cancelled_by: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn empty_update(order_id: &str) -> UpdateShipmentAction {
        UpdateShipmentAction {
            order_id: order_id.to_string(),
            tracking_id: None,
            carrier_name: None,
            status: None,
            tracking_event: None,
        }
    }

    #[test]
    fn test_first_update_creates_shipment_and_derives_processing() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_confirmed_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let mut action = empty_update(&order.id);
        action.status = Some(ShipmentStatus::PickedUp);
        let metadata = create_test_metadata("farmer-1");

        let shipment = action.execute(&mut ctx, &metadata).unwrap();

        assert_eq!(shipment.status, ShipmentStatus::PickedUp);
        assert!(shipment.pickup_date.is_some());
        assert_eq!(shipment.pickup_address, Some(order.delivery_address.clone()));
        assert_eq!(shipment.delivery_address, Some(order.delivery_address.clone()));

        let stored_order = storage.get_order_txn(&txn, &order.id).unwrap().unwrap();
        assert_eq!(stored_order.status, OrderStatus::Processing);

        assert_eq!(ctx.notifications().len(), 1);
        assert_eq!(ctx.notifications()[0].user_id, "trader-1");
        assert_eq!(ctx.notifications()[0].title, "Order Picked Up");
        assert_eq!(ctx.audits().len(), 1);
        assert_eq!(ctx.audits()[0].entity_type, EntityKind::Shipment);
    }

    #[test]
    fn test_in_transit_moves_order_to_shipped() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_confirmed_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let mut action = empty_update(&order.id);
        action.status = Some(ShipmentStatus::InTransit);
        action.tracking_id = Some("AWB123".to_string());
        let metadata = create_test_metadata("farmer-1");

        action.execute(&mut ctx, &metadata).unwrap();

        let stored_order = storage.get_order_txn(&txn, &order.id).unwrap().unwrap();
        assert_eq!(stored_order.status, OrderStatus::Shipped);

        assert_eq!(ctx.notifications()[0].kind, "shipment_in_transit");
        assert!(
            ctx.notifications()[0]
                .message
                .ends_with("Tracking ID: AWB123")
        );
    }

    #[test]
    fn test_in_transit_message_without_tracking_id() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_confirmed_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let mut action = empty_update(&order.id);
        action.status = Some(ShipmentStatus::InTransit);
        let metadata = create_test_metadata("farmer-1");

        action.execute(&mut ctx, &metadata).unwrap();
        assert!(ctx.notifications()[0].message.ends_with("is in transit."));
    }

    #[test]
    fn test_tracking_event_appended_with_fallback_status() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_confirmed_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let mut action = empty_update(&order.id);
        action.status = Some(ShipmentStatus::InTransit);
        action.tracking_event = Some(TrackingEventInput {
            status: None,
            description: Some("Left Nashik hub".to_string()),
            location: Some("Nashik".to_string()),
        });
        let metadata = create_test_metadata("farmer-1");

        let shipment = action.execute(&mut ctx, &metadata).unwrap();
        assert_eq!(shipment.tracking_events.len(), 1);
        let event = &shipment.tracking_events[0];
        assert_eq!(event.status, ShipmentStatus::InTransit);
        assert_eq!(event.description.as_deref(), Some("Left Nashik hub"));
        assert_eq!(event.location.as_deref(), Some("Nashik"));
    }

    #[test]
    fn test_events_accumulate_across_updates() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_confirmed_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let metadata = create_test_metadata("farmer-1");

        for status in [ShipmentStatus::PickedUp, ShipmentStatus::InTransit] {
            let mut action = empty_update(&order.id);
            action.status = Some(status);
            action.tracking_event = Some(TrackingEventInput {
                status: None,
                description: None,
                location: None,
            });
            action.execute(&mut ctx, &metadata).unwrap();
        }

        let shipment = storage.get_shipment_txn(&txn, &order.id).unwrap().unwrap();
        assert_eq!(shipment.tracking_events.len(), 2);
        assert_eq!(shipment.tracking_events[0].status, ShipmentStatus::PickedUp);
        assert_eq!(shipment.tracking_events[1].status, ShipmentStatus::InTransit);
    }

    #[test]
    fn test_carrier_only_update_leaves_status_and_order_alone() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_confirmed_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let mut action = empty_update(&order.id);
        action.carrier_name = Some("AgriTrans Express".to_string());
        let metadata = create_test_metadata("farmer-1");

        let shipment = action.execute(&mut ctx, &metadata).unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Pending);
        assert_eq!(shipment.carrier_name.as_deref(), Some("AgriTrans Express"));

        let stored_order = storage.get_order_txn(&txn, &order.id).unwrap().unwrap();
        assert_eq!(stored_order.status, OrderStatus::Confirmed);
        assert!(ctx.notifications().is_empty());
        // Audit still records the touch
        assert_eq!(ctx.audits().len(), 1);
    }

    #[test]
    fn test_update_by_non_seller_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_confirmed_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = empty_update(&order.id);
        let metadata = create_test_metadata("trader-1");

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::Forbidden(_))));
    }

    #[test]
    fn test_update_on_missing_order_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let action = empty_update("nonexistent");
        let metadata = create_test_metadata("farmer-1");

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::NotFound(_))));
    }
}
