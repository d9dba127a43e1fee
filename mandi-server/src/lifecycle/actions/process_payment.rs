//! ProcessPayment command handler
//!
//! The buyer pays a pending order into escrow. The provider capture is
//! simulated: the caller pre-rolls the outcome so the handler itself is
//! deterministic. A declined capture persists a failed Payment and
//! leaves the order pending, so the buyer can retry.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{AuditLog, Notification, OrderStatus, Payment, PaymentStatus};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_command_text};

/// ProcessPayment response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// False when the simulated provider declined the capture
    pub captured: bool,
    pub payment: Payment,
}

/// ProcessPayment action
#[derive(Debug, Clone)]
pub struct ProcessPaymentAction {
    pub order_id: String,
    pub payment_method: String,
    pub provider_data: Option<serde_json::Value>,
    /// Pre-rolled provider outcome (rolled before the transaction opens)
    pub simulate_failure: bool,
}

impl CommandHandler for ProcessPaymentAction {
    type Output = PaymentOutcome;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<PaymentOutcome, LifecycleError> {
        // 1. Validate input
        validate_command_text(&self.payment_method, "payment_method", MAX_SHORT_TEXT_LEN)?;

        // 2. Load the order; only the buyer pays
        let mut order = ctx.load_order(&self.order_id)?;
        if order.buyer_id != metadata.actor_id {
            return Err(LifecycleError::Forbidden("Not authorized".to_string()));
        }

        // 3. Only pending orders accept payment
        if order.status != OrderStatus::Pending {
            return Err(LifecycleError::StateConflict(
                "Order is not pending payment".to_string(),
            ));
        }

        // 4. Record the escrow payment with the simulated provider outcome
        let now = Utc::now();
        let captured = !self.simulate_failure;
        let payment = Payment {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            amount: order.total_amount,
            currency: "INR".to_string(),
            payment_method: self.payment_method.clone(),
            provider_payment_id: format!("pay_{}", now.timestamp_millis()),
            provider_data: self.provider_data.clone(),
            status: if captured {
                PaymentStatus::Captured
            } else {
                PaymentStatus::Failed
            },
            refund_amount: None,
            failure_reason: if captured {
                None
            } else {
                Some("Payment processing failed".to_string())
            },
            captured_at: captured.then_some(now),
            released_at: None,
            created_at: now,
            updated_at: now,
        };
        ctx.storage.store_payment(ctx.txn, &payment)?;

        if captured {
            // 5. Money is in escrow; the order moves to confirmed
            order.status = OrderStatus::Confirmed;
            order.updated_at = now;
            ctx.storage.store_order(ctx.txn, &order)?;

            // 6. Notify both parties
            ctx.notify(Notification::new(
                &order.seller_id,
                "payment_received",
                "Payment Received",
                format!(
                    "Payment received for order #{}. Please prepare for shipment.",
                    order.id
                ),
                EntityKind::Order,
                &order.id,
            ));
            ctx.notify(Notification::new(
                &order.buyer_id,
                "payment_confirmed",
                "Payment Confirmed",
                format!("Your payment for order #{} has been confirmed.", order.id),
                EntityKind::Order,
                &order.id,
            ));

            // 7. Audit the capture
            ctx.audit(AuditLog::new(
                EntityKind::Payment,
                &payment.id,
                LifecycleAction::Captured,
                metadata.audit_actor(),
                serde_json::json!({
                    "order_id": order.id,
                    "amount": payment.amount,
                    "payment_method": payment.payment_method,
                }),
            ));

            // 8. Create event
            ctx.emit(LifecycleEvent::new(
                EntityKind::Payment,
                &payment.id,
                LifecycleAction::Captured,
                &metadata.actor_id,
            ));
        } else {
            // 5. Declined: the order stays pending and retryable
            ctx.notify(Notification::new(
                &order.buyer_id,
                "payment_failed",
                "Payment Failed",
                format!("Payment for order #{} failed. Please try again.", order.id),
                EntityKind::Order,
                &order.id,
            ));
        }

        Ok(PaymentOutcome { captured, payment })
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
            role: UserRole::Trader,
        };
        CommandMetadata::for_user(Some("cmd-1".to_string()), &user)
    }

    fn create_pending_order(buyer_id: &str, seller_id: &str) -> Order {
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
            status: OrderStatus::Pending,
            cancellation_reason: None,
            cancelled_by: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn create_payment_action(order_id: &str, simulate_failure: bool) -> ProcessPaymentAction {
        ProcessPaymentAction {
            order_id: order_id.to_string(),
            payment_method: "upi".to_string(),
            provider_data: None,
            simulate_failure,
        }
    }

    #[test]
    fn test_captured_payment_confirms_order() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_pending_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = create_payment_action(&order.id, false);
        let metadata = create_test_metadata("trader-1");

        let outcome = action.execute(&mut ctx, &metadata).unwrap();

        assert!(outcome.captured);
        assert_eq!(outcome.payment.status, PaymentStatus::Captured);
        assert_eq!(outcome.payment.amount, Decimal::from(272_250));
        assert_eq!(outcome.payment.currency, "INR");
        assert!(outcome.payment.provider_payment_id.starts_with("pay_"));
        assert!(outcome.payment.captured_at.is_some());

        let stored_order = storage.get_order_txn(&txn, &order.id).unwrap().unwrap();
        assert_eq!(stored_order.status, OrderStatus::Confirmed);

        // Seller then buyer notified
        assert_eq!(ctx.notifications().len(), 2);
        assert_eq!(ctx.notifications()[0].user_id, "farmer-1");
        assert_eq!(ctx.notifications()[0].kind, "payment_received");
        assert_eq!(ctx.notifications()[1].user_id, "trader-1");
        assert_eq!(ctx.notifications()[1].kind, "payment_confirmed");

        assert_eq!(ctx.audits().len(), 1);
        assert_eq!(ctx.audits()[0].action, LifecycleAction::Captured);
        assert_eq!(ctx.audits()[0].entity_type, EntityKind::Payment);
    }

    #[test]
    fn test_failed_payment_keeps_order_pending() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_pending_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = create_payment_action(&order.id, true);
        let metadata = create_test_metadata("trader-1");

        let outcome = action.execute(&mut ctx, &metadata).unwrap();

        assert!(!outcome.captured);
        assert_eq!(outcome.payment.status, PaymentStatus::Failed);
        assert!(outcome.payment.captured_at.is_none());

        // Order untouched, failed payment still on record
        let stored_order = storage.get_order_txn(&txn, &order.id).unwrap().unwrap();
        assert_eq!(stored_order.status, OrderStatus::Pending);
        let payments = storage.list_payments_for_order_txn(&txn, &order.id).unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Failed);

        // Buyer only, no audit, no event
        assert_eq!(ctx.notifications().len(), 1);
        assert_eq!(ctx.notifications()[0].user_id, "trader-1");
        assert_eq!(ctx.notifications()[0].kind, "payment_failed");
        assert!(ctx.audits().is_empty());
        assert!(ctx.events().is_empty());
    }

    #[test]
    fn test_retry_after_failure_succeeds() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_pending_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let metadata = create_test_metadata("trader-1");

        let failed = create_payment_action(&order.id, true)
            .execute(&mut ctx, &metadata)
            .unwrap();
        assert!(!failed.captured);

        let retried = create_payment_action(&order.id, false)
            .execute(&mut ctx, &metadata)
            .unwrap();
        assert!(retried.captured);

        let payments = storage.list_payments_for_order_txn(&txn, &order.id).unwrap();
        assert_eq!(payments.len(), 2);
    }

    #[test]
    fn test_payment_by_non_buyer_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let order = create_pending_order("trader-1", "farmer-1");
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = create_payment_action(&order.id, false);
        let metadata = create_test_metadata("farmer-1");

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::Forbidden(_))));
    }

    #[test]
    fn test_payment_on_confirmed_order_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let mut order = create_pending_order("trader-1", "farmer-1");
        order.status = OrderStatus::Confirmed;
        storage.store_order(&txn, &order).unwrap();
        storage.index_order(&txn, &order).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = create_payment_action(&order.id, false);
        let metadata = create_test_metadata("trader-1");

        let result = action.execute(&mut ctx, &metadata);
        match result {
            Err(LifecycleError::StateConflict(msg)) => {
                assert_eq!(msg, "Order is not pending payment");
            }
            other => panic!("Expected state conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_payment_on_missing_order_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let action = create_payment_action("nonexistent", false);
        let metadata = create_test_metadata("trader-1");

        let result = action.execute(&mut ctx, &metadata);
        match result {
            Err(LifecycleError::NotFound(msg)) => assert_eq!(msg, "Order not found"),
            other => panic!("Expected not found, got {other:?}"),
        }
    }
}
