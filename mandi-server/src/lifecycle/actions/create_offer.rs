//! CreateOffer command handler
//!
//! A trader proposes quantity and price against an active listing. The
//! offer rides on a conversation thread between buyer and seller, which
//! is created here if the pair has none for this listing.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shared::UserRole;
use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{Listing, ListingStatus, Message, Notification, Offer, OfferStatus, Thread};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::pricing::round_money;
use crate::utils::validation::{
    MAX_NOTE_LEN, MAX_TEXT_LEN, validate_command_optional_text, validate_positive_amount,
};

/// Default offer validity window in days.
const DEFAULT_EXPIRES_IN_DAYS: i64 = 7;

/// CreateOffer response payload: the offer plus the thread it rides on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferWithThread {
    pub offer: Offer,
    pub thread: Thread,
}

/// CreateOffer action
#[derive(Debug, Clone)]
pub struct CreateOfferAction {
    pub listing_id: String,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
    pub delivery_terms: Option<String>,
    pub notes: Option<String>,
    pub expires_in_days: Option<i64>,
}

impl CommandHandler for CreateOfferAction {
    type Output = OfferWithThread;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<OfferWithThread, LifecycleError> {
        // 1. Only traders can make offers
        metadata.require_role(UserRole::Trader, "Only traders can create offers")?;

        // 2. Validate input fields
        validate_positive_amount(self.quantity, "quantity")?;
        validate_positive_amount(self.price_per_unit, "price_per_unit")?;
        validate_command_optional_text(&self.delivery_terms, "delivery_terms", MAX_NOTE_LEN)?;
        validate_command_optional_text(&self.notes, "notes", MAX_TEXT_LEN)?;
        if let Some(days) = self.expires_in_days
            && days <= 0
        {
            return Err(LifecycleError::Validation(
                "expires_in_days must be positive".to_string(),
            ));
        }

        // 3. Listing must exist and be active
        let listing = ctx.load_listing(&self.listing_id)?;
        if listing.status != ListingStatus::Active {
            return Err(LifecycleError::StateConflict(
                "Listing is not active".to_string(),
            ));
        }

        // 4. Quantity bounds against the listing
        if self.quantity > listing.quantity_available {
            return Err(LifecycleError::Validation(
                "Requested quantity exceeds available stock".to_string(),
            ));
        }
        if self.quantity < listing.min_order_quantity {
            return Err(LifecycleError::Validation(format!(
                "Minimum order quantity is {} {}",
                listing.min_order_quantity, listing.unit
            )));
        }

        // 5. Sellers cannot bid up their own produce
        if listing.seller_id == metadata.actor_id {
            return Err(LifecycleError::Validation(
                "Cannot make offer on your own listing".to_string(),
            ));
        }

        // 6. Find or create the buyer/seller thread for this listing
        let thread = self.ensure_thread(ctx, &metadata.actor_id, &listing)?;

        // 7. Create the offer
        let now = Utc::now();
        let total_amount = round_money(self.quantity * self.price_per_unit);
        let expires_in_days = self.expires_in_days.unwrap_or(DEFAULT_EXPIRES_IN_DAYS);
        let offer = Offer {
            id: uuid::Uuid::new_v4().to_string(),
            listing_id: listing.id.clone(),
            buyer_id: metadata.actor_id.clone(),
            thread_id: thread.id.clone(),
            quantity: self.quantity,
            price_per_unit: self.price_per_unit,
            total_amount,
            delivery_terms: self.delivery_terms.clone(),
            notes: self.notes.clone(),
            expires_at: now + Duration::days(expires_in_days),
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        ctx.storage.store_offer(ctx.txn, &offer)?;
        ctx.storage.index_offer(ctx.txn, &offer)?;

        // 8. Append the offer summary to the thread
        let mut message_text = format!(
            "New offer: {} {} at ₹{}/{}. Total: ₹{}",
            offer.quantity, listing.unit, offer.price_per_unit, listing.unit, offer.total_amount
        );
        if let Some(ref notes) = offer.notes {
            message_text.push_str(&format!("\n\nNotes: {notes}"));
        }
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            thread_id: thread.id.clone(),
            from_user_id: metadata.actor_id.clone(),
            message_text,
            attachments: vec![],
            is_read: false,
            created_at: now,
        };
        ctx.storage.store_message(ctx.txn, &message)?;

        // 9. Notify the seller
        ctx.notify(Notification::new(
            &listing.seller_id,
            "offer_received",
            "New Offer Received",
            format!(
                "You received an offer of ₹{}/{} for {} {} of {}",
                offer.price_per_unit, listing.unit, offer.quantity, listing.unit, listing.title
            ),
            EntityKind::Offer,
            &offer.id,
        ));

        // 10. Audit with the full offer as the new value
        ctx.audit(shared::models::AuditLog::new(
            EntityKind::Offer,
            &offer.id,
            LifecycleAction::OfferCreated,
            metadata.audit_actor(),
            serde_json::to_value(&offer)
                .map_err(|e| LifecycleError::Internal(e.to_string()))?,
        ));

        // 11. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Offer,
            &offer.id,
            LifecycleAction::OfferCreated,
            &metadata.actor_id,
        ));

        Ok(OfferWithThread { offer, thread })
    }
}

impl CreateOfferAction {
    /// Threads are deduplicated per (buyer, seller, listing) triple.
    fn ensure_thread(
        &self,
        ctx: &mut CommandContext<'_>,
        buyer_id: &str,
        listing: &Listing,
    ) -> Result<Thread, LifecycleError> {
        if let Some(thread) =
            ctx.storage
                .find_thread_txn(ctx.txn, buyer_id, &listing.seller_id, Some(&listing.id))?
        {
            return Ok(thread);
        }

        let now = Utc::now();
        let thread = Thread {
            id: uuid::Uuid::new_v4().to_string(),
            buyer_id: buyer_id.to_string(),
            seller_id: listing.seller_id.clone(),
            listing_id: Some(listing.id.clone()),
            subject: Some(format!("Offer for {}", listing.title)),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        ctx.storage.store_thread(ctx.txn, &thread)?;
        ctx.storage.index_thread(ctx.txn, &thread)?;
        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentUser;
    use crate::storage::MarketStorage;
    use shared::models::ListingCreate;
    use shared::types::Unit;

    fn create_test_metadata(user_id: &str, role: UserRole) -> CommandMetadata {
        let user = CurrentUser {
            id: user_id.to_string(),
            name: "Test User".to_string(),
            role,
        };
        CommandMetadata::for_user(Some("cmd-1".to_string()), &user)
    }

    fn create_active_listing(seller_id: &str) -> Listing {
        Listing::new(
            seller_id,
            ListingCreate {
                category: "grains".to_string(),
                title: "Basmati Rice".to_string(),
                description: None,
                grade: None,
                variety: None,
                harvest_date: None,
                moisture_percentage: None,
                is_organic: false,
                quantity_available: Decimal::from(500),
                unit: Unit::Quintal,
                min_order_quantity: Decimal::from(10),
                price_per_unit: Decimal::from(4500),
                pricing_type: Default::default(),
                status: Some(ListingStatus::Active),
                state: None,
                district: None,
                pincode: None,
                latitude: None,
                longitude: None,
                images: vec![],
            },
        )
    }

    fn create_offer_action(listing_id: &str) -> CreateOfferAction {
        CreateOfferAction {
            listing_id: listing_id.to_string(),
            quantity: Decimal::from(50),
            price_per_unit: Decimal::from(4500),
            delivery_terms: None,
            notes: None,
            expires_in_days: None,
        }
    }

    #[test]
    fn test_create_offer_creates_offer_thread_and_message() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = create_offer_action(&listing.id);
        let metadata = create_test_metadata("trader-1", UserRole::Trader);

        let result = action.execute(&mut ctx, &metadata).unwrap();

        assert_eq!(result.offer.status, OfferStatus::Pending);
        assert_eq!(result.offer.total_amount, Decimal::from(225_000));
        assert_eq!(result.offer.thread_id, result.thread.id);
        assert_eq!(result.thread.subject.as_deref(), Some("Offer for Basmati Rice"));

        // Offer persisted and indexed
        let stored = storage.get_offer_txn(&txn, &result.offer.id).unwrap();
        assert!(stored.is_some());

        // Seller was notified
        assert_eq!(ctx.notifications().len(), 1);
        let notification = &ctx.notifications()[0];
        assert_eq!(notification.user_id, "farmer-1");
        assert_eq!(notification.kind, "offer_received");
        assert_eq!(notification.title, "New Offer Received");

        // Audit entry carries the offer as new value
        assert_eq!(ctx.audits().len(), 1);
        assert_eq!(ctx.audits()[0].action, LifecycleAction::OfferCreated);
        assert_eq!(ctx.audits()[0].actor_user_id.as_deref(), Some("trader-1"));
    }

    #[test]
    fn test_create_offer_reuses_existing_thread() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let metadata = create_test_metadata("trader-1", UserRole::Trader);

        let first = create_offer_action(&listing.id)
            .execute(&mut ctx, &metadata)
            .unwrap();
        let second = create_offer_action(&listing.id)
            .execute(&mut ctx, &metadata)
            .unwrap();

        assert_eq!(first.thread.id, second.thread.id);
        assert_ne!(first.offer.id, second.offer.id);
    }

    #[test]
    fn test_create_offer_includes_notes_in_message() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let mut action = create_offer_action(&listing.id);
        action.notes = Some("Need jute bags".to_string());
        let metadata = create_test_metadata("trader-1", UserRole::Trader);

        let result = action.execute(&mut ctx, &metadata).unwrap();
        assert_eq!(result.offer.notes.as_deref(), Some("Need jute bags"));
    }

    #[test]
    fn test_create_offer_rejects_farmer_role() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = create_offer_action(&listing.id);
        let metadata = create_test_metadata("farmer-2", UserRole::Farmer);

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::Forbidden(_))));
    }

    #[test]
    fn test_create_offer_on_missing_listing_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let action = create_offer_action("nonexistent");
        let metadata = create_test_metadata("trader-1", UserRole::Trader);

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::NotFound(_))));
    }

    #[test]
    fn test_create_offer_on_inactive_listing_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let mut listing = create_active_listing("farmer-1");
        listing.status = ListingStatus::Sold;
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = create_offer_action(&listing.id);
        let metadata = create_test_metadata("trader-1", UserRole::Trader);

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::StateConflict(_))));
    }

    #[test]
    fn test_create_offer_exceeding_stock_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let mut action = create_offer_action(&listing.id);
        action.quantity = Decimal::from(501);
        let metadata = create_test_metadata("trader-1", UserRole::Trader);

        let result = action.execute(&mut ctx, &metadata);
        match result {
            Err(LifecycleError::Validation(msg)) => {
                assert_eq!(msg, "Requested quantity exceeds available stock");
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_offer_below_minimum_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let mut action = create_offer_action(&listing.id);
        action.quantity = Decimal::from(5);
        let metadata = create_test_metadata("trader-1", UserRole::Trader);

        let result = action.execute(&mut ctx, &metadata);
        match result {
            Err(LifecycleError::Validation(msg)) => {
                assert_eq!(msg, "Minimum order quantity is 10 quintal");
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_offer_on_own_listing_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("trader-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = create_offer_action(&listing.id);
        let metadata = create_test_metadata("trader-1", UserRole::Trader);

        let result = action.execute(&mut ctx, &metadata);
        match result {
            Err(LifecycleError::Validation(msg)) => {
                assert_eq!(msg, "Cannot make offer on your own listing");
            }
            other => panic!("Expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_offer_default_expiry_is_seven_days() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = create_offer_action(&listing.id);
        let metadata = create_test_metadata("trader-1", UserRole::Trader);

        let before = Utc::now() + Duration::days(7) - Duration::seconds(5);
        let result = action.execute(&mut ctx, &metadata).unwrap();
        let after = Utc::now() + Duration::days(7) + Duration::seconds(5);

        assert!(result.offer.expires_at > before && result.offer.expires_at < after);
    }
}
