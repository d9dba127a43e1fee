//! RejectOffer command handler
//!
//! The listing seller declines a pending offer.

use chrono::Utc;

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{AuditLog, Notification, Offer, OfferStatus};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};

/// RejectOffer action
#[derive(Debug, Clone)]
pub struct RejectOfferAction {
    pub offer_id: String,
}

impl CommandHandler for RejectOfferAction {
    type Output = Offer;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Offer, LifecycleError> {
        // 1. Load the offer; only pending offers can be rejected
        let mut offer = ctx.load_offer(&self.offer_id)?;
        if offer.status != OfferStatus::Pending {
            return Err(LifecycleError::StateConflict(
                "Offer is not pending".to_string(),
            ));
        }

        // 2. Only the listing seller may reject
        let listing = ctx.load_listing(&offer.listing_id)?;
        if listing.seller_id != metadata.actor_id {
            return Err(LifecycleError::Forbidden("Not authorized".to_string()));
        }

        // 3. Flip to rejected and drop from the expiry queue
        offer.status = OfferStatus::Rejected;
        offer.updated_at = Utc::now();
        ctx.storage.store_offer(ctx.txn, &offer)?;
        ctx.storage.clear_offer_expiry(ctx.txn, &offer)?;

        // 4. Notify the buyer
        ctx.notify(Notification::new(
            &offer.buyer_id,
            "offer_rejected",
            "Offer Declined",
            format!(
                "Your offer for {} has been declined by the seller.",
                listing.title
            ),
            EntityKind::Offer,
            &offer.id,
        ));

        // 5. Audit
        ctx.audit(AuditLog::new(
            EntityKind::Offer,
            &offer.id,
            LifecycleAction::OfferRejected,
            metadata.audit_actor(),
            serde_json::json!({ "listing_id": offer.listing_id }),
        ));

        // 6. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Offer,
            &offer.id,
            LifecycleAction::OfferRejected,
            &metadata.actor_id,
        ));

        Ok(offer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentUser;
    use crate::storage::MarketStorage;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use shared::UserRole;
    use shared::models::{Listing, ListingCreate, ListingStatus};
    use shared::types::Unit;

    fn create_test_metadata(user_id: &str) -> CommandMetadata {
        let user = CurrentUser {
            id: user_id.to_string(),
            name: "Test User".to_string(),
            role: UserRole::Farmer,
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

    fn create_pending_offer(listing: &Listing, buyer_id: &str) -> Offer {
        let now = Utc::now();
        Offer {
            id: uuid::Uuid::new_v4().to_string(),
            listing_id: listing.id.clone(),
            buyer_id: buyer_id.to_string(),
            thread_id: "thread-1".to_string(),
            quantity: Decimal::from(50),
            price_per_unit: Decimal::from(4500),
            total_amount: Decimal::from(225_000),
            delivery_terms: None,
            notes: None,
            expires_at: now + Duration::days(7),
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_reject_pending_offer_succeeds() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        let offer = create_pending_offer(&listing, "trader-1");
        storage.store_listing(&txn, &listing).unwrap();
        storage.store_offer(&txn, &offer).unwrap();
        storage.index_offer(&txn, &offer).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = RejectOfferAction {
            offer_id: offer.id.clone(),
        };
        let metadata = create_test_metadata("farmer-1");

        let rejected = action.execute(&mut ctx, &metadata).unwrap();
        assert_eq!(rejected.status, OfferStatus::Rejected);

        assert_eq!(ctx.notifications().len(), 1);
        assert_eq!(ctx.notifications()[0].user_id, "trader-1");
        assert_eq!(ctx.notifications()[0].kind, "offer_rejected");
        assert_eq!(ctx.audits()[0].action, LifecycleAction::OfferRejected);
    }

    #[test]
    fn test_reject_non_pending_offer_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        let mut offer = create_pending_offer(&listing, "trader-1");
        offer.status = OfferStatus::Accepted;
        storage.store_listing(&txn, &listing).unwrap();
        storage.store_offer(&txn, &offer).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = RejectOfferAction {
            offer_id: offer.id.clone(),
        };
        let metadata = create_test_metadata("farmer-1");

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::StateConflict(_))));
    }

    #[test]
    fn test_reject_by_non_seller_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        let offer = create_pending_offer(&listing, "trader-1");
        storage.store_listing(&txn, &listing).unwrap();
        storage.store_offer(&txn, &offer).unwrap();
        storage.index_offer(&txn, &offer).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = RejectOfferAction {
            offer_id: offer.id.clone(),
        };
        let metadata = create_test_metadata("trader-1");

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::Forbidden(_))));
    }
}
