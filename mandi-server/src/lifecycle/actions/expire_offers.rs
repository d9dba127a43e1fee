//! ExpireOffers command handler
//!
//! Scheduled sweep: marks pending offers past their expiry as expired.
//! Runs with system metadata; one transaction covers the whole batch.

use chrono::{DateTime, Utc};

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{AuditLog, Notification, OfferStatus};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};

/// ExpireOffers action
#[derive(Debug, Clone)]
pub struct ExpireOffersAction {
    /// Sweep cutoff; offers with `expires_at <= now` expire
    pub now: DateTime<Utc>,
}

impl CommandHandler for ExpireOffersAction {
    type Output = usize;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<usize, LifecycleError> {
        // 1. Collect pending offers past their expiry
        let expired = ctx
            .storage
            .expired_pending_offers_txn(ctx.txn, self.now.timestamp_millis())?;

        // 2. Flip each to expired and queue the buyer notification
        for mut offer in expired.iter().cloned() {
            offer.status = OfferStatus::Expired;
            offer.updated_at = self.now;
            ctx.storage.store_offer(ctx.txn, &offer)?;
            ctx.storage.clear_offer_expiry(ctx.txn, &offer)?;

            let message = match ctx.storage.get_listing_txn(ctx.txn, &offer.listing_id)? {
                Some(listing) => format!("Your offer for {} has expired.", listing.title),
                None => "Your offer has expired.".to_string(),
            };
            ctx.notify(Notification::new(
                &offer.buyer_id,
                "offer_expired",
                "Offer Expired",
                message,
                EntityKind::Offer,
                &offer.id,
            ));

            ctx.audit(AuditLog::new(
                EntityKind::Offer,
                &offer.id,
                LifecycleAction::OfferExpired,
                metadata.audit_actor(),
                serde_json::json!({ "expired_at": offer.expires_at }),
            ));

            ctx.emit(LifecycleEvent::new(
                EntityKind::Offer,
                &offer.id,
                LifecycleAction::OfferExpired,
                &metadata.actor_id,
            ));
        }

        Ok(expired.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MarketStorage;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use shared::models::{Listing, ListingCreate, ListingStatus, Offer};
    use shared::types::Unit;

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

    fn create_offer_expiring_at(listing: &Listing, buyer_id: &str, expires_at: DateTime<Utc>) -> Offer {
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
            expires_at,
            status: OfferStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_expire_offers_marks_only_past_pending() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let now = Utc::now();
        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let stale = create_offer_expiring_at(&listing, "trader-1", now - Duration::hours(1));
        let fresh = create_offer_expiring_at(&listing, "trader-2", now + Duration::days(1));
        for offer in [&stale, &fresh] {
            storage.store_offer(&txn, offer).unwrap();
            storage.index_offer(&txn, offer).unwrap();
        }

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = ExpireOffersAction { now };
        let metadata = CommandMetadata::system();

        let count = action.execute(&mut ctx, &metadata).unwrap();
        assert_eq!(count, 1);

        let stale_after = storage.get_offer_txn(&txn, &stale.id).unwrap().unwrap();
        assert_eq!(stale_after.status, OfferStatus::Expired);
        let fresh_after = storage.get_offer_txn(&txn, &fresh.id).unwrap().unwrap();
        assert_eq!(fresh_after.status, OfferStatus::Pending);

        // Buyer of the stale offer notified, audit row has no actor
        assert_eq!(ctx.notifications().len(), 1);
        assert_eq!(ctx.notifications()[0].user_id, "trader-1");
        assert_eq!(ctx.notifications()[0].kind, "offer_expired");
        assert_eq!(
            ctx.notifications()[0].message,
            "Your offer for Basmati Rice has expired."
        );
        assert_eq!(ctx.audits().len(), 1);
        assert_eq!(ctx.audits()[0].actor_user_id, None);
        assert_eq!(ctx.events()[0].actor_id, "system");
    }

    #[test]
    fn test_expire_offers_empty_sweep_is_noop() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let action = ExpireOffersAction { now: Utc::now() };
        let metadata = CommandMetadata::system();

        let count = action.execute(&mut ctx, &metadata).unwrap();
        assert_eq!(count, 0);
        assert!(ctx.notifications().is_empty());
        assert!(ctx.events().is_empty());
    }

    #[test]
    fn test_expire_offers_second_sweep_skips_already_expired() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let now = Utc::now();
        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let offer = create_offer_expiring_at(&listing, "trader-1", now - Duration::hours(1));
        storage.store_offer(&txn, &offer).unwrap();
        storage.index_offer(&txn, &offer).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let metadata = CommandMetadata::system();

        let first = ExpireOffersAction { now }.execute(&mut ctx, &metadata).unwrap();
        let second = ExpireOffersAction { now }.execute(&mut ctx, &metadata).unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 0);
    }
}
