//! RemoveListing command handler
//!
//! Soft-removes a listing. The record stays for orders that reference it.

use chrono::Utc;

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{Listing, ListingStatus};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};

/// RemoveListing action
#[derive(Debug, Clone)]
pub struct RemoveListingAction {
    pub listing_id: String,
}

impl CommandHandler for RemoveListingAction {
    type Output = Listing;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Listing, LifecycleError> {
        // 1. Load the listing
        let mut listing = ctx.load_listing(&self.listing_id)?;

        // 2. Only the owner may remove
        if listing.seller_id != metadata.actor_id {
            return Err(LifecycleError::Forbidden("Not authorized".to_string()));
        }

        // 3. Already removed
        if listing.status == ListingStatus::Removed {
            return Err(LifecycleError::StateConflict(
                "Listing has been removed".to_string(),
            ));
        }

        // 4. Soft-remove
        listing.status = ListingStatus::Removed;
        listing.updated_at = Utc::now();
        ctx.storage.store_listing(ctx.txn, &listing)?;

        // 5. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Listing,
            &listing.id,
            LifecycleAction::Updated,
            &metadata.actor_id,
        ));

        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentUser;
    use crate::storage::MarketStorage;
    use rust_decimal::Decimal;
    use shared::UserRole;
    use shared::models::ListingCreate;
    use shared::types::Unit;

    fn create_test_metadata(user_id: &str) -> CommandMetadata {
        let user = CurrentUser {
            id: user_id.to_string(),
            name: "Ram Kumar".to_string(),
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

    #[test]
    fn test_remove_listing_sets_removed_status() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = RemoveListingAction {
            listing_id: listing.id.clone(),
        };
        let metadata = create_test_metadata("farmer-1");

        let removed = action.execute(&mut ctx, &metadata).unwrap();
        assert_eq!(removed.status, ListingStatus::Removed);

        let stored = storage.get_listing_txn(&txn, &listing.id).unwrap().unwrap();
        assert_eq!(stored.status, ListingStatus::Removed);
    }

    #[test]
    fn test_remove_listing_by_non_owner_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = RemoveListingAction {
            listing_id: listing.id.clone(),
        };
        let metadata = create_test_metadata("someone-else");

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::Forbidden(_))));
    }

    #[test]
    fn test_remove_listing_twice_fails() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();

        let listing = create_active_listing("farmer-1");
        storage.store_listing(&txn, &listing).unwrap();

        let mut ctx = CommandContext::new(&txn, &storage);
        let action = RemoveListingAction {
            listing_id: listing.id.clone(),
        };
        let metadata = create_test_metadata("farmer-1");

        action.execute(&mut ctx, &metadata).unwrap();
        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::StateConflict(_))));
    }
}
