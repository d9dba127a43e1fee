//! CreateListing command handler
//!
//! Creates a produce listing owned by the acting farmer.

use shared::UserRole;
use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{Listing, ListingCreate, ListingStatus};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::utils::validation::{
    MAX_SHORT_TEXT_LEN, MAX_TEXT_LEN, MAX_TITLE_LEN, validate_command_optional_text,
    validate_command_text, validate_positive_amount,
};

/// CreateListing action
#[derive(Debug, Clone)]
pub struct CreateListingAction {
    pub data: ListingCreate,
}

impl CommandHandler for CreateListingAction {
    type Output = Listing;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Listing, LifecycleError> {
        // 1. Only farmers can list produce
        metadata.require_role(UserRole::Farmer, "Only farmers can create listings")?;

        // 2. Validate text fields and amounts
        validate_command_text(&self.data.title, "title", MAX_TITLE_LEN)?;
        validate_command_text(&self.data.category, "category", MAX_SHORT_TEXT_LEN)?;
        validate_command_optional_text(&self.data.description, "description", MAX_TEXT_LEN)?;
        validate_positive_amount(self.data.quantity_available, "quantity_available")?;
        validate_positive_amount(self.data.min_order_quantity, "min_order_quantity")?;
        validate_positive_amount(self.data.price_per_unit, "price_per_unit")?;

        // 3. New listings start as draft or active only
        if let Some(status) = self.data.status
            && !matches!(status, ListingStatus::Draft | ListingStatus::Active)
        {
            return Err(LifecycleError::Validation(
                "New listings must start as draft or active".to_string(),
            ));
        }

        // 4. Persist
        let listing = Listing::new(&metadata.actor_id, self.data.clone());
        ctx.storage.store_listing(ctx.txn, &listing)?;

        // 5. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Listing,
            &listing.id,
            LifecycleAction::Created,
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
    use shared::types::Unit;

    fn create_test_metadata(role: UserRole) -> CommandMetadata {
        let user = CurrentUser {
            id: "farmer-1".to_string(),
            name: "Ram Kumar".to_string(),
            role,
        };
        CommandMetadata::for_user(Some("cmd-1".to_string()), &user)
    }

    fn create_listing_data() -> ListingCreate {
        ListingCreate {
            category: "grains".to_string(),
            title: "Basmati Rice".to_string(),
            description: Some("Long grain, aged 12 months".to_string()),
            grade: Some("A".to_string()),
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
            state: Some("Punjab".to_string()),
            district: None,
            pincode: None,
            latitude: None,
            longitude: None,
            images: vec![],
        }
    }

    #[test]
    fn test_create_listing_persists_and_emits_event() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let action = CreateListingAction {
            data: create_listing_data(),
        };
        let metadata = create_test_metadata(UserRole::Farmer);

        let listing = action.execute(&mut ctx, &metadata).unwrap();

        assert_eq!(listing.seller_id, "farmer-1");
        assert_eq!(listing.status, ListingStatus::Active);
        assert_eq!(listing.views_count, 0);

        let stored = storage.get_listing_txn(&txn, &listing.id).unwrap().unwrap();
        assert_eq!(stored.title, "Basmati Rice");

        assert_eq!(ctx.events().len(), 1);
        assert_eq!(ctx.events()[0].entity_type, EntityKind::Listing);
        assert_eq!(ctx.events()[0].action, LifecycleAction::Created);
        assert!(ctx.notifications().is_empty());
    }

    #[test]
    fn test_create_listing_defaults_to_draft() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let mut data = create_listing_data();
        data.status = None;
        let action = CreateListingAction { data };
        let metadata = create_test_metadata(UserRole::Farmer);

        let listing = action.execute(&mut ctx, &metadata).unwrap();
        assert_eq!(listing.status, ListingStatus::Draft);
    }

    #[test]
    fn test_create_listing_rejects_trader() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let action = CreateListingAction {
            data: create_listing_data(),
        };
        let metadata = create_test_metadata(UserRole::Trader);

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::Forbidden(_))));
    }

    #[test]
    fn test_create_listing_rejects_sold_status() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let mut data = create_listing_data();
        data.status = Some(ListingStatus::Sold);
        let action = CreateListingAction { data };
        let metadata = create_test_metadata(UserRole::Farmer);

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::Validation(_))));
    }

    #[test]
    fn test_create_listing_rejects_zero_quantity() {
        let storage = MarketStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        let mut ctx = CommandContext::new(&txn, &storage);

        let mut data = create_listing_data();
        data.quantity_available = Decimal::ZERO;
        let action = CreateListingAction { data };
        let metadata = create_test_metadata(UserRole::Farmer);

        let result = action.execute(&mut ctx, &metadata);
        assert!(matches!(result, Err(LifecycleError::Validation(_))));
    }
}
