//! UpdateListing command handler
//!
//! Partial update of a listing by its owner. Only supplied fields change.

use chrono::Utc;

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{Listing, ListingStatus, ListingUpdate};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::utils::validation::{
    MAX_SHORT_TEXT_LEN, MAX_TEXT_LEN, MAX_TITLE_LEN, validate_command_optional_text,
    validate_command_text, validate_positive_amount,
};

/// UpdateListing action
#[derive(Debug, Clone)]
pub struct UpdateListingAction {
    pub listing_id: String,
    pub data: ListingUpdate,
}

impl CommandHandler for UpdateListingAction {
    type Output = Listing;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Listing, LifecycleError> {
        // 1. Load the listing
        let mut listing = ctx.load_listing(&self.listing_id)?;

        // 2. Only the owner may update
        if listing.seller_id != metadata.actor_id {
            return Err(LifecycleError::Forbidden("Not authorized".to_string()));
        }

        // 3. Removed listings are immutable
        if listing.status == ListingStatus::Removed {
            return Err(LifecycleError::StateConflict(
                "Listing has been removed".to_string(),
            ));
        }

        // 4. Validate supplied fields
        if let Some(ref title) = self.data.title {
            validate_command_text(title, "title", MAX_TITLE_LEN)?;
        }
        if let Some(ref category) = self.data.category {
            validate_command_text(category, "category", MAX_SHORT_TEXT_LEN)?;
        }
        validate_command_optional_text(&self.data.description, "description", MAX_TEXT_LEN)?;
        if let Some(quantity) = self.data.quantity_available {
            validate_positive_amount(quantity, "quantity_available")?;
        }
        if let Some(min_qty) = self.data.min_order_quantity {
            validate_positive_amount(min_qty, "min_order_quantity")?;
        }
        if let Some(price) = self.data.price_per_unit {
            validate_positive_amount(price, "price_per_unit")?;
        }

        // 5. Status may only move between draft and active here; sold,
        //    expired and removed are reached through the lifecycle
        if let Some(status) = self.data.status
            && !matches!(status, ListingStatus::Draft | ListingStatus::Active)
        {
            return Err(LifecycleError::Validation(
                "Listing status can only be set to draft or active".to_string(),
            ));
        }

        // 6. Merge supplied fields
        let data = self.data.clone();
        if let Some(category) = data.category {
            listing.category = category;
        }
        if let Some(title) = data.title {
            listing.title = title;
        }
        if let Some(description) = data.description {
            listing.description = Some(description);
        }
        if let Some(grade) = data.grade {
            listing.grade = Some(grade);
        }
        if let Some(variety) = data.variety {
            listing.variety = Some(variety);
        }
        if let Some(harvest_date) = data.harvest_date {
            listing.harvest_date = Some(harvest_date);
        }
        if let Some(moisture) = data.moisture_percentage {
            listing.moisture_percentage = Some(moisture);
        }
        if let Some(is_organic) = data.is_organic {
            listing.is_organic = is_organic;
        }
        if let Some(quantity) = data.quantity_available {
            listing.quantity_available = quantity;
        }
        if let Some(unit) = data.unit {
            listing.unit = unit;
        }
        if let Some(min_qty) = data.min_order_quantity {
            listing.min_order_quantity = min_qty;
        }
        if let Some(price) = data.price_per_unit {
            listing.price_per_unit = price;
        }
        if let Some(pricing_type) = data.pricing_type {
            listing.pricing_type = pricing_type;
        }
        if let Some(status) = data.status {
            listing.status = status;
        }
        if let Some(state) = data.state {
            listing.state = Some(state);
        }
        if let Some(district) = data.district {
            listing.district = Some(district);
        }
        if let Some(pincode) = data.pincode {
            listing.pincode = Some(pincode);
        }
        if let Some(latitude) = data.latitude {
            listing.latitude = Some(latitude);
        }
        if let Some(longitude) = data.longitude {
            listing.longitude = Some(longitude);
        }
        if let Some(images) = data.images {
            listing.images = images;
        }
        listing.updated_at = Utc::now();

        // 7. Persist
        ctx.storage.store_listing(ctx.txn, &listing)?;

        // 8. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Listing,
            &listing.id,
            LifecycleAction::Updated,
            &metadata.actor_id,
        ));

        Ok(listing)
    }
}
