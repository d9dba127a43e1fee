//! SubmitReview command handler
//!
//! One review per author per order, both directions. Gating runs
//! through the shared eligibility check so the command and the
//! can-review query can never disagree.

use chrono::Utc;

use shared::event::{EntityKind, LifecycleAction, LifecycleEvent};
use shared::models::{AuditLog, Notification, Review};

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::traits::{CommandContext, CommandHandler, CommandMetadata};
use crate::reviews::{ReviewEligibility, check_review_eligibility};
use crate::utils::validation::{
    MAX_TEXT_LEN, MAX_URL_LEN, validate_command_optional_text, validate_command_text,
};

/// SubmitReview action
#[derive(Debug, Clone)]
pub struct SubmitReviewAction {
    pub order_id: String,
    pub rating_overall: u8,
    pub rating_quality: Option<u8>,
    pub rating_timeliness: Option<u8>,
    pub rating_packaging: Option<u8>,
    pub review_text: Option<String>,
    pub images: Vec<String>,
    pub is_anonymous: bool,
}

fn validate_rating(value: u8, field: &str) -> Result<(), LifecycleError> {
    if (1..=5).contains(&value) {
        Ok(())
    } else {
        Err(LifecycleError::Validation(format!(
            "{field} must be between 1 and 5"
        )))
    }
}

impl CommandHandler for SubmitReviewAction {
    type Output = Review;

    fn execute(
        &self,
        ctx: &mut CommandContext<'_>,
        metadata: &CommandMetadata,
    ) -> Result<Review, LifecycleError> {
        // 1. Validate input
        validate_rating(self.rating_overall, "rating_overall")?;
        if let Some(rating) = self.rating_quality {
            validate_rating(rating, "rating_quality")?;
        }
        if let Some(rating) = self.rating_timeliness {
            validate_rating(rating, "rating_timeliness")?;
        }
        if let Some(rating) = self.rating_packaging {
            validate_rating(rating, "rating_packaging")?;
        }
        validate_command_optional_text(&self.review_text, "review_text", MAX_TEXT_LEN)?;
        for url in &self.images {
            validate_command_text(url, "image", MAX_URL_LEN)?;
        }

        // 2. Gate on order state, participation, and duplicates
        let order = ctx.load_order(&self.order_id)?;
        let already_reviewed =
            ctx.storage
                .review_exists_txn(ctx.txn, &order.id, &metadata.actor_id)?;
        let party = match check_review_eligibility(&order, &metadata.actor_id, already_reviewed) {
            ReviewEligibility::Allowed(party) => party,
            ReviewEligibility::NotParticipant => {
                return Err(LifecycleError::Forbidden("Not authorized".to_string()));
            }
            blocked => {
                return Err(LifecycleError::StateConflict(
                    blocked.reason().unwrap_or("Review not allowed").to_string(),
                ));
            }
        };
        let to_user_id = order.other_party_id(party).to_string();

        // 3. Store the review
        let review = Review {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            from_user_id: metadata.actor_id.clone(),
            to_user_id: to_user_id.clone(),
            rating_overall: self.rating_overall,
            rating_quality: self.rating_quality,
            rating_timeliness: self.rating_timeliness,
            rating_packaging: self.rating_packaging,
            review_text: self.review_text.clone(),
            images: self.images.clone(),
            is_anonymous: self.is_anonymous,
            created_at: Utc::now(),
        };
        ctx.storage.store_review(ctx.txn, &review)?;

        // 4. Notify the reviewee
        ctx.notify(Notification::new(
            &to_user_id,
            "review_received",
            "New Review",
            format!(
                "You received a {}-star review on order #{}.",
                self.rating_overall, order.id
            ),
            EntityKind::Review,
            &review.id,
        ));

        // 5. Audit
        ctx.audit(AuditLog::new(
            EntityKind::Review,
            &review.id,
            LifecycleAction::ReviewSubmitted,
            metadata.audit_actor(),
            serde_json::json!({
                "order_id": order.id,
                "rating_overall": self.rating_overall,
            }),
        ));

        // 6. Create event
        ctx.emit(LifecycleEvent::new(
            EntityKind::Review,
            &review.id,
            LifecycleAction::ReviewSubmitted,
            &metadata.actor_id,
        ));

        Ok(review)
    }
}
