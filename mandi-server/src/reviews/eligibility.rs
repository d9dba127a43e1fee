//! Review eligibility rules

use shared::models::{Order, OrderStatus};
use shared::types::Party;

/// Outcome of the can-review check.
///
/// `reason()` strings are part of the API surface; clients match on
/// them to decide what to show next to the review button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEligibility {
    /// The user may review; carries which side of the order they are.
    Allowed(Party),
    NotCompleted,
    NotParticipant,
    AlreadyReviewed,
}

impl ReviewEligibility {
    pub fn allowed(&self) -> bool {
        matches!(self, ReviewEligibility::Allowed(_))
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            ReviewEligibility::Allowed(_) => None,
            ReviewEligibility::NotCompleted => Some("Order not completed"),
            ReviewEligibility::NotParticipant => Some("Not authorized"),
            ReviewEligibility::AlreadyReviewed => Some("Already reviewed"),
        }
    }
}

/// Whether `user_id` may submit a review on `order`.
///
/// Checks run in order: completion, participation, duplication. The
/// completion check wins even for non-participants so probing an order
/// id leaks nothing about who traded on it.
pub fn check_review_eligibility(
    order: &Order,
    user_id: &str,
    already_reviewed: bool,
) -> ReviewEligibility {
    if order.status != OrderStatus::Completed {
        return ReviewEligibility::NotCompleted;
    }
    let Some(party) = order.party_of(user_id) else {
        return ReviewEligibility::NotParticipant;
    };
    if already_reviewed {
        return ReviewEligibility::AlreadyReviewed;
    }
    ReviewEligibility::Allowed(party)
}
