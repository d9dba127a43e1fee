//! Conversation thread between a buyer and a seller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A buyer/seller conversation, optionally anchored to a listing.
/// Threads are deduplicated per (buyer, seller, listing) triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub listing_id: Option<String>,
    pub subject: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    /// Whether `user_id` is one of the two participants.
    pub fn involves(&self, user_id: &str) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }
}
