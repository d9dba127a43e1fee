//! Offer model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Offer lifecycle status. Pending is the only non-terminal state;
/// accepted is the only state that spawns an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
    Withdrawn,
}

/// A trader's proposal against a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub listing_id: String,
    pub buyer_id: String,
    /// Conversation thread between buyer and seller for this listing
    pub thread_id: String,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
    /// quantity x price_per_unit, fixed at creation
    pub total_amount: Decimal,
    pub delivery_terms: Option<String>,
    pub notes: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
