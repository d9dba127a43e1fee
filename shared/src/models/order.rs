//! Order model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Address, Party};

/// Order lifecycle status.
///
/// Main line: pending -> confirmed -> processing -> shipped -> completed.
/// Cancelled and disputed are side branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Completed,
    Cancelled,
    Disputed,
}

impl OrderStatus {
    /// Statuses from which an order may still be cancelled.
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing
        )
    }
}

/// The financial and logistics record spawned by an accepted offer.
///
/// Fee and tax are computed once at creation and never recomputed;
/// `total_amount = subtotal + platform_fee + tax_amount` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub listing_id: String,
    pub buyer_id: String,
    pub seller_id: String,
    pub offer_id: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub delivery_address: Address,
    pub payment_due_date: DateTime<Utc>,
    pub status: OrderStatus,
    /// Set on cancellation
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<Party>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Which side of this order the given user is on, if any.
    pub fn party_of(&self, user_id: &str) -> Option<Party> {
        if self.buyer_id == user_id {
            Some(Party::Buyer)
        } else if self.seller_id == user_id {
            Some(Party::Seller)
        } else {
            None
        }
    }

    /// The counterparty's user id for a given side.
    pub fn other_party_id(&self, party: Party) -> &str {
        match party {
            Party::Buyer => &self.seller_id,
            Party::Seller => &self.buyer_id,
        }
    }
}
