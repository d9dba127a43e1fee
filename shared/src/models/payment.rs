//! Escrow payment model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Escrow payment status. Transitions only move forward, except
/// refunded which is reachable from captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Captured,
    Failed,
    Refunded,
    Released,
}

/// Payment held in escrow until delivery is confirmed.
///
/// `amount` always equals the order's total_amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub amount: Decimal,
    /// ISO currency code, always "INR"
    pub currency: String,
    pub payment_method: String,
    /// Provider-side reference for the capture attempt
    pub provider_payment_id: String,
    /// Opaque provider payload supplied by the caller
    pub provider_data: Option<serde_json::Value>,
    pub status: PaymentStatus,
    pub refund_amount: Option<Decimal>,
    pub failure_reason: Option<String>,
    pub captured_at: Option<DateTime<Utc>>,
    pub released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
