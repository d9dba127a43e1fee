//! Shipment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Address;

/// Shipment status as reported by the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Cancelled,
}

/// One carrier tracking event. Events are appended in arrival order and
/// never reordered or deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub timestamp: DateTime<Utc>,
    pub status: ShipmentStatus,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// Shipment record, at most one per order, created lazily on the first
/// carrier update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: String,
    pub order_id: String,
    pub tracking_id: Option<String>,
    pub carrier_name: Option<String>,
    pub status: ShipmentStatus,
    pub pickup_address: Option<Address>,
    pub delivery_address: Option<Address>,
    pub pickup_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,
    /// Append-only carrier event log
    pub tracking_events: Vec<TrackingEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
