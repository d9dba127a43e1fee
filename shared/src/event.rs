//! Lifecycle events - immutable facts broadcast after a transition commits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entity kind referenced by events, notifications and audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Listing,
    Offer,
    Order,
    Payment,
    Shipment,
    Dispute,
    Review,
    Thread,
    Payout,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Listing => "listing",
            EntityKind::Offer => "offer",
            EntityKind::Order => "order",
            EntityKind::Payment => "payment",
            EntityKind::Shipment => "shipment",
            EntityKind::Dispute => "dispute",
            EntityKind::Review => "review",
            EntityKind::Thread => "thread",
            EntityKind::Payout => "payout",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action recorded by a transition (audit trail + event stream).
///
/// The bare `Created`/`Captured`/`Updated` variants read together with the
/// entity kind they apply to: order created, payment captured, shipment
/// updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    // Offers
    OfferCreated,
    OfferRejected,
    OfferWithdrawn,
    OfferExpired,

    // Order / payment / shipment
    Created,
    Captured,
    Updated,
    DeliveryConfirmed,
    Cancelled,

    // Disputes
    DisputeOpened,
    EvidenceAdded,
    DisputeResolved,

    // Reviews
    ReviewSubmitted,
}

impl LifecycleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleAction::OfferCreated => "offer_created",
            LifecycleAction::OfferRejected => "offer_rejected",
            LifecycleAction::OfferWithdrawn => "offer_withdrawn",
            LifecycleAction::OfferExpired => "offer_expired",
            LifecycleAction::Created => "created",
            LifecycleAction::Captured => "captured",
            LifecycleAction::Updated => "updated",
            LifecycleAction::DeliveryConfirmed => "delivery_confirmed",
            LifecycleAction::Cancelled => "cancelled",
            LifecycleAction::DisputeOpened => "dispute_opened",
            LifecycleAction::EvidenceAdded => "evidence_added",
            LifecycleAction::DisputeResolved => "dispute_resolved",
            LifecycleAction::ReviewSubmitted => "review_submitted",
        }
    }
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle event - broadcast to in-process subscribers after commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Event unique ID
    pub event_id: String,
    /// Entity the transition acted on
    pub entity_type: EntityKind,
    pub entity_id: String,
    /// What happened
    pub action: LifecycleAction,
    /// Actor who triggered the transition ("system" for scheduled sweeps)
    pub actor_id: String,
    /// Server timestamp, set when the event is created
    pub occurred_at: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(
        entity_type: EntityKind,
        entity_id: impl Into<String>,
        action: LifecycleAction,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            entity_type,
            entity_id: entity_id.into(),
            action,
            actor_id: actor_id.into(),
            occurred_at: Utc::now(),
        }
    }
}
