//! Dispute model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dispute status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// A dispute raised by one party of an order against the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: String,
    pub order_id: String,
    pub raised_by_user_id: String,
    /// The other party of the order
    pub respondent_user_id: String,
    pub reason: String,
    pub description: Option<String>,
    /// Append-only evidence list (URLs or free text)
    pub evidence_urls: Vec<String>,
    pub status: DisputeStatus,
    pub resolution: Option<String>,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dispute {
    /// Whether the given user is one of the two parties.
    pub fn involves(&self, user_id: &str) -> bool {
        self.raised_by_user_id == user_id || self.respondent_user_id == user_id
    }
}
