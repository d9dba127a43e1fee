//! Review model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A post-completion review from one order party about the other.
/// At most one per (order, from_user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub order_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    /// Overall rating, 1-5
    pub rating_overall: u8,
    pub rating_quality: Option<u8>,
    pub rating_timeliness: Option<u8>,
    pub rating_packaging: Option<u8>,
    pub review_text: Option<String>,
    pub images: Vec<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

/// Aggregate rating statistics for reviews received by one user.
///
/// Zero reviews yields average 0.0, total 0 and an empty breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewStats {
    /// Mean of rating_overall, rounded to one decimal
    pub average_rating: f64,
    pub total_reviews: u64,
    /// Count per integer rating value 1-5
    pub rating_breakdown: BTreeMap<u8, u64>,
}

impl ReviewStats {
    pub fn empty() -> Self {
        Self {
            average_rating: 0.0,
            total_reviews: 0,
            rating_breakdown: BTreeMap::new(),
        }
    }
}
