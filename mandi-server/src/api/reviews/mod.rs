//! Review API module
//!
//! Reviews are tied to completed orders, one per (order, reviewer) pair.
//! Listings and stats are visible to any authenticated user; the
//! `is_anonymous` flag tells clients to hide the reviewer identity.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

/// Review router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/reviews", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::submit))
        // Eligibility probe for the review button
        .route("/can-review/{order_id}", get(handler::can_review))
        .route("/user/{user_id}", get(handler::list_for_user))
        .route("/user/{user_id}/stats", get(handler::stats_for_user))
}
