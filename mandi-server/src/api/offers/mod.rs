//! Offer API module
//!
//! Traders place offers against listings; the listing seller accepts or
//! rejects them. Acceptance creates the order and decrements stock, all
//! inside one lifecycle command.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

/// Offer router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/offers", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create))
        // Own offers (buyer side)
        .route("/my", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/accept", post(handler::accept))
        .route("/{id}/reject", post(handler::reject))
        .route("/{id}/withdraw", post(handler::withdraw))
}
