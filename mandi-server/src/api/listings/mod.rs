//! Listing API module
//!
//! Browsing is open to any authenticated user; writes go through the
//! lifecycle manager, which enforces the farmer role and ownership.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

/// Listing router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/listings", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list_active))
        // Own listings, any status
        .route("/my", get(handler::list_mine))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::remove),
        )
        // Offers received on a listing (seller only)
        .route("/{id}/offers", get(handler::list_offers))
}
