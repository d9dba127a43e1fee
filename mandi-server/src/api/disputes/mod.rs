//! Dispute API module
//!
//! Either party of an order may open a dispute and attach evidence.
//! Resolution is an admin action.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

/// Dispute router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/disputes", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::open))
        // Disputes the caller raised or must answer
        .route("/my", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/evidence", post(handler::add_evidence))
        .route("/{id}/resolve", post(handler::resolve))
}
