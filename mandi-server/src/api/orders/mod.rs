//! Order API module
//!
//! Orders are created by offer acceptance, never directly. These routes
//! cover the paid-shipped-completed path, cancellation, and the order's
//! shipment and payment records.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

/// Order router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        // Own orders, optionally filtered by side (?role=buyer|seller)
        .route("/my", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/pay", post(handler::pay))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/confirm-delivery", post(handler::confirm_delivery))
        .route(
            "/{id}/shipment",
            get(handler::get_shipment).put(handler::update_shipment),
        )
        // Payment attempts, newest last
        .route("/{id}/payments", get(handler::list_payments))
}
