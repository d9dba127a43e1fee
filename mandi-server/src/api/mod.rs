//! HTTP API routes
//!
//! # Structure
//!
//! - [`health`] - liveness probe
//! - [`listings`] - produce listing CRUD and browsing
//! - [`offers`] - offer negotiation (create/accept/reject/withdraw)
//! - [`orders`] - order lifecycle (payment, cancellation, delivery, shipment)
//! - [`disputes`] - dispute filing, evidence, admin resolution
//! - [`reviews`] - post-completion reviews and seller stats
//! - [`notifications`] - per-user notification inbox
//! - [`threads`] - buyer/seller message threads
//! - [`payouts`] - seller payout history
//! - [`shipping`] - shipping cost quotes
//! - [`audit`] - per-entity audit trail (admin)
//!
//! Every route except `/health` requires a bearer token; handlers take
//! [`crate::auth::CurrentUser`] as an extractor argument to enforce it.

pub mod audit;
pub mod disputes;
pub mod health;
pub mod listings;
pub mod notifications;
pub mod offers;
pub mod orders;
pub mod payouts;
pub mod reviews;
pub mod shipping;
pub mod threads;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::AppState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult, ok};

/// Optional idempotency key for mutations that carry no request body.
///
/// Mutations with a JSON body take `command_id` as a body field instead.
#[derive(Debug, Default, serde::Deserialize)]
pub struct CommandQuery {
    pub command_id: Option<String>,
}

/// Build the application router: all resource routers plus CORS and
/// request tracing layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(listings::router())
        .merge(offers::router())
        .merge(orders::router())
        .merge(disputes::router())
        .merge(reviews::router())
        .merge(notifications::router())
        .merge(threads::router())
        .merge(payouts::router())
        .merge(shipping::router())
        .merge(audit::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
