//! Notification API module
//!
//! Per-user inbox written by the notify worker after commands commit.
//! Clients poll these routes; there is no push transport.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

/// Notification router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/notifications", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/unread-count", get(handler::unread_count))
        .route("/{id}/read", post(handler::mark_read))
        .route("/read-all", post(handler::mark_all_read))
}
