//! Message thread API module
//!
//! One thread per buyer/listing pair, opened on first offer. Messages
//! go through the lifecycle manager; read receipts are plain storage
//! writes.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

/// Thread router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api/threads", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::list_mine))
        .route(
            "/{id}/messages",
            get(handler::list_messages).post(handler::send_message),
        )
        .route("/{id}/read", post(handler::mark_read))
}
