//! Payout API route
//!
//! Payouts are created when a buyer confirms delivery; sellers poll
//! their history here. There is no payout mutation surface.

use axum::{Json, Router, extract::State, routing::get};

use shared::ApiResponse;
use shared::models::Payout;

use crate::api::{AppResult, ok};
use crate::auth::CurrentUser;
use crate::core::AppState;

/// Payout router
pub fn router() -> Router<AppState> {
    Router::new().route("/api/payouts/my", get(list_mine))
}

/// List the caller's payouts, newest first
pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Payout>>>> {
    let payouts = state.storage.list_payouts_for_seller(&user.id)?;
    Ok(ok(payouts))
}
