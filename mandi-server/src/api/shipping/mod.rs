//! Shipping quote API route
//!
//! Pure rate-card calculation, no entity reads or writes. Kept behind
//! auth like every other route.

use axum::{Json, Router, extract::State, routing::post};
use rust_decimal::Decimal;
use serde::Deserialize;

use shared::ApiResponse;
use shared::types::{GeoPoint, Unit};

use crate::api::{AppResult, ok};
use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::pricing::{ShippingQuote, quote_shipping};
use crate::utils::validation::validate_positive_amount;

/// Shipping router
pub fn router() -> Router<AppState> {
    Router::new().route("/api/shipping/quote", post(quote))
}

/// Quote request
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub pickup: GeoPoint,
    pub delivery: GeoPoint,
    pub quantity: Decimal,
    pub unit: Unit,
}

/// Estimate shipping cost and transit time between two points
pub async fn quote(
    State(_state): State<AppState>,
    _user: CurrentUser,
    Json(payload): Json<QuoteRequest>,
) -> AppResult<Json<ApiResponse<ShippingQuote>>> {
    validate_positive_amount(payload.quantity, "quantity")?;
    let quote = quote_shipping(
        &payload.pickup,
        &payload.delivery,
        payload.quantity,
        payload.unit,
    );
    Ok(ok(quote))
}
