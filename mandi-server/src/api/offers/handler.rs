//! Offer API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use shared::ApiResponse;
use shared::models::{Offer, Order};
use shared::types::Address;

use crate::api::{AppError, AppResult, CommandQuery, ok};
use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::lifecycle::CommandMetadata;
use crate::lifecycle::actions::{
    AcceptOfferAction, CreateOfferAction, OfferWithThread, RejectOfferAction, WithdrawOfferAction,
};

/// Create offer request
#[derive(Debug, Deserialize)]
pub struct CreateOfferRequest {
    pub command_id: Option<String>,
    pub listing_id: String,
    pub quantity: Decimal,
    pub price_per_unit: Decimal,
    pub delivery_terms: Option<String>,
    pub notes: Option<String>,
    /// Defaults to 7 when absent
    pub expires_in_days: Option<i64>,
}

/// Place an offer on a listing (trader role). Also opens the
/// buyer/seller message thread for the listing if none exists yet.
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateOfferRequest>,
) -> AppResult<Json<ApiResponse<OfferWithThread>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = CreateOfferAction {
        listing_id: payload.listing_id,
        quantity: payload.quantity,
        price_per_unit: payload.price_per_unit,
        delivery_terms: payload.delivery_terms,
        notes: payload.notes,
        expires_in_days: payload.expires_in_days,
    };
    let result = state.manager.execute(&action, &metadata)?;
    Ok(ok(result))
}

/// List the caller's own offers, newest first
pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Offer>>>> {
    let offers = state.storage.list_offers_for_buyer(&user.id)?;
    Ok(ok(offers))
}

/// Get an offer by id. Visible to the buyer and the listing seller.
pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let offer = state
        .storage
        .get_offer(&id)?
        .ok_or_else(|| AppError::not_found("Offer not found"))?;
    if offer.buyer_id != user.id {
        let listing = state
            .storage
            .get_listing(&offer.listing_id)?
            .ok_or_else(|| AppError::not_found("Listing not found"))?;
        if listing.seller_id != user.id {
            return Err(AppError::forbidden("Not authorized"));
        }
    }
    Ok(ok(offer))
}

/// Accept offer request
#[derive(Debug, Deserialize)]
pub struct AcceptOfferRequest {
    pub command_id: Option<String>,
    pub delivery_address: Address,
}

/// Accept a pending offer (listing seller). Creates the order.
pub async fn accept(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<AcceptOfferRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = AcceptOfferAction {
        offer_id: id,
        delivery_address: payload.delivery_address,
    };
    let order = state.manager.execute(&action, &metadata)?;
    Ok(ok(order))
}

/// Reject a pending offer (listing seller)
pub async fn reject(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<CommandQuery>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let metadata = CommandMetadata::for_user(query.command_id, &user);
    let action = RejectOfferAction { offer_id: id };
    let offer = state.manager.execute(&action, &metadata)?;
    Ok(ok(offer))
}

/// Withdraw a pending offer (offer buyer)
pub async fn withdraw(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<CommandQuery>,
) -> AppResult<Json<ApiResponse<Offer>>> {
    let metadata = CommandMetadata::for_user(query.command_id, &user);
    let action = WithdrawOfferAction { offer_id: id };
    let offer = state.manager.execute(&action, &metadata)?;
    Ok(ok(offer))
}
