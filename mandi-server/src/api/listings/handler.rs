//! Listing API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use shared::models::{Listing, ListingCreate, ListingUpdate, Offer};
use shared::{ApiResponse, PaginatedResponse, PaginationQuery};

use crate::api::{AppError, AppResult, CommandQuery, ok};
use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::lifecycle::CommandMetadata;
use crate::lifecycle::actions::{CreateListingAction, RemoveListingAction, UpdateListingAction};

/// Create listing request
#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub command_id: Option<String>,
    #[serde(flatten)]
    pub listing: ListingCreate,
}

/// Create a new listing (farmer role)
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateListingRequest>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = CreateListingAction {
        data: payload.listing,
    };
    let listing = state.manager.execute(&action, &metadata)?;
    Ok(ok(listing))
}

/// Category filter for browsing
#[derive(Debug, Deserialize)]
pub struct ListFilter {
    pub category: Option<String>,
}

/// List active listings, newest first, optionally filtered by category
pub async fn list_active(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(filter): Query<ListFilter>,
    Query(page): Query<PaginationQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Listing>>>> {
    let listings = state.storage.list_active_listings(filter.category.as_deref())?;
    let total = listings.len() as u64;
    let items: Vec<Listing> = listings
        .into_iter()
        .skip(page.offset())
        .take(page.limit())
        .collect();
    Ok(ok(PaginatedResponse::new(
        items,
        page.page,
        page.per_page,
        total,
    )))
}

/// List the caller's own listings, any status
pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Listing>>>> {
    let listings = state.storage.list_listings_for_seller(&user.id)?;
    Ok(ok(listings))
}

/// Get a listing by id. Each fetch counts as a view.
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let listing = state
        .storage
        .increment_listing_views(&id)?
        .ok_or_else(|| AppError::not_found("Listing not found"))?;
    Ok(ok(listing))
}

/// Update listing request
#[derive(Debug, Deserialize)]
pub struct UpdateListingRequest {
    pub command_id: Option<String>,
    #[serde(flatten)]
    pub changes: ListingUpdate,
}

/// Update a listing (owner only)
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateListingRequest>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = UpdateListingAction {
        listing_id: id,
        data: payload.changes,
    };
    let listing = state.manager.execute(&action, &metadata)?;
    Ok(ok(listing))
}

/// Remove (soft-delete) a listing (owner only)
pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<CommandQuery>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let metadata = CommandMetadata::for_user(query.command_id, &user);
    let action = RemoveListingAction { listing_id: id };
    let listing = state.manager.execute(&action, &metadata)?;
    Ok(ok(listing))
}

/// List offers received on a listing. Only the listing seller may look.
pub async fn list_offers(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Offer>>>> {
    let listing = state
        .storage
        .get_listing(&id)?
        .ok_or_else(|| AppError::not_found("Listing not found"))?;
    if listing.seller_id != user.id {
        return Err(AppError::forbidden("Not authorized"));
    }
    let offers = state.storage.list_offers_for_listing(&id)?;
    Ok(ok(offers))
}
