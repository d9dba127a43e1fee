//! Review API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use shared::ApiResponse;
use shared::models::{Review, ReviewStats};

use crate::api::{AppResult, ok};
use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::lifecycle::CommandMetadata;
use crate::lifecycle::actions::SubmitReviewAction;
use crate::reviews::{ReviewEligibility, check_review_eligibility, compute_review_stats};

/// Submit review request
#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub command_id: Option<String>,
    pub order_id: String,
    pub rating_overall: u8,
    pub rating_quality: Option<u8>,
    pub rating_timeliness: Option<u8>,
    pub rating_packaging: Option<u8>,
    pub review_text: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Submit a review for a completed order
pub async fn submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<SubmitReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = SubmitReviewAction {
        order_id: payload.order_id,
        rating_overall: payload.rating_overall,
        rating_quality: payload.rating_quality,
        rating_timeliness: payload.rating_timeliness,
        rating_packaging: payload.rating_packaging,
        review_text: payload.review_text,
        images: payload.images,
        is_anonymous: payload.is_anonymous,
    };
    let review = state.manager.execute(&action, &metadata)?;
    Ok(ok(review))
}

/// Eligibility response
#[derive(Debug, Serialize)]
pub struct CanReviewResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// Whether the caller may review the given order.
///
/// A missing order id reads the same as an incomplete order, so the
/// probe leaks nothing about which order ids exist.
pub async fn can_review(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<ApiResponse<CanReviewResponse>>> {
    let eligibility = match state.storage.get_order(&order_id)? {
        Some(order) => {
            let already = state.storage.review_exists(&order_id, &user.id)?;
            check_review_eligibility(&order, &user.id, already)
        }
        None => ReviewEligibility::NotCompleted,
    };
    Ok(ok(CanReviewResponse {
        allowed: eligibility.allowed(),
        reason: eligibility.reason(),
    }))
}

/// Reviews received by a user, newest first
pub async fn list_for_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Review>>>> {
    let reviews = state.storage.list_reviews_for_user(&user_id)?;
    Ok(ok(reviews))
}

/// Aggregate rating stats for a user
pub async fn stats_for_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<ReviewStats>>> {
    let reviews = state.storage.list_reviews_for_user(&user_id)?;
    Ok(ok(compute_review_stats(&reviews)))
}
