//! Dispute API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use shared::ApiResponse;
use shared::models::Dispute;
use shared::types::UserRole;

use crate::api::{AppError, AppResult, ok};
use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::lifecycle::CommandMetadata;
use crate::lifecycle::actions::{AddEvidenceAction, OpenDisputeAction, ResolveDisputeAction};

/// Open dispute request
#[derive(Debug, Deserialize)]
pub struct OpenDisputeRequest {
    pub command_id: Option<String>,
    pub order_id: String,
    pub reason: String,
    pub description: Option<String>,
}

/// Open a dispute against an order (buyer or seller)
pub async fn open(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<OpenDisputeRequest>,
) -> AppResult<Json<ApiResponse<Dispute>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = OpenDisputeAction {
        order_id: payload.order_id,
        reason: payload.reason,
        description: payload.description,
    };
    let dispute = state.manager.execute(&action, &metadata)?;
    Ok(ok(dispute))
}

/// List disputes the caller is involved in, newest first
pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Dispute>>>> {
    let disputes = state.storage.list_disputes_for_user(&user.id)?;
    Ok(ok(disputes))
}

/// Get a dispute by id (participants or admin)
pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Dispute>>> {
    let dispute = state
        .storage
        .get_dispute(&id)?
        .ok_or_else(|| AppError::not_found("Dispute not found"))?;
    if !dispute.involves(&user.id) && user.role != UserRole::Admin {
        return Err(AppError::forbidden("Not authorized"));
    }
    Ok(ok(dispute))
}

/// Evidence request
#[derive(Debug, Deserialize)]
pub struct AddEvidenceRequest {
    pub command_id: Option<String>,
    pub evidence_urls: Vec<String>,
}

/// Attach evidence to an open dispute (either participant)
pub async fn add_evidence(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<AddEvidenceRequest>,
) -> AppResult<Json<ApiResponse<Dispute>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = AddEvidenceAction {
        dispute_id: id,
        evidence_urls: payload.evidence_urls,
    };
    let dispute = state.manager.execute(&action, &metadata)?;
    Ok(ok(dispute))
}

/// Resolution request
#[derive(Debug, Deserialize)]
pub struct ResolveDisputeRequest {
    pub command_id: Option<String>,
    pub resolution: String,
}

/// Resolve a dispute (admin role)
pub async fn resolve(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ResolveDisputeRequest>,
) -> AppResult<Json<ApiResponse<Dispute>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = ResolveDisputeAction {
        dispute_id: id,
        resolution: payload.resolution,
    };
    let dispute = state.manager.execute(&action, &metadata)?;
    Ok(ok(dispute))
}
