//! Audit trail API route
//!
//! Read side of the audit log the workers persist after each command.
//! Admin only; the trail spans entities and actors.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use shared::ApiResponse;
use shared::event::EntityKind;
use shared::models::AuditLog;
use shared::types::UserRole;

use crate::api::{AppError, AppResult, ok};
use crate::auth::CurrentUser;
use crate::core::AppState;

/// Audit router
pub fn router() -> Router<AppState> {
    Router::new().route("/api/audit/{entity_type}/{entity_id}", get(list_for_entity))
}

/// Audit entries for one entity, oldest first (admin role)
pub async fn list_for_entity(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((entity_type, entity_id)): Path<(EntityKind, String)>,
) -> AppResult<Json<ApiResponse<Vec<AuditLog>>>> {
    if user.role != UserRole::Admin {
        return Err(AppError::forbidden("Admin only"));
    }
    let entries = state.storage.list_audit_for_entity(entity_type, &entity_id)?;
    Ok(ok(entries))
}
