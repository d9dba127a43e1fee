//! Notification API handlers
//!
//! Notifications are reader-owned state, not lifecycle transitions, so
//! these write directly to storage instead of going through the manager.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use shared::ApiResponse;
use shared::models::Notification;

use crate::api::{AppError, AppResult, ok};
use crate::auth::CurrentUser;
use crate::core::AppState;

/// Filter for the notification list
#[derive(Debug, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread_only: bool,
}

/// List the caller's notifications, newest first
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<NotificationFilter>,
) -> AppResult<Json<ApiResponse<Vec<Notification>>>> {
    let mut notifications = state.storage.list_notifications(&user.id)?;
    if filter.unread_only {
        notifications.retain(|n| !n.is_read);
    }
    Ok(ok(notifications))
}

/// Unread count response
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Count of unread notifications (badge polling)
pub async fn unread_count(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let count = state.storage.unread_notification_count(&user.id)?;
    Ok(ok(UnreadCountResponse { count }))
}

/// Mark one notification read. Only the recipient can; anyone else sees
/// the same not-found as a bogus id.
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    let marked = state.storage.mark_notification_read(&user.id, &id)?;
    if !marked {
        return Err(AppError::not_found("Notification not found"));
    }
    Ok(ok(()))
}

/// Mark-all response
#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked: usize,
}

/// Mark every unread notification read
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let marked = state.storage.mark_all_notifications_read(&user.id)?;
    Ok(ok(MarkAllReadResponse { marked }))
}
