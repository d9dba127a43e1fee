//! Thread API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use shared::ApiResponse;
use shared::models::{Message, Thread};

use crate::api::{AppError, AppResult, ok};
use crate::auth::CurrentUser;
use crate::core::AppState;
use crate::lifecycle::CommandMetadata;
use crate::lifecycle::actions::SendMessageAction;

/// Load a thread and reject callers who are not a participant.
fn load_thread_for_participant(
    state: &AppState,
    user: &CurrentUser,
    thread_id: &str,
) -> Result<Thread, AppError> {
    let thread = state
        .storage
        .get_thread(thread_id)?
        .ok_or_else(|| AppError::not_found("Thread not found"))?;
    if !thread.involves(&user.id) {
        return Err(AppError::forbidden("Not authorized"));
    }
    Ok(thread)
}

/// List the caller's threads, most recently active first
pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<Thread>>>> {
    let threads = state.storage.list_threads_for_user(&user.id)?;
    Ok(ok(threads))
}

/// List messages in a thread, oldest first (participants only)
pub async fn list_messages(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<Message>>>> {
    load_thread_for_participant(&state, &user, &id)?;
    let messages = state.storage.list_messages(&id)?;
    Ok(ok(messages))
}

/// Send message request
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub command_id: Option<String>,
    pub message_text: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Send a message in a thread (participants only)
pub async fn send_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<Message>>> {
    let metadata = CommandMetadata::for_user(payload.command_id, &user);
    let action = SendMessageAction {
        thread_id: id,
        message_text: payload.message_text,
        attachments: payload.attachments,
    };
    let message = state.manager.execute(&action, &metadata)?;
    Ok(ok(message))
}

/// Mark-read response
#[derive(Debug, Serialize)]
pub struct ThreadReadResponse {
    pub marked: usize,
}

/// Mark the other side's messages in a thread as read
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ThreadReadResponse>>> {
    load_thread_for_participant(&state, &user, &id)?;
    let marked = state.storage.mark_thread_messages_read(&id, &user.id)?;
    Ok(ok(ThreadReadResponse { marked }))
}
