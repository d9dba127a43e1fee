//! Unified error handling
//!
//! Provides the HTTP-facing error type and response helpers:
//! - [`AppError`] - application error enum
//! - [`ok`] - success envelope helper
//!
//! # Error code scheme
//!
//! | Prefix | Category | Example |
//! |--------|----------|---------|
//! | E1xxx | Validation | E1001 invalid input |
//! | E2xxx | Authentication / authorization | E2001 not logged in |
//! | E3xxx | Not found / state conflict | E3001 missing entity |
//! | E5xxx | System | E5001 internal error |
//!
//! # Usage
//!
//! ```ignore
//! // Return an error
//! Err(AppError::not_found("Order not found"))
//!
//! // Return a success response
//! Ok(ok(data))
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::ApiResponse;
use tracing::error;

/// Application error enum
///
/// Authentication variants cover missing or bad credentials, business
/// variants cover lifecycle preconditions, system variants cover
/// storage and serialization faults.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication errors (401) ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    // ========== Authorization errors (403) ==========
    #[error("{0}")]
    Forbidden(String),

    // ========== Business errors (4xx) ==========
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    // ========== System errors (5xx) ==========
    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<crate::storage::StorageError> for AppError {
    fn from(err: crate::storage::StorageError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Authentication errors (401)
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "E2001",
                "Authentication required".to_string(),
            ),
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "E2002", "Invalid token".to_string())
            }
            AppError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "E2003", "Token expired".to_string())
            }

            // Authorization errors (403)
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "E2101", msg.clone()),

            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E3001", msg.clone()),

            // State conflict (409)
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E3101", msg.clone()),

            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E1001", msg.clone()),

            // Internal errors (500)
            AppError::Internal(msg) => {
                let trace_id = uuid::Uuid::new_v4().to_string();
                error!(target: "internal", trace_id = %trace_id, error = %msg, "Internal error occurred");
                let body = Json(
                    ApiResponse::<()>::error("E5001", "Internal server error")
                        .with_trace_id(trace_id),
                );
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };

        let body = Json(ApiResponse::<()>::error(code, message));
        (status, body).into_response()
    }
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

// ========== Helper functions ==========

/// Create a successful response envelope
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}
