//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! redb stores JSON blobs with no built-in length enforcement, so every
//! free-text field is capped before it reaches storage.

use rust_decimal::Decimal;

use crate::lifecycle::LifecycleError;
use crate::utils::AppError;

// ========== Text length limits ==========

/// Listing titles, thread subjects, carrier names
pub const MAX_TITLE_LEN: usize = 200;

/// Descriptions, review text, dispute descriptions, message bodies
pub const MAX_TEXT_LEN: usize = 2000;

/// Notes, reasons, delivery terms, tracking descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: categories, grades, payment methods, tracking ids
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Evidence / image URLs
pub const MAX_URL_LEN: usize = 2048;

/// Address lines
pub const MAX_ADDRESS_LEN: usize = 500;

// ========== Validation helpers (HTTP handlers) ==========

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

// ========== Validation helpers (lifecycle actions) ==========

/// Validate a required string inside a lifecycle command (non-empty + max length).
pub fn validate_command_text(
    value: &str,
    field: &str,
    max_len: usize,
) -> Result<(), LifecycleError> {
    if value.trim().is_empty() {
        return Err(LifecycleError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    if value.len() > max_len {
        return Err(LifecycleError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate an optional string inside a lifecycle command (max length).
pub fn validate_command_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), LifecycleError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(LifecycleError::Validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate that a decimal amount is strictly positive.
pub fn validate_positive_amount(value: Decimal, field: &str) -> Result<(), LifecycleError> {
    if value <= Decimal::ZERO {
        return Err(LifecycleError::Validation(format!(
            "{field} must be positive"
        )));
    }
    Ok(())
}
