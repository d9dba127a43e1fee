//! Utility module - shared helpers and types
//!
//! - [`AppError`] - application error type
//! - [`logger`] - tracing setup
//! - [`validation`] - input length and range checks

pub mod error;
pub mod logger;
pub mod validation;

pub use error::{AppError, AppResult, ok};
