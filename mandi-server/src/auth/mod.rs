//! Authentication module
//!
//! JWT bearer-token identity:
//! - [`JwtService`] - token generation and validation
//! - [`CurrentUser`] - per-request identity extracted from claims

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtError, JwtService};
