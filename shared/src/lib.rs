//! Shared types for the mandi marketplace
//!
//! Entity models, status enums, the API response envelope, and lifecycle
//! event types used across the workspace. No I/O lives here.

pub mod event;
pub mod models;
pub mod request;
pub mod response;
pub mod types;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use event::{EntityKind, LifecycleAction, LifecycleEvent};
pub use request::PaginationQuery;
pub use response::{ApiResponse, PaginatedResponse, Pagination};
pub use types::{Address, GeoPoint, Party, Unit, UserRole};
