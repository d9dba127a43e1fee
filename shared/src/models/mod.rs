//! Entity models
//!
//! Shared between the server and API clients. All IDs are UUID strings,
//! timestamps are UTC, money and quantities are `rust_decimal::Decimal`
//! (serialized as JSON numbers).

pub mod audit;
pub mod dispute;
pub mod listing;
pub mod message;
pub mod notification;
pub mod offer;
pub mod order;
pub mod payment;
pub mod payout;
pub mod review;
pub mod shipment;
pub mod thread;

// Re-exports
pub use audit::*;
pub use dispute::*;
pub use listing::*;
pub use message::*;
pub use notification::*;
pub use offer::*;
pub use order::*;
pub use payment::*;
pub use payout::*;
pub use review::*;
pub use shipment::*;
pub use thread::*;
