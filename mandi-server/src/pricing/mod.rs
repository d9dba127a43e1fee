//! Fee and shipping rate calculations

pub mod fees;
pub mod shipping;

pub use fees::{FeeBreakdown, calculate_order_fees, round_money};
pub use shipping::{ShippingQuote, haversine_km, quote_shipping};
