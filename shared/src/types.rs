//! Common value types
//!
//! Roles, units, addresses and geo points shared by every entity model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Marketplace user role.
///
/// Traders buy produce, farmers sell it, admins moderate disputes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Trader,
    Farmer,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Trader => "trader",
            UserRole::Farmer => "farmer",
            UserRole::Admin => "admin",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trader" => Ok(UserRole::Trader),
            "farmer" => Ok(UserRole::Farmer),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Which side of an order an actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Buyer,
    Seller,
}

impl Party {
    pub fn as_str(&self) -> &'static str {
        match self {
            Party::Buyer => "buyer",
            Party::Seller => "seller",
        }
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trade unit for produce quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Kg,
    Quintal,
    Tonne,
}

impl Unit {
    /// Kilograms per one unit (1 quintal = 100 kg, 1 tonne = 1000 kg).
    pub fn kg_factor(&self) -> u32 {
        match self {
            Unit::Kg => 1,
            Unit::Quintal => 100,
            Unit::Tonne => 1000,
        }
    }

    /// Total weight in kilograms for a quantity expressed in this unit.
    pub fn weight_kg(&self, quantity: Decimal) -> Decimal {
        quantity * Decimal::from(self.kg_factor())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "kg",
            Unit::Quintal => "quintal",
            Unit::Tonne => "tonne",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Postal address used for order delivery and shipment endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub line1: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Geographic point with enough address context for shipping quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
}
