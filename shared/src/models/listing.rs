//! Listing model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Unit;

/// Listing lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Active,
    Sold,
    Expired,
    Removed,
}

/// How the listing is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingType {
    #[default]
    Fixed,
    Auction,
    Negotiable,
}

/// A farmer's produce listing.
///
/// `quantity_available` is live stock: accepting an offer decrements it,
/// cancelling the resulting order restores it. Never negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub seller_id: String,
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    /// Quality grade (e.g. "A", "FAQ")
    pub grade: Option<String>,
    pub variety: Option<String>,
    pub harvest_date: Option<NaiveDate>,
    pub moisture_percentage: Option<Decimal>,
    pub is_organic: bool,
    pub quantity_available: Decimal,
    pub unit: Unit,
    pub min_order_quantity: Decimal,
    pub price_per_unit: Decimal,
    pub pricing_type: PricingType,
    pub status: ListingStatus,
    pub state: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Vec<String>,
    pub views_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create listing payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingCreate {
    pub category: String,
    pub title: String,
    pub description: Option<String>,
    pub grade: Option<String>,
    pub variety: Option<String>,
    pub harvest_date: Option<NaiveDate>,
    pub moisture_percentage: Option<Decimal>,
    #[serde(default)]
    pub is_organic: bool,
    pub quantity_available: Decimal,
    pub unit: Unit,
    pub min_order_quantity: Decimal,
    pub price_per_unit: Decimal,
    #[serde(default)]
    pub pricing_type: PricingType,
    /// Draft or active; other statuses are reached through the lifecycle
    pub status: Option<ListingStatus>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Update listing payload (all fields optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingUpdate {
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub grade: Option<String>,
    pub variety: Option<String>,
    pub harvest_date: Option<NaiveDate>,
    pub moisture_percentage: Option<Decimal>,
    pub is_organic: Option<bool>,
    pub quantity_available: Option<Decimal>,
    pub unit: Option<Unit>,
    pub min_order_quantity: Option<Decimal>,
    pub price_per_unit: Option<Decimal>,
    pub pricing_type: Option<PricingType>,
    pub status: Option<ListingStatus>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub pincode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub images: Option<Vec<String>>,
}

impl Listing {
    pub fn new(seller_id: impl Into<String>, data: ListingCreate) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            seller_id: seller_id.into(),
            category: data.category,
            title: data.title,
            description: data.description,
            grade: data.grade,
            variety: data.variety,
            harvest_date: data.harvest_date,
            moisture_percentage: data.moisture_percentage,
            is_organic: data.is_organic,
            quantity_available: data.quantity_available,
            unit: data.unit,
            min_order_quantity: data.min_order_quantity,
            price_per_unit: data.price_per_unit,
            pricing_type: data.pricing_type,
            status: data.status.unwrap_or(ListingStatus::Draft),
            state: data.state,
            district: data.district,
            pincode: data.pincode,
            latitude: data.latitude,
            longitude: data.longitude,
            images: data.images,
            views_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
