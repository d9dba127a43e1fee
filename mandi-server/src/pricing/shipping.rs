//! Shipping quote calculation
//!
//! Pure geometry and rate arithmetic; no storage access. Costs are quoted
//! in whole rupees, distances in whole kilometres.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use shared::{GeoPoint, Unit};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Base cost in INR
const BASE_RATE: f64 = 50.0;
/// Cost per kilometre in INR
const PER_KM_RATE: f64 = 8.0;
/// Additional cost per kg in INR
const PER_KG_RATE: f64 = 5.0;
/// 15% fuel surcharge on the pre-surcharge subtotal
const FUEL_SURCHARGE_RATE: f64 = 0.15;

/// Great-circle distance in kilometres (haversine)
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Cost components of a quote, in whole rupees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub base_rate: i64,
    pub distance_cost: i64,
    pub weight_cost: i64,
    pub fuel_surcharge: i64,
    pub total: i64,
}

/// One carrier option for the quoted route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierOption {
    pub name: String,
    pub cost: i64,
    pub delivery_days: u32,
    pub features: Vec<String>,
}

/// A full shipping quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingQuote {
    /// Route distance in whole kilometres
    pub distance: i64,
    pub estimated_cost: i64,
    pub breakdown: CostBreakdown,
    pub estimated_delivery_days: u32,
    pub is_inter_state: bool,
    pub carrier_options: Vec<CarrierOption>,
}

/// Quote shipping for a quantity of produce between two points.
///
/// Cost = base + distance * per-km + weight * per-kg, plus a 15% fuel
/// surcharge on that subtotal. Delivery takes 1 day up to 200 km, 2 days
/// up to 500 km, otherwise 3.
pub fn quote_shipping(
    pickup: &GeoPoint,
    delivery: &GeoPoint,
    quantity: Decimal,
    unit: Unit,
) -> ShippingQuote {
    let distance = haversine_km(pickup, delivery);
    let weight_kg = unit.weight_kg(quantity).to_f64().unwrap_or_default();

    let distance_cost = distance * PER_KM_RATE;
    let weight_cost = weight_kg * PER_KG_RATE;
    let subtotal = BASE_RATE + distance_cost + weight_cost;
    let fuel_surcharge = subtotal * FUEL_SURCHARGE_RATE;
    let total = (subtotal + fuel_surcharge).round() as i64;

    let estimated_delivery_days = if distance > 500.0 {
        3
    } else if distance > 200.0 {
        2
    } else {
        1
    };

    // State names are user-entered; compare case-insensitively
    let is_inter_state = !pickup.state.eq_ignore_ascii_case(&delivery.state);

    ShippingQuote {
        distance: distance.round() as i64,
        estimated_cost: total,
        breakdown: CostBreakdown {
            base_rate: BASE_RATE as i64,
            distance_cost: distance_cost.round() as i64,
            weight_cost: weight_cost.round() as i64,
            fuel_surcharge: fuel_surcharge.round() as i64,
            total,
        },
        estimated_delivery_days,
        is_inter_state,
        carrier_options: vec![
            CarrierOption {
                name: "AgriTrans Express".to_string(),
                cost: total,
                delivery_days: estimated_delivery_days,
                features: vec![
                    "Real-time tracking".to_string(),
                    "Insurance covered".to_string(),
                    "Temperature controlled".to_string(),
                ],
            },
            CarrierOption {
                name: "FarmLink Logistics".to_string(),
                cost: ((total as f64) * 0.9).round() as i64,
                delivery_days: estimated_delivery_days + 1,
                features: vec![
                    "Budget friendly".to_string(),
                    "Bulk handling".to_string(),
                    "Basic tracking".to_string(),
                ],
            },
        ],
    }
}
