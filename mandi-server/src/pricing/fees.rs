//! Order fee calculation
//!
//! All money amounts are `Decimal` rounded to 2 decimal places with
//! half-up (midpoint away from zero) rounding, applied per component.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Platform commission rate: 3%
pub const PLATFORM_FEE_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 2);

/// GST rate applied on the subtotal: 18%
pub const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);

const DECIMAL_PLACES: u32 = 2;

/// Round a money amount to 2 decimal places, half away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Fee components of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub subtotal: Decimal,
    pub platform_fee: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
}

/// Compute platform fee, tax and total for an order subtotal.
///
/// Each component is rounded independently before summing, so
/// `total == subtotal + platform_fee + tax_amount` always holds exactly.
pub fn calculate_order_fees(subtotal: Decimal) -> FeeBreakdown {
    let subtotal = round_money(subtotal);
    let platform_fee = round_money(subtotal * PLATFORM_FEE_RATE);
    let tax_amount = round_money(subtotal * TAX_RATE);
    let total_amount = subtotal + platform_fee + tax_amount;

    FeeBreakdown {
        subtotal,
        platform_fee,
        tax_amount,
        total_amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_order_fees() {
        // 50 quintal at 4500/quintal
        let fees = calculate_order_fees(Decimal::from(225_000));
        assert_eq!(fees.platform_fee, Decimal::from(6750));
        assert_eq!(fees.tax_amount, Decimal::from(40_500));
        assert_eq!(fees.total_amount, Decimal::from(272_250));
    }

    #[test]
    fn zero_subtotal_yields_zero_fees() {
        let fees = calculate_order_fees(Decimal::ZERO);
        assert_eq!(fees.platform_fee, Decimal::ZERO);
        assert_eq!(fees.tax_amount, Decimal::ZERO);
        assert_eq!(fees.total_amount, Decimal::ZERO);
    }

    #[test]
    fn components_round_half_up_independently() {
        // 100000.50 * 0.03 = 3000.015 -> 3000.02
        let subtotal = Decimal::new(10_000_050, 2);
        let fees = calculate_order_fees(subtotal);
        assert_eq!(fees.platform_fee, Decimal::new(300_002, 2));
        assert_eq!(fees.tax_amount, Decimal::new(1_800_009, 2));
        assert_eq!(
            fees.total_amount,
            subtotal + fees.platform_fee + fees.tax_amount
        );
    }

    #[test]
    fn total_identity_holds_for_awkward_subtotals() {
        for cents in [1i64, 33, 99, 101, 12_345_678] {
            let fees = calculate_order_fees(Decimal::new(cents, 2));
            assert_eq!(
                fees.total_amount,
                fees.subtotal + fees.platform_fee + fees.tax_amount
            );
        }
    }
}
