//! Loyalty Ledger Engine
//!
//! Settlement math for order creation and update. All arithmetic runs on
//! `Decimal` and is converted to `f64` only for storage/serialization.
//!
//! # Rules
//!
//! | Step | Rule |
//! |------|------|
//! | subtotal | Σ price × quantity over item lines |
//! | detected tax | max(0, declared total − subtotal), opaque pass-through |
//! | redemption | clamp to [0, balance], floor to a multiple of 100 |
//! | discount | 100 points = $1 |
//! | earn | 1 point per whole currency unit, post-discount, pre-tax |

use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::*;
use shared::models::order::OrderItem;

/// Points per currency unit of discount
const POINTS_PER_UNIT: i64 = 100;

/// Monetary rounding: 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

/// Result of settling an order against a loyalty balance
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub subtotal: f64,
    pub detected_tax: f64,
    /// Validated redemption: non-negative multiple of 100, <= balance
    pub points_used: i64,
    pub subtotal_after_discount: f64,
    pub total: f64,
    pub points_earned: i64,
}

impl Settlement {
    /// Ledger delta for this settlement:
    /// `new balance = max(0, balance - points_used) + points_earned`
    pub fn new_balance(&self, balance: i64) -> i64 {
        (balance - self.points_used).max(0) + self.points_earned
    }
}

fn decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamp a requested redemption into [0, balance], then floor to the
/// nearest lower multiple of 100.
pub fn validate_points(requested: i64, balance: i64) -> i64 {
    let clamped = requested.clamp(0, balance.max(0));
    (clamped / POINTS_PER_UNIT) * POINTS_PER_UNIT
}

/// Settle an order: subtotal, tax detection, redemption validation,
/// discounted totals and points earned.
///
/// `balance` is the customer's balance as read at validation time. For a
/// customer that cannot be found, settle with `balance = 0` — the
/// requested redemption then clamps to zero and the totals degrade to
/// subtotal + detected tax.
pub fn settle(
    items: &[OrderItem],
    declared_total: f64,
    requested_points: i64,
    balance: i64,
) -> Settlement {
    let subtotal: Decimal = items
        .iter()
        .map(|item| decimal(item.price) * Decimal::from(item.quantity))
        .sum();
    let subtotal = round_money(subtotal);

    // Tax is whatever the caller declared above the subtotal — detected,
    // never recomputed, never negative.
    let detected_tax = (decimal(declared_total) - subtotal).max(Decimal::ZERO);
    let detected_tax = round_money(detected_tax);

    let points_used = validate_points(requested_points, balance);
    let discount = Decimal::from(points_used / POINTS_PER_UNIT);

    let subtotal_after_discount = round_money((subtotal - discount).max(Decimal::ZERO));
    let total = round_money(subtotal_after_discount + detected_tax);

    let points_earned = subtotal_after_discount
        .floor()
        .to_i64()
        .unwrap_or(0)
        .max(0);

    Settlement {
        subtotal: subtotal.to_f64().unwrap_or(0.0),
        detected_tax: detected_tax.to_f64().unwrap_or(0.0),
        points_used,
        subtotal_after_discount: subtotal_after_discount.to_f64().unwrap_or(0.0),
        total: total.to_f64().unwrap_or(0.0),
        points_earned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, quantity: i32) -> OrderItem {
        OrderItem {
            name: "item".to_string(),
            quantity,
            price,
        }
    }

    #[test]
    fn redeems_and_earns_round_trip() {
        // balance 500, redeem 300 against a 50.00 subtotal
        let items = [item(25.0, 2)];
        let s = settle(&items, 50.0, 300, 500);
        assert_eq!(s.subtotal, 50.0);
        assert_eq!(s.points_used, 300);
        assert_eq!(s.subtotal_after_discount, 47.0);
        assert_eq!(s.total, 47.0);
        assert_eq!(s.points_earned, 47);
        assert_eq!(s.new_balance(500), 247);
    }

    #[test]
    fn clamps_to_balance_then_floors_to_hundred() {
        assert_eq!(validate_points(250, 180), 100);
        assert_eq!(validate_points(199, 500), 100);
        assert_eq!(validate_points(-50, 500), 0);
        assert_eq!(validate_points(300, 0), 0);
        assert_eq!(validate_points(1000, 1000), 1000);
    }

    #[test]
    fn points_used_is_always_a_multiple_of_100_within_balance() {
        for requested in [0, 1, 99, 100, 101, 250, 999, 10_000] {
            for balance in [0, 80, 100, 180, 550, 10_000] {
                let used = validate_points(requested, balance);
                assert_eq!(used % 100, 0);
                assert!(used <= balance);
                assert!(used >= 0);
            }
        }
    }

    #[test]
    fn detects_tax_as_total_overage() {
        let items = [item(10.0, 3)];
        let s = settle(&items, 33.6, 0, 0);
        assert_eq!(s.subtotal, 30.0);
        assert_eq!(s.detected_tax, 3.6);
        assert_eq!(s.total, 33.6);
        assert_eq!(s.points_earned, 30);
    }

    #[test]
    fn declared_total_below_subtotal_never_goes_negative() {
        let items = [item(20.0, 1)];
        let s = settle(&items, 15.0, 0, 0);
        assert_eq!(s.detected_tax, 0.0);
        assert_eq!(s.total, 20.0);
    }

    #[test]
    fn discount_cannot_push_subtotal_below_zero() {
        // $2 order, 400 points available and requested
        let items = [item(2.0, 1)];
        let s = settle(&items, 2.0, 400, 400);
        assert_eq!(s.points_used, 400);
        assert_eq!(s.subtotal_after_discount, 0.0);
        assert_eq!(s.total, 0.0);
        assert_eq!(s.points_earned, 0);
        // redeemed points are still spent
        assert_eq!(s.new_balance(400), 0);
    }

    #[test]
    fn earn_floors_fractional_currency() {
        let items = [item(9.99, 1)];
        let s = settle(&items, 9.99, 0, 0);
        assert_eq!(s.points_earned, 9);
    }

    #[test]
    fn missing_customer_settles_with_zero_balance() {
        let items = [item(25.0, 2)];
        let s = settle(&items, 52.5, 300, 0);
        assert_eq!(s.points_used, 0);
        assert_eq!(s.subtotal_after_discount, 50.0);
        assert_eq!(s.total, 52.5);
        assert_eq!(s.points_earned, 50);
    }
}
