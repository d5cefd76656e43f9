//! Price arithmetic shared by the catalog, cart, and admin surfaces.
//!
//! Prices are whole rupees (`i64`). Discounts are stored as a percentage with
//! two decimal places, so a discount keeps tracking the price when the price
//! is edited later.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// GST charged on top of the order subtotal, as a fraction (5%).
#[must_use]
pub fn surcharge_rate() -> Decimal {
    Decimal::new(5, 2)
}

/// Rounds half up (toward positive infinity), matching how the storefront
/// has always displayed prices.
fn round_half_up(value: Decimal) -> i64 {
    let rounded = (value + Decimal::new(5, 1)).floor();
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Returns the unit price after applying `discount_percent`.
///
/// An absent, zero, or negative discount leaves the price unchanged. Prices
/// are not validated here: a negative price passes straight through.
#[must_use]
pub fn discounted_price(price: i64, discount_percent: Option<Decimal>) -> i64 {
    match discount_percent {
        Some(pct) if pct > Decimal::ZERO => {
            let price = Decimal::from(price);
            round_half_up(price - price * pct / Decimal::ONE_HUNDRED)
        }
        _ => price,
    }
}

/// Converts a "customer saves ₹X" amount into the percentage that is stored
/// on the product, rounded to two decimal places.
///
/// Returns zero (no discount) when the amount is not positive, the price is
/// not positive, or the amount would make the product free or cheaper.
#[must_use]
pub fn discount_percent_from_amount(price: i64, discount_amount: Decimal) -> Decimal {
    let price = Decimal::from(price);
    if discount_amount <= Decimal::ZERO || price <= Decimal::ZERO || discount_amount >= price {
        return Decimal::ZERO;
    }

    (discount_amount / price * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// GST on an order subtotal, rounded to whole rupees.
#[must_use]
pub fn surcharge(subtotal: i64) -> i64 {
    round_half_up(Decimal::from(subtotal) * surcharge_rate())
}
