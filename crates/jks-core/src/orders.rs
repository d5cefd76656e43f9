//! Checkout assembly: cart lines become an immutable order with GST and a
//! minimum order total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cart::Cart;
use crate::pricing::surcharge;

/// Smallest grand total (GST included) the shop accepts, in rupees.
pub const MIN_ORDER_TOTAL: i64 = 5000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("minimum order is ₹{minimum}; current total is ₹{total}")]
    BelowMinimum { total: i64, minimum: i64 },
    #[error("order totals do not add up: {0}")]
    InconsistentTotals(String),
}

/// Snapshot of one cart line at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub name: String,
    /// Discounted unit price.
    pub unit_price: i64,
    pub quantity: i64,
    pub image_url: Option<String>,
    pub line_total: i64,
}

/// A priced order that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub items: Vec<OrderLine>,
    pub subtotal: i64,
    pub gst: i64,
    pub total: i64,
}

impl OrderDraft {
    /// Prices the cart.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::EmptyCart`] for an empty cart and
    /// [`CheckoutError::BelowMinimum`] when the grand total is under
    /// [`MIN_ORDER_TOTAL`].
    pub fn from_cart(cart: &Cart) -> Result<Self, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let items: Vec<OrderLine> = cart
            .lines()
            .iter()
            .map(|line| OrderLine {
                product_id: line.product.id,
                name: line.product.name.clone(),
                unit_price: line.product.discounted_price(),
                quantity: line.quantity,
                image_url: line.product.image_url.clone(),
                line_total: line.line_total(),
            })
            .collect();

        let subtotal = items.iter().map(|l| l.line_total).fold(0, i64::saturating_add);
        let gst = surcharge(subtotal);
        let total = subtotal.saturating_add(gst);

        if total < MIN_ORDER_TOTAL {
            return Err(CheckoutError::BelowMinimum {
                total,
                minimum: MIN_ORDER_TOTAL,
            });
        }

        Ok(Self {
            items,
            subtotal,
            gst,
            total,
        })
    }

    /// Re-checks a draft received over the wire before it is stored.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found; see [`CheckoutError`].
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        for line in &self.items {
            if line.quantity <= 0 {
                return Err(CheckoutError::InconsistentTotals(format!(
                    "product {} has quantity {}",
                    line.product_id, line.quantity
                )));
            }
            if line.unit_price.checked_mul(line.quantity) != Some(line.line_total) {
                return Err(CheckoutError::InconsistentTotals(format!(
                    "product {} line total {} != {} x {}",
                    line.product_id, line.line_total, line.unit_price, line.quantity
                )));
            }
        }

        let subtotal = self
            .items
            .iter()
            .map(|l| l.line_total)
            .fold(0, i64::saturating_add);
        if subtotal != self.subtotal {
            return Err(CheckoutError::InconsistentTotals(format!(
                "subtotal {} != sum of lines {subtotal}",
                self.subtotal
            )));
        }
        let gst = surcharge(subtotal);
        if gst != self.gst {
            return Err(CheckoutError::InconsistentTotals(format!(
                "gst {} != {gst}",
                self.gst
            )));
        }
        let total = subtotal.saturating_add(gst);
        if self.total != total {
            return Err(CheckoutError::InconsistentTotals(format!(
                "total {} != {total}",
                self.total
            )));
        }
        if self.total < MIN_ORDER_TOTAL {
            return Err(CheckoutError::BelowMinimum {
                total: self.total,
                minimum: MIN_ORDER_TOTAL,
            });
        }
        Ok(())
    }
}

/// A stored order. Orders are never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub items: Vec<OrderLine>,
    pub subtotal: i64,
    pub gst: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}
