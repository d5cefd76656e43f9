use serde::Serialize;

use crate::products::Product;

/// One product in the cart with its quantity.
///
/// The product is a snapshot taken when it was added; later catalog
/// refreshes do not reprice lines already in the cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i64,
}

impl CartLine {
    /// Unit price after discount times quantity.
    #[must_use]
    pub fn line_total(&self) -> i64 {
        self.product.discounted_price().saturating_mul(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Increase,
    Decrease,
}

/// Shopping cart, unique per product id, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `product` with its minimum quantity. Returns `false` and leaves
    /// the cart untouched when the product is already present.
    pub fn add(&mut self, product: &Product) -> bool {
        if self.contains(product.id) {
            return false;
        }
        self.lines.push(CartLine {
            quantity: product.quantity_step(),
            product: product.clone(),
        });
        true
    }

    /// Moves a line by one minimum-quantity step. A line that reaches zero
    /// is removed. Unknown ids are ignored.
    pub fn update_quantity(&mut self, product_id: i64, change: QuantityChange) {
        let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) else {
            return;
        };
        let step = line.product.quantity_step();
        line.quantity = match change {
            QuantityChange::Increase => line.quantity.saturating_add(step),
            QuantityChange::Decrease => (line.quantity - step).max(0),
        };
        self.lines.retain(|l| l.quantity > 0);
    }

    pub fn remove(&mut self, product_id: i64) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn contains(&self, product_id: i64) -> bool {
        self.lines.iter().any(|l| l.product.id == product_id)
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of line totals, before GST.
    #[must_use]
    pub fn subtotal(&self) -> i64 {
        self.lines
            .iter()
            .map(CartLine::line_total)
            .fold(0, i64::saturating_add)
    }
}
