use std::fmt::Write as _;

use crate::orders::Order;

/// Renders an order as a printable plain-text invoice.
#[must_use]
pub fn render_invoice(order: &Order) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "J K Sarees - Order Invoice");
    let _ = writeln!(out, "Order: {}", order.id);
    let _ = writeln!(out, "Date:  {}", order.created_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(out, "{}", "-".repeat(48));

    for item in &order.items {
        let _ = writeln!(out, "{}", item.name);
        let _ = writeln!(
            out,
            "  Qty: {} x ₹{}{:>width$}",
            item.quantity,
            item.unit_price,
            format!("₹{}", item.line_total),
            width = 24
        );
    }

    let _ = writeln!(out, "{}", "-".repeat(48));
    let _ = writeln!(out, "Subtotal:    ₹{}", order.subtotal);
    let _ = writeln!(out, "GST:         ₹{}", order.gst);
    let _ = writeln!(out, "Grand Total: ₹{}", order.total);
    out
}
