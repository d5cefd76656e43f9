//! Checkout handoff: the prefilled WhatsApp message and invoice link.

use std::fmt::Write as _;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use uuid::Uuid;

use crate::orders::OrderDraft;

/// Characters escaped in a URI component: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes `value` for use as a single query parameter value.
#[must_use]
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Public invoice page for an order.
#[must_use]
pub fn invoice_url(public_base_url: &str, order_id: Uuid) -> String {
    format!("{}/order/{order_id}", public_base_url.trim_end_matches('/'))
}

/// The order summary sent to the shop over WhatsApp.
#[must_use]
pub fn order_message(draft: &OrderDraft, invoice_link: &str) -> String {
    let mut msg = String::from("*Order Details*\n\n");
    for (i, line) in draft.items.iter().enumerate() {
        let _ = writeln!(msg, "{}. *{}*", i + 1, line.name);
        let _ = writeln!(msg, "Qty: {}", line.quantity);
        let _ = writeln!(msg, "Price: ₹{}", line.unit_price);
        let _ = writeln!(msg, "Subtotal: ₹{}", line.line_total);
        msg.push('\n');
    }
    msg.push_str("--------------------\n");
    let _ = writeln!(msg, "Total: ₹{}", draft.subtotal);
    let _ = writeln!(msg, "GST(5%): ₹{}", draft.gst);
    let _ = writeln!(msg, "Grand Total: ₹{}", draft.total);
    let _ = writeln!(msg, "Invoice: {invoice_link}");
    msg.push_str("Please send this message to confirm your order.");
    msg
}

/// `wa.me` deep link with a prefilled message. Non-digits in the number
/// (spaces, `+`, dashes) are dropped.
#[must_use]
pub fn whatsapp_link(number: &str, message: &str) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    format!(
        "https://wa.me/{digits}?text={}",
        encode_component(message)
    )
}
