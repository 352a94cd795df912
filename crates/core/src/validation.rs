//! Schema checks for the two mutating endpoints.
//!
//! Payloads arrive as raw JSON so that wrong-typed fields surface as field
//! errors rather than deserialization failures. Failures are returned as
//! data; nothing here panics or performs I/O.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::domain::order::OrderId;
use crate::domain::product::ProductId;
use crate::errors::FieldErrors;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddToCartPayload {
    pub product_id: ProductId,
    pub qty: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderStatusPayload {
    pub order_id: OrderId,
    pub email: String,
}

fn order_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^ORD-\d{4}$").expect("static pattern"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static pattern"))
}

fn push_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors.entry(field.to_owned()).or_default().push(message.to_owned());
}

/// `productId` must be a non-empty string, `qty` an integer >= 1.
pub fn parse_add_to_cart(payload: &Value) -> Result<AddToCartPayload, FieldErrors> {
    let mut errors = FieldErrors::new();

    let product_id = match payload.get("productId").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Some(ProductId(id.to_owned())),
        _ => {
            push_error(&mut errors, "productId", "Product ID is required.");
            None
        }
    };

    let qty = match payload.get("qty").and_then(Value::as_u64) {
        Some(qty) if qty >= 1 && qty <= u64::from(u32::MAX) => Some(qty as u32),
        _ => {
            push_error(&mut errors, "qty", "Quantity must be at least 1.");
            None
        }
    };

    match (product_id, qty) {
        (Some(product_id), Some(qty)) if errors.is_empty() => {
            Ok(AddToCartPayload { product_id, qty })
        }
        _ => Err(errors),
    }
}

/// `orderId` must match `ORD-` + 4 digits exactly, `email` must be a
/// syntactically plausible local@domain address.
pub fn parse_order_status(payload: &Value) -> Result<OrderStatusPayload, FieldErrors> {
    let mut errors = FieldErrors::new();

    let order_id = match payload.get("orderId").and_then(Value::as_str) {
        Some(id) if order_id_pattern().is_match(id) => Some(OrderId(id.to_owned())),
        _ => {
            push_error(&mut errors, "orderId", "Invalid Order ID format.");
            None
        }
    };

    let email = match payload.get("email").and_then(Value::as_str) {
        Some(email) if email_pattern().is_match(email) => Some(email.to_owned()),
        _ => {
            push_error(&mut errors, "email", "Invalid email address.");
            None
        }
    };

    match (order_id, email) {
        (Some(order_id), Some(email)) if errors.is_empty() => {
            Ok(OrderStatusPayload { order_id, email })
        }
        _ => Err(errors),
    }
}
