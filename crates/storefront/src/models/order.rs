//! Checkout input and result.

use serde::Serialize;

use acsess_core::{Email, OrderId, PhoneNumber, Price, ProductId};

/// One requested product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A validated order, ready to be placed.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub email: Email,
    pub phone: PhoneNumber,
    pub address: Option<String>,
    /// One entry per product, duplicates merged.
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total: Price,
}
