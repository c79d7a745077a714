//! Order submission.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use acsess_core::{OrderId, Price, ProductId};

use crate::error::{Result, add_breadcrumb};
use crate::extract::Json;
use crate::models::PlacedOrder;
use crate::services::{CheckoutService, OrderForm};
use crate::state::AppState;

/// Contact details shared by direct orders and cart checkout.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    #[serde(default)]
    pub customer_name: String,
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: String,
    pub customer_address: Option<String>,
}

impl CustomerDetails {
    pub(crate) fn form(&self, items: Vec<(ProductId, i64)>) -> OrderForm<'_> {
        OrderForm {
            customer_name: &self.customer_name,
            customer_email: self.customer_email.as_deref(),
            customer_phone: &self.customer_phone,
            customer_address: self.customer_address.as_deref(),
            items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    #[serde(flatten)]
    pub customer: CustomerDetails,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub status: &'static str,
    pub message: String,
    pub total: Price,
}

impl From<PlacedOrder> for OrderResponse {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            order_id: placed.order_id,
            status: "success",
            message: format!("Order #{} has been placed", placed.order_id),
            total: placed.total,
        }
    }
}

/// Validate and place an order.
pub(crate) async fn place(state: &AppState, form: &OrderForm<'_>) -> Result<PlacedOrder> {
    let order = form.validate()?;
    let placed = CheckoutService::new(state.pool()).place(&order).await?;

    let order_id = placed.order_id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", &order_id)]));
    Ok(placed)
}

/// POST /api/orders
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<OrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let items = body.items.iter().map(|i| (i.id, i.quantity)).collect();
    let placed = place(&state, &body.customer.form(items)).await?;
    Ok((StatusCode::CREATED, Json(placed.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body: OrderRequest = serde_json::from_str(
            r#"{
                "customerName": "Ольга",
                "customerPhone": "+7 900 000 00 00",
                "customerAddress": "Москва",
                "items": [{"id": 3, "quantity": 2}]
            }"#,
        )
        .unwrap_or_else(|_| OrderRequest {
            customer: CustomerDetails::default(),
            items: Vec::new(),
        });

        assert_eq!(body.customer.customer_name, "Ольга");
        assert_eq!(body.customer.customer_email, None);
        assert_eq!(body.items.len(), 1);

        let form = body.customer.form(vec![(body.items[0].id, body.items[0].quantity)]);
        assert_eq!(form.items, vec![(ProductId::new(3), 2)]);
        assert_eq!(form.customer_address, Some("Москва"));
    }
}
