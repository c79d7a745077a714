//! Order management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use acsess_core::{Email, OrderId, OrderStatus, Price};

use super::Numeric;
use crate::db::orders::OrderEdit;
use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::models::catalog::non_blank;
use crate::models::{OrderDetail, OrderStatusCounts, OrderSummary};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub status: Option<String>,
    pub total: Option<Numeric>,
}

struct ValidOrder {
    name: String,
    email: Email,
    phone: Option<String>,
    status: OrderStatus,
    total: Price,
}

impl ValidOrder {
    fn edit(&self) -> OrderEdit<'_> {
        OrderEdit {
            customer_name: &self.name,
            customer_email: &self.email,
            customer_phone: self.phone.as_deref(),
            status: self.status,
            total: self.total,
        }
    }
}

impl OrderRequest {
    fn validate(self) -> Result<ValidOrder> {
        let name = self.customer_name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Customer name is required".to_string()));
        }
        let email = Email::parse(&self.customer_email)
            .map_err(|e| AppError::BadRequest(format!("Invalid customer email: {e}")))?;
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => OrderStatus::default(),
            Some(raw) => raw.parse().map_err(AppError::BadRequest)?,
        };
        let total = match &self.total {
            None => Price::default(),
            Some(n) => Price::new(n.to_decimal().map_err(AppError::BadRequest)?)
                .map_err(|e| AppError::BadRequest(format!("Invalid total: {e}")))?,
        };

        Ok(ValidOrder {
            name: name.to_string(),
            email,
            phone: non_blank(self.customer_phone.as_deref()),
            status,
            total,
        })
    }
}

fn order_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Order not found".to_string()),
        other => other.into(),
    }
}

/// GET /api/admin/orders
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<OrderSummary>>> {
    Ok(Json(OrderRepository::new(state.pool()).list().await?))
}

/// GET /api/admin/orders/{id}
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<OrderDetail>> {
    OrderRepository::new(state.pool())
        .get(OrderId::new(id))
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

/// POST /api/admin/orders
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<OrderRequest>,
) -> Result<impl IntoResponse> {
    let order = body.validate()?;
    let id = OrderRepository::new(state.pool())
        .create_manual(&order.edit())
        .await?;

    tracing::info!(id = %id, status = %order.status, "Manual order created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "Order created" })),
    ))
}

/// PUT /api/admin/orders/{id}
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<OrderRequest>,
) -> Result<impl IntoResponse> {
    let order = body.validate()?;
    OrderRepository::new(state.pool())
        .update(OrderId::new(id), &order.edit())
        .await
        .map_err(order_not_found)?;

    tracing::info!(id, status = %order.status, "Order updated");
    Ok(Json(json!({ "id": id, "message": "Order updated" })))
}

/// DELETE /api/admin/orders/{id}
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse> {
    OrderRepository::new(state.pool())
        .delete(OrderId::new(id))
        .await
        .map_err(order_not_found)?;

    tracing::info!(id, "Order deleted");
    Ok(Json(json!({ "message": "Order deleted" })))
}

/// GET /api/admin/orders/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<OrderStatusCounts>> {
    Ok(Json(OrderRepository::new(state.pool()).status_counts().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, status: Option<&str>) -> OrderRequest {
        OrderRequest {
            customer_name: "Анна".to_string(),
            customer_email: email.to_string(),
            customer_phone: Some("  ".to_string()),
            status: status.map(ToString::to_string),
            total: Some(Numeric::Text("1500,50".to_string())),
        }
    }

    #[test]
    fn test_validate_defaults_and_cleans() {
        let order = request("Anna@Example.com", None).validate().ok();
        let order = order.as_ref().map(|o| (o.email.as_str(), o.status, o.phone.clone()));
        assert_eq!(
            order,
            Some(("anna@example.com", OrderStatus::New, None))
        );
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        assert!(request("not-an-email", None).validate().is_err());
        assert!(request("a@b.co", Some("shipped")).validate().is_err());
        assert!(request("a@b.co", Some("cancelled")).validate().is_ok());
    }
}
