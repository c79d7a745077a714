//! Session cart.
//!
//! The cart is stored in the tower-sessions session as a list of
//! `(product, quantity)` lines. Every read reprices it against the catalog;
//! lines for removed or sold-out products are dropped and quantities are
//! capped at the stock on hand.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use acsess_core::ProductId;

use super::orders::{self, CustomerDetails, OrderResponse};
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::models::{Cart, CartView, session_keys};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: ProductId,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub product_id: ProductId,
}

async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Price the cart and persist any corrections.
async fn reconcile(state: &AppState, session: &Session, cart: &Cart) -> Result<(CartView, Cart)> {
    if cart.is_empty() {
        return Ok(cart.reconcile(&[]));
    }
    let products = ProductRepository::new(state.pool())
        .by_ids(&cart.product_ids())
        .await?;
    let (view, cleaned) = cart.reconcile(&products);
    if cleaned != *cart {
        save_cart(session, &cleaned).await?;
    }
    Ok((view, cleaned))
}

async fn reconciled(state: &AppState, session: &Session, cart: &Cart) -> Result<CartView> {
    Ok(reconcile(state, session, cart).await?.0)
}

fn quantity(raw: Option<i64>, default: u32) -> Result<u32> {
    raw.map_or(Ok(default), |q| {
        u32::try_from(q).map_err(|_| AppError::BadRequest(format!("Invalid quantity: {q}")))
    })
}

/// GET /api/cart
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(reconciled(&state, &session, &cart).await?))
}

/// POST /api/cart/add
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let quantity = quantity(body.quantity, 1)?;
    if quantity == 0 {
        return Err(AppError::BadRequest("Quantity must be at least 1".to_string()));
    }

    let product = ProductRepository::new(state.pool())
        .get(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    if !product.in_stock {
        return Err(AppError::BadRequest(format!(
            "\"{}\" is out of stock",
            product.name
        )));
    }

    let mut cart = load_cart(&session).await?;
    cart.add(product.id, quantity);
    save_cart(&session, &cart).await?;

    tracing::debug!(product_id = %product.id, quantity, "Added to cart");
    Ok(Json(reconciled(&state, &session, &cart).await?))
}

/// POST /api/cart/update
///
/// A quantity of 0 removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CartItemRequest>,
) -> Result<Json<CartView>> {
    let quantity = quantity(body.quantity, 0)?;

    let mut cart = load_cart(&session).await?;
    cart.set_quantity(body.product_id, quantity);
    save_cart(&session, &cart).await?;

    Ok(Json(reconciled(&state, &session, &cart).await?))
}

/// POST /api/cart/remove
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<RemoveRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(body.product_id) {
        save_cart(&session, &cart).await?;
    }
    Ok(Json(reconciled(&state, &session, &cart).await?))
}

/// DELETE /api/cart
pub async fn clear(session: Session) -> Result<Json<Value>> {
    session.remove::<Cart>(session_keys::CART).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/cart/count
pub async fn count(session: Session) -> Result<Json<Value>> {
    let cart = load_cart(&session).await?;
    Ok(Json(json!({ "count": cart.item_count() })))
}

/// POST /api/cart/checkout
///
/// Places an order for the reconciled cart and empties it on success.
#[instrument(skip(state, session, body))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CustomerDetails>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let cart = load_cart(&session).await?;
    let (_, cart) = reconcile(&state, &session, &cart).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    let items = cart
        .order_lines()
        .into_iter()
        .map(|l| (l.product_id, i64::from(l.quantity)))
        .collect();
    let placed = orders::place(&state, &body.form(items)).await?;

    session.remove::<Cart>(session_keys::CART).await?;
    Ok((StatusCode::CREATED, Json(placed.into())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_parsing() {
        assert_eq!(quantity(None, 1).ok(), Some(1));
        assert_eq!(quantity(Some(3), 1).ok(), Some(3));
        assert_eq!(quantity(Some(0), 1).ok(), Some(0));
        assert!(quantity(Some(-1), 1).is_err());
    }
}
