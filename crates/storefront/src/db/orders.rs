//! Order writes used by checkout.
//!
//! Every function runs on the caller's connection: checkout wraps them in one
//! transaction so stock, order rows and the admin notification commit
//! together or not at all.

use sqlx::PgConnection;

use acsess_core::{NotificationKind, OrderId, OrderStatus, Price, ProductId, UserId};

use super::RepositoryError;

/// Current price and stock of a product, read under a row lock.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub stock: i32,
}

/// Lock the given products until the transaction ends.
///
/// Rows are locked in id order so concurrent checkouts cannot deadlock.
pub(crate) async fn lock_products(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<LockedProduct>, RepositoryError> {
    let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
    let rows = sqlx::query_as::<_, LockedProduct>(
        r"
        SELECT id, name, price, stock
        FROM product
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(ids)
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub(crate) async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    total: Price,
) -> Result<OrderId, RepositoryError> {
    let id = sqlx::query_scalar::<_, i32>(
        r"
        INSERT INTO customer_order (user_id, status, total_price)
        VALUES ($1, $2, $3)
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(OrderStatus::New)
    .bind(total)
    .fetch_one(conn)
    .await?;
    Ok(OrderId::new(id))
}

pub(crate) async fn insert_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Price,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO order_item (order_id, product_id, quantity, price)
        VALUES ($1, $2, $3, $4)
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .execute(conn)
    .await?;
    Ok(())
}

/// Take units out of stock.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if fewer units remain than requested.
pub(crate) async fn decrement_stock(
    conn: &mut PgConnection,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE product SET stock = stock - $2, updated_at = now() WHERE id = $1 AND stock >= $2",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(format!(
            "insufficient stock for product {product_id}"
        )));
    }
    Ok(())
}

pub(crate) async fn insert_delivery(
    conn: &mut PgConnection,
    order_id: OrderId,
    address: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("INSERT INTO delivery (order_id, address) VALUES ($1, $2)")
        .bind(order_id)
        .bind(address)
        .execute(conn)
        .await?;
    Ok(())
}

pub(crate) async fn insert_notification(
    conn: &mut PgConnection,
    title: &str,
    message: &str,
    kind: NotificationKind,
) -> Result<(), RepositoryError> {
    sqlx::query("INSERT INTO notification (title, message, kind) VALUES ($1, $2, $3)")
        .bind(title)
        .bind(message)
        .bind(kind)
        .execute(conn)
        .await?;
    Ok(())
}
