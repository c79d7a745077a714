//! Order repository (back-office operations).
//!
//! Checkout itself lives in the storefront; here orders are listed, edited
//! by staff, and occasionally entered by hand.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use acsess_core::{DeliveryStatus, Email, OrderId, OrderStatus, Price, ProductId, UserId};

use super::RepositoryError;
use super::users::find_or_create_client;
use crate::models::{DeliveryInfo, OrderDetail, OrderItemLine, OrderStatusCounts, OrderSummary};

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: i32,
    customer: String,
    email: String,
    phone: Option<String>,
    total: Price,
    status: OrderStatus,
    date: DateTime<Utc>,
    items: i64,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            customer: row.customer,
            email: row.email,
            phone: row.phone,
            total: row.total,
            status: row.status,
            date: row.date,
            items: row.items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderHeaderRow {
    id: i32,
    user_id: i32,
    customer: String,
    email: String,
    phone: Option<String>,
    status: OrderStatus,
    total: Price,
    created_at: DateTime<Utc>,
    address: Option<String>,
    delivery_status: Option<DeliveryStatus>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: i32,
    product_name: String,
    quantity: i32,
    price: Price,
}

const SELECT_SUMMARY: &str = r"
    SELECT o.id, u.name AS customer, u.email, u.phone, o.total_price AS total,
           o.status, o.created_at AS date,
           (SELECT COUNT(*) FROM order_item i WHERE i.order_id = o.id) AS items
    FROM customer_order o
    JOIN app_user u ON u.id = o.user_id
";

/// Fields staff may set on an order.
#[derive(Debug, Clone)]
pub struct OrderEdit<'a> {
    pub customer_name: &'a str,
    pub customer_email: &'a Email,
    pub customer_phone: Option<&'a str>,
    pub status: OrderStatus,
    pub total: Price,
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<OrderSummary>, RepositoryError> {
        self.summaries(None).await
    }

    /// The most recent orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<OrderSummary>, RepositoryError> {
        self.summaries(Some(limit)).await
    }

    async fn summaries(&self, limit: Option<i64>) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&format!(
            "{SELECT_SUMMARY} ORDER BY o.created_at DESC, o.id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Full order with items and delivery.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(header) = sqlx::query_as::<_, OrderHeaderRow>(
            r"
            SELECT o.id, o.user_id, u.name AS customer, u.email, u.phone, o.status,
                   o.total_price AS total, o.created_at,
                   d.address, d.status AS delivery_status
            FROM customer_order o
            JOIN app_user u ON u.id = o.user_id
            LEFT JOIN delivery d ON d.order_id = o.id
            WHERE o.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT i.product_id, p.name AS product_name, i.quantity, i.price
            FROM order_item i
            JOIN product p ON p.id = i.product_id
            WHERE i.order_id = $1
            ORDER BY i.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let delivery = match (header.address, header.delivery_status) {
            (Some(address), Some(status)) => Some(DeliveryInfo { address, status }),
            _ => None,
        };

        Ok(Some(OrderDetail {
            id: OrderId::new(header.id),
            user_id: UserId::new(header.user_id),
            customer: header.customer,
            email: header.email,
            phone: header.phone,
            status: header.status,
            total: header.total,
            created_at: header.created_at,
            items: items
                .into_iter()
                .map(|row| OrderItemLine {
                    product_id: ProductId::new(row.product_id),
                    product_name: row.product_name,
                    quantity: row.quantity,
                    price: row.price,
                })
                .collect(),
            delivery,
        }))
    }

    /// Record an order taken outside the storefront (phone, in person).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a write fails.
    pub async fn create_manual(&self, edit: &OrderEdit<'_>) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user_id = find_or_create_client(
            &mut tx,
            edit.customer_name,
            edit.customer_email,
            edit.customer_phone,
        )
        .await?;

        let id = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO customer_order (user_id, status, total_price)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(edit.status)
        .bind(edit.total)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(OrderId::new(id))
    }

    /// Update an order and its customer's contact details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist, or
    /// `RepositoryError::Conflict` if the new email belongs to another customer.
    pub async fn update(&self, id: OrderId, edit: &OrderEdit<'_>) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query_scalar::<_, i32>(
            r"
            UPDATE customer_order
            SET status = $2, total_price = $3, updated_at = now()
            WHERE id = $1
            RETURNING user_id
            ",
        )
        .bind(id)
        .bind(edit.status)
        .bind(edit.total)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            r"
            UPDATE app_user
            SET name = $2, email = $3, phone = $4, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .bind(edit.customer_name)
        .bind(edit.customer_email)
        .bind(edit.customer_phone)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email belongs to another customer"))?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete an order; items and delivery cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM customer_order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Count orders per status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn status_counts(&self) -> Result<OrderStatusCounts, RepositoryError> {
        let rows = sqlx::query_as::<_, (OrderStatus, i64)>(
            "SELECT status, COUNT(*) FROM customer_order GROUP BY status",
        )
        .fetch_all(self.pool)
        .await?;

        let mut counts = OrderStatusCounts::default();
        for (status, count) in rows {
            counts.record(status, count);
        }
        Ok(counts)
    }
}
