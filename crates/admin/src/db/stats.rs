//! Dashboard aggregates.

use serde::Serialize;
use sqlx::PgPool;

use acsess_core::{Price, ProductId};

use super::RepositoryError;

/// Totals plus the share created in the last 30 days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub orders: i64,
    pub new_orders: i64,
    pub clients: i64,
    pub new_clients: i64,
    pub products: i64,
    pub new_products: i64,
}

/// A best-selling product.
#[derive(Debug, Clone, Serialize)]
pub struct PopularProduct {
    pub id: ProductId,
    pub name: String,
    /// Units sold
    pub sales: i64,
    pub revenue: Price,
}

#[derive(Debug, sqlx::FromRow)]
struct PopularProductRow {
    id: i32,
    name: String,
    sales: i64,
    revenue: Price,
}

pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dashboard(&self) -> Result<DashboardStats, RepositoryError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r"
            SELECT
                (SELECT COUNT(*) FROM customer_order) AS orders,
                (SELECT COUNT(*) FROM customer_order
                    WHERE created_at >= now() - interval '30 days') AS new_orders,
                (SELECT COUNT(*) FROM app_user WHERE role = 'client') AS clients,
                (SELECT COUNT(*) FROM app_user
                    WHERE role = 'client' AND created_at >= now() - interval '30 days') AS new_clients,
                (SELECT COUNT(*) FROM product) AS products,
                (SELECT COUNT(*) FROM product
                    WHERE created_at >= now() - interval '30 days') AS new_products
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }

    /// Products ranked by number of order lines. Products never ordered are
    /// left out.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn popular_products(&self, limit: i64) -> Result<Vec<PopularProduct>, RepositoryError> {
        let rows = sqlx::query_as::<_, PopularProductRow>(
            r"
            SELECT p.id, p.name,
                   COALESCE(SUM(i.quantity), 0)::BIGINT AS sales,
                   COALESCE(SUM(i.quantity * i.price), 0)::NUMERIC AS revenue
            FROM product p
            JOIN order_item i ON i.product_id = p.id
            GROUP BY p.id, p.name
            ORDER BY COUNT(i.id) DESC, sales DESC, p.id
            LIMIT $1
            ",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| PopularProduct {
                id: ProductId::new(row.id),
                name: row.name,
                sales: row.sales,
                revenue: row.revenue,
            })
            .collect())
    }
}
