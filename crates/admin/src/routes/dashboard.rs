//! Dashboard counters and top lists.

use axum::extract::State;

use crate::db::stats::{DashboardStats, PopularProduct};
use crate::db::{OrderRepository, StatsRepository};
use crate::error::Result;
use crate::extract::Json;
use crate::models::OrderSummary;
use crate::state::AppState;

const TOP_LIMIT: i64 = 5;

/// GET /api/admin/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    Ok(Json(StatsRepository::new(state.pool()).dashboard().await?))
}

/// GET /api/admin/recent-orders
pub async fn recent_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderSummary>>> {
    Ok(Json(
        OrderRepository::new(state.pool()).recent(TOP_LIMIT).await?,
    ))
}

/// GET /api/admin/popular-products
///
/// Products that never sold are left out.
pub async fn popular_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<PopularProduct>>> {
    Ok(Json(
        StatsRepository::new(state.pool())
            .popular_products(TOP_LIMIT)
            .await?,
    ))
}
