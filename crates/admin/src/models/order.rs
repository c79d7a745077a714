//! Orders as shown in the back office.

use chrono::{DateTime, Utc};
use serde::Serialize;

use acsess_core::{DeliveryStatus, OrderId, OrderStatus, Price, ProductId, UserId};

/// Row of the order list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer: String,
    pub email: String,
    pub phone: Option<String>,
    pub total: Price,
    pub status: OrderStatus,
    pub date: DateTime<Utc>,
    /// Number of order lines
    pub items: i64,
}

/// One line of an order, priced at the time of purchase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price: Price,
}

impl OrderItemLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(u32::try_from(self.quantity).unwrap_or(0))
    }
}

/// Shipping information attached to an order.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryInfo {
    pub address: String,
    pub status: DeliveryStatus,
}

/// Full order view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: OrderStatus,
    pub total: Price,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemLine>,
    pub delivery: Option<DeliveryInfo>,
}

/// Order counts per status for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderStatusCounts {
    pub new: i64,
    pub processing: i64,
    pub completed: i64,
    pub canceled: i64,
}

impl OrderStatusCounts {
    pub fn record(&mut self, status: OrderStatus, count: i64) {
        match status {
            OrderStatus::New => self.new += count,
            OrderStatus::Processing => self.processing += count,
            OrderStatus::Completed => self.completed += count,
            OrderStatus::Canceled => self.canceled += count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_counts_record() {
        let mut counts = OrderStatusCounts::default();
        counts.record(OrderStatus::New, 3);
        counts.record(OrderStatus::Canceled, 1);
        counts.record(OrderStatus::New, 2);
        assert_eq!(
            counts,
            OrderStatusCounts {
                new: 5,
                processing: 0,
                completed: 0,
                canceled: 1
            }
        );
    }

    #[test]
    fn test_line_total() {
        let line = OrderItemLine {
            product_id: ProductId::new(1),
            product_name: "Серьги".to_string(),
            quantity: 3,
            price: Price::from_kopecks(12_050),
        };
        assert_eq!(line.line_total(), Price::from_kopecks(36_150));
    }
}
