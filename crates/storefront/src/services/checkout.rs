//! Order placement.
//!
//! An order is validated first, then placed in a single transaction: the
//! product rows are locked, stock is checked for every line, and only then
//! are the order, its items, the stock decrement, the delivery row and the
//! admin notification written. Any failure rolls everything back.

use std::collections::BTreeMap;

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use acsess_core::{Email, EmailError, NotificationKind, PhoneError, PhoneNumber, Price, ProductId};

use crate::db::RepositoryError;
use crate::db::orders::{self, LockedProduct};
use crate::db::users;
use crate::models::{NewOrder, OrderLine, PlacedOrder};

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] PhoneError),

    #[error("order has no items")]
    EmptyOrder,

    #[error("invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("not enough stock for \"{product}\": {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: i32,
        requested: u32,
    },

    #[error("order total exceeds the allowed maximum")]
    TotalTooLarge,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(e.into())
    }
}

/// Checkout form as received from the client.
#[derive(Debug, Clone, Default)]
pub struct OrderForm<'a> {
    pub customer_name: &'a str,
    pub customer_email: Option<&'a str>,
    pub customer_phone: &'a str,
    pub customer_address: Option<&'a str>,
    /// Requested `(product, quantity)` pairs, possibly repeating a product.
    pub items: Vec<(ProductId, i64)>,
}

impl OrderForm<'_> {
    /// Check required fields and normalize the order.
    ///
    /// Without an email the customer is identified by a placeholder address
    /// derived from the phone number. Repeated products are merged.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure found.
    pub fn validate(&self) -> Result<NewOrder, OrderError> {
        let customer_name = self.customer_name.trim();
        if customer_name.is_empty() {
            return Err(OrderError::MissingField("customerName"));
        }
        if self.customer_phone.trim().is_empty() {
            return Err(OrderError::MissingField("customerPhone"));
        }
        let phone = PhoneNumber::parse(self.customer_phone)?;

        let email = match self.customer_email.map(str::trim).filter(|e| !e.is_empty()) {
            Some(raw) => Email::parse(raw)?,
            None => Email::guest_for_phone(&phone),
        };

        if self.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        let mut merged: BTreeMap<ProductId, u32> = BTreeMap::new();
        for &(product_id, quantity) in &self.items {
            let invalid = || OrderError::InvalidQuantity {
                product_id,
                quantity,
            };
            let qty = u32::try_from(quantity)
                .ok()
                .filter(|q| *q >= 1 && i32::try_from(*q).is_ok())
                .ok_or_else(invalid)?;
            let entry = merged.entry(product_id).or_default();
            *entry = entry
                .checked_add(qty)
                .filter(|q| i32::try_from(*q).is_ok())
                .ok_or_else(invalid)?;
        }

        Ok(NewOrder {
            customer_name: customer_name.to_string(),
            email,
            phone,
            address: self
                .customer_address
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(ToString::to_string),
            lines: merged
                .into_iter()
                .map(|(product_id, quantity)| OrderLine {
                    product_id,
                    quantity,
                })
                .collect(),
        })
    }
}

/// Check every line against the locked rows and price the order.
///
/// Returns the unit price per line and the order total.
fn price_lines(
    lines: &[OrderLine],
    locked: &[LockedProduct],
) -> Result<(Vec<Price>, Price), OrderError> {
    let mut unit_prices = Vec::with_capacity(lines.len());
    for line in lines {
        let product = locked
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or(OrderError::ProductNotFound(line.product_id))?;
        let available = u32::try_from(product.stock).unwrap_or(0);
        if available < line.quantity {
            return Err(OrderError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: line.quantity,
            });
        }
        unit_prices.push(product.price);
    }

    let total: Price = lines
        .iter()
        .zip(&unit_prices)
        .map(|(line, price)| price.times(line.quantity))
        .sum();
    if total.amount() > Price::max_amount() {
        return Err(OrderError::TotalTooLarge);
    }
    Ok((unit_prices, total))
}

pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place a validated order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::ProductNotFound` or `OrderError::InsufficientStock`
    /// when a line cannot be fulfilled; nothing is written in that case.
    #[instrument(skip_all, fields(lines = order.lines.len(), phone = %order.phone.masked()))]
    pub async fn place(&self, order: &NewOrder) -> Result<PlacedOrder, OrderError> {
        if order.lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        let ids: Vec<ProductId> = order.lines.iter().map(|l| l.product_id).collect();

        let mut tx = self.pool.begin().await?;

        let locked = orders::lock_products(&mut tx, &ids).await?;
        let (unit_prices, total) = price_lines(&order.lines, &locked)?;

        let user_id = users::find_or_create_client(
            &mut tx,
            &order.customer_name,
            &order.email,
            Some(order.phone.as_str()),
        )
        .await?;
        let order_id = orders::insert_order(&mut tx, user_id, total).await?;

        for (line, unit_price) in order.lines.iter().zip(unit_prices) {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                OrderError::InvalidQuantity {
                    product_id: line.product_id,
                    quantity: i64::from(line.quantity),
                }
            })?;
            orders::insert_item(&mut tx, order_id, line.product_id, quantity, unit_price).await?;
            orders::decrement_stock(&mut tx, line.product_id, quantity).await?;
        }

        if let Some(address) = &order.address {
            orders::insert_delivery(&mut tx, order_id, address).await?;
        }

        orders::insert_notification(
            &mut tx,
            "New order",
            &format!(
                "Order #{order_id} from {} for {}",
                order.customer_name,
                total.display()
            ),
            NotificationKind::Info,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %order_id, total = %total, user_id = %user_id, "Order placed");
        Ok(PlacedOrder { order_id, total })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn form(items: Vec<(ProductId, i64)>) -> OrderForm<'static> {
        OrderForm {
            customer_name: " Мария ",
            customer_email: None,
            customer_phone: "+7 (900) 123-45-67",
            customer_address: Some("   "),
            items,
        }
    }

    fn locked(id: i32, price: i64, stock: i32) -> LockedProduct {
        LockedProduct {
            id: ProductId::new(id),
            name: format!("Серьги {id}"),
            price: Price::new(Decimal::new(price, 0)).unwrap(),
            stock,
        }
    }

    #[test]
    fn test_validate_merges_lines_and_derives_guest_email() {
        let order = form(vec![
            (ProductId::new(2), 1),
            (ProductId::new(1), 2),
            (ProductId::new(2), 3),
        ])
        .validate()
        .unwrap();

        assert_eq!(order.customer_name, "Мария");
        assert_eq!(order.email.as_str(), "79001234567@temp.local");
        assert_eq!(order.address, None);
        assert_eq!(
            order.lines,
            vec![
                OrderLine {
                    product_id: ProductId::new(1),
                    quantity: 2
                },
                OrderLine {
                    product_id: ProductId::new(2),
                    quantity: 4
                },
            ]
        );
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let mut f = form(vec![(ProductId::new(1), 1)]);
        f.customer_name = "  ";
        assert!(matches!(
            f.validate(),
            Err(OrderError::MissingField("customerName"))
        ));

        let mut f = form(vec![(ProductId::new(1), 1)]);
        f.customer_phone = "";
        assert!(matches!(
            f.validate(),
            Err(OrderError::MissingField("customerPhone"))
        ));

        assert!(matches!(form(vec![]).validate(), Err(OrderError::EmptyOrder)));
    }

    #[test]
    fn test_validate_rejects_bad_quantities_and_contacts() {
        assert!(matches!(
            form(vec![(ProductId::new(1), 0)]).validate(),
            Err(OrderError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            form(vec![(ProductId::new(1), -2)]).validate(),
            Err(OrderError::InvalidQuantity { .. })
        ));

        let mut f = form(vec![(ProductId::new(1), 1)]);
        f.customer_phone = "12-34";
        assert!(matches!(f.validate(), Err(OrderError::InvalidPhone(_))));

        let mut f = form(vec![(ProductId::new(1), 1)]);
        f.customer_email = Some("nope");
        assert!(matches!(f.validate(), Err(OrderError::InvalidEmail(_))));
    }

    #[test]
    fn test_price_lines_uses_locked_prices() {
        let lines = [
            OrderLine {
                product_id: ProductId::new(1),
                quantity: 2,
            },
            OrderLine {
                product_id: ProductId::new(3),
                quantity: 1,
            },
        ];
        let (prices, total) =
            price_lines(&lines, &[locked(1, 1500, 5), locked(3, 990, 1)]).unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(total.amount(), Decimal::new(3990, 0));
    }

    #[test]
    fn test_price_lines_reports_shortage() {
        let lines = [OrderLine {
            product_id: ProductId::new(1),
            quantity: 3,
        }];
        match price_lines(&lines, &[locked(1, 100, 2)]) {
            Err(OrderError::InsufficientStock {
                available,
                requested,
                ..
            }) => assert_eq!((available, requested), (2, 3)),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            price_lines(&lines, &[]),
            Err(OrderError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_price_lines_rejects_total_beyond_column() {
        let lines = [OrderLine {
            product_id: ProductId::new(1),
            quantity: 3,
        }];
        assert!(matches!(
            price_lines(&lines, &[locked(1, 9_000_000_000, 5)]),
            Err(OrderError::TotalTooLarge)
        ));
    }
}
