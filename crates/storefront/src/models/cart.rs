//! Session cart.
//!
//! The session only stores product ids and quantities. Names, prices and
//! stock are read from the database on every view, so a cart never shows a
//! stale price or more units than are available.

use serde::{Deserialize, Serialize};

use acsess_core::{Price, ProductId};

use super::catalog::Product;
use super::order::OrderLine;

/// Most units of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|l| l.product_id).collect()
    }

    /// Add units, merging with an existing line.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            }
            None => self.lines.push(CartLine {
                product_id,
                quantity: quantity.min(MAX_LINE_QUANTITY),
            }),
        }
    }

    /// Set a line's quantity; zero removes the line.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        let quantity = quantity.min(MAX_LINE_QUANTITY);
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
    }

    /// Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lines
            .iter()
            .map(|l| OrderLine {
                product_id: l.product_id,
                quantity: l.quantity,
            })
            .collect()
    }

    /// Check the cart against current products.
    ///
    /// Lines for missing or sold-out products are dropped and quantities are
    /// capped at the available stock. Returns the view and the cleaned cart.
    #[must_use]
    pub fn reconcile(&self, products: &[Product]) -> (CartView, Self) {
        let mut cleaned = Self::default();
        let mut items = Vec::with_capacity(self.lines.len());
        let mut adjusted = false;

        for line in &self.lines {
            let Some(product) = products.iter().find(|p| p.id == line.product_id) else {
                adjusted = true;
                continue;
            };
            let available = u32::try_from(product.stock).unwrap_or(0);
            if available == 0 {
                adjusted = true;
                continue;
            }
            let quantity = line.quantity.min(available);
            if quantity != line.quantity {
                adjusted = true;
            }

            cleaned.lines.push(CartLine {
                product_id: line.product_id,
                quantity,
            });
            items.push(CartItemView {
                product_id: product.id,
                name: product.name.clone(),
                price: product.price,
                quantity,
                line_total: product.price.times(quantity),
                image: product.image_url.clone(),
                available,
            });
        }

        let view = CartView {
            total: items.iter().map(|i| i.line_total).sum(),
            count: cleaned.item_count(),
            items,
            adjusted,
        };
        (view, cleaned)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    pub line_total: Price,
    pub image: Option<String>,
    pub available: u32,
}

/// Cart contents priced against the database.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: Price,
    pub count: u32,
    /// Some lines were dropped or capped since the last view.
    pub adjusted: bool,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: i32, price: i64, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::new(Decimal::new(price, 0)).unwrap_or_default(),
            image_url: None,
            description: None,
            category_name: "Кольца".to_string(),
            in_stock: stock > 0,
            stock,
        }
    }

    #[test]
    fn test_add_merges_and_caps() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(1), 3);
        cart.add(ProductId::new(2), 0);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 5);

        cart.add(ProductId::new(1), 500);
        assert_eq!(cart.item_count(), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::default();
        cart.set_quantity(ProductId::new(7), 4);
        assert_eq!(cart.item_count(), 4);
        cart.set_quantity(ProductId::new(7), 0);
        assert!(cart.is_empty());
        assert!(!cart.remove(ProductId::new(7)));
    }

    #[test]
    fn test_reconcile_prices_and_caps() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(2), 5);
        cart.add(ProductId::new(3), 1);
        cart.add(ProductId::new(4), 1);

        let products = [product(1, 100, 10), product(2, 50, 3), product(4, 10, 0)];
        let (view, cleaned) = cart.reconcile(&products);

        assert!(view.adjusted);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.count, 5);
        assert_eq!(view.total.amount(), Decimal::new(350, 0));
        assert_eq!(cleaned.product_ids(), vec![ProductId::new(1), ProductId::new(2)]);
        assert_eq!(cleaned.item_count(), 5);
    }

    #[test]
    fn test_reconcile_untouched_cart_is_not_adjusted() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), 1);
        let (view, cleaned) = cart.reconcile(&[product(1, 100, 1)]);
        assert!(!view.adjusted);
        assert_eq!(cleaned, cart);
    }
}
