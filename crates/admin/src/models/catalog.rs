//! Categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use acsess_core::{CategoryId, CategoryType, Price, PriceError, ProductId};

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: CategoryType,
}

/// A product together with its category name.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: i32,
    pub image_url: Option<String>,
    pub category_id: CategoryId,
    pub category_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a product payload was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductInputError {
    #[error("Product name is required")]
    MissingName,
    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),
    #[error("Stock cannot be negative")]
    NegativeStock,
    #[error("Stock is too large")]
    StockOverflow,
    #[error("Category is required")]
    MissingCategory,
}

/// Validated fields for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: i32,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
}

impl ProductInput {
    /// Validate raw product fields.
    ///
    /// Blank optional strings are stored as `NULL`.
    ///
    /// # Errors
    ///
    /// Returns an error when the name is blank, the price is not strictly
    /// positive, the stock is negative, or no category is given.
    pub fn new(
        name: &str,
        description: Option<&str>,
        price: Decimal,
        stock: i64,
        category_id: Option<CategoryId>,
        image_url: Option<&str>,
    ) -> Result<Self, ProductInputError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProductInputError::MissingName);
        }
        let price = Price::positive(price)?;
        if stock < 0 {
            return Err(ProductInputError::NegativeStock);
        }
        let stock = i32::try_from(stock).map_err(|_| ProductInputError::StockOverflow)?;
        let category_id = category_id.ok_or(ProductInputError::MissingCategory)?;

        Ok(Self {
            name: name.to_string(),
            description: non_blank(description),
            price,
            stock,
            category_id,
            image_url: non_blank(image_url),
        })
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category() -> Option<CategoryId> {
        Some(CategoryId::new(1))
    }

    #[test]
    fn test_valid_input_trims_fields() {
        let input = ProductInput::new(
            "  Кольцо ",
            Some("   "),
            Decimal::new(150_000, 2),
            3,
            category(),
            Some(" /uploads/products/1.png "),
        )
        .unwrap();
        assert_eq!(input.name, "Кольцо");
        assert_eq!(input.description, None);
        assert_eq!(input.image_url.as_deref(), Some("/uploads/products/1.png"));
        assert_eq!(input.stock, 3);
    }

    #[test]
    fn test_rejections() {
        let price = Decimal::new(100, 0);
        assert_eq!(
            ProductInput::new(" ", None, price, 1, category(), None),
            Err(ProductInputError::MissingName)
        );
        assert_eq!(
            ProductInput::new("Ring", None, Decimal::ZERO, 1, category(), None),
            Err(ProductInputError::Price(PriceError::Zero))
        );
        assert_eq!(
            ProductInput::new("Ring", None, price, -1, category(), None),
            Err(ProductInputError::NegativeStock)
        );
        assert_eq!(
            ProductInput::new("Ring", None, price, 1, None, None),
            Err(ProductInputError::MissingCategory)
        );
    }

    #[test]
    fn test_zero_stock_allowed() {
        assert!(ProductInput::new("Ring", None, Decimal::ONE, 0, category(), None).is_ok());
    }
}
