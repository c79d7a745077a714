//! Public catalog: products, categories and paging.

use serde::Serialize;

use acsess_core::{CategoryId, CategoryType, Price, ProductId};

/// A product as shown to shoppers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(rename = "image")]
    pub image_url: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "category")]
    pub category_name: String,
    pub in_stock: bool,
    /// Units available; used for cart reconciliation, not exposed.
    #[serde(skip)]
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: CategoryType,
}

/// Listing filter built from the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: i64,
    pub limit: i64,
}

impl ProductFilter {
    pub const DEFAULT_LIMIT: i64 = 9;
    pub const MAX_LIMIT: i64 = 100;

    /// Normalize raw query values: blank strings are ignored, `page` is at
    /// least 1 and `limit` is clamped to `1..=100`.
    #[must_use]
    pub fn new(
        search: Option<&str>,
        category: Option<&str>,
        page: Option<&str>,
        limit: Option<&str>,
    ) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .unwrap_or(1)
            .max(1);
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT);

        Self {
            search: non_blank(search),
            category: non_blank(category),
            page,
            limit,
        }
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ILIKE` pattern for the search term with wildcards escaped.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().map(|s| {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self::new(None, None, None, None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_more: bool,
}

impl Pagination {
    #[must_use]
    pub const fn new(page: i64, limit: i64, total_count: i64) -> Self {
        let total_pages = if total_count <= 0 {
            0
        } else {
            (total_count + limit - 1) / limit
        };
        Self {
            current_page: page,
            total_pages,
            total_count,
            has_more: page < total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_and_clamps() {
        let filter = ProductFilter::default();
        assert_eq!((filter.page, filter.limit), (1, 9));

        let filter = ProductFilter::new(Some("  "), Some("Кольца"), Some("0"), Some("500"));
        assert_eq!(filter.search, None);
        assert_eq!(filter.category.as_deref(), Some("Кольца"));
        assert_eq!((filter.page, filter.limit), (1, 100));

        let filter = ProductFilter::new(None, None, Some("abc"), Some("-3"));
        assert_eq!((filter.page, filter.limit), (1, 1));
    }

    #[test]
    fn test_offset() {
        let filter = ProductFilter::new(None, None, Some("3"), Some("9"));
        assert_eq!(filter.offset(), 18);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filter = ProductFilter::new(Some("50%_off"), None, None, None);
        assert_eq!(filter.search_pattern().as_deref(), Some("%50\\%\\_off%"));
    }

    #[test]
    fn test_pagination() {
        assert_eq!(
            Pagination::new(1, 9, 20),
            Pagination {
                current_page: 1,
                total_pages: 3,
                total_count: 20,
                has_more: true,
            }
        );
        assert!(!Pagination::new(3, 9, 20).has_more);
        assert_eq!(Pagination::new(1, 9, 0).total_pages, 0);
        assert!(!Pagination::new(1, 9, 0).has_more);
    }
}
