//! Spreadsheet import and export of products.
//!
//! Rows arrive either as JSON objects keyed by column header or as a CSV
//! file. Headers are matched against Russian and English aliases, so a file
//! produced by [`export_csv`] can be edited and imported back.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::PgPool;
use thiserror::Error;

use acsess_core::{CategoryType, Price, ProductId};

use crate::db::{CategoryRepository, ProductRepository, RepositoryError};
use crate::models::{Product, ProductInput};

/// A spreadsheet column and the headers that name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Name,
    Description,
    Price,
    Stock,
    Category,
    Image,
}

impl Column {
    /// Header written on export; always the first alias.
    #[must_use]
    pub const fn header(self) -> &'static str {
        self.aliases()[0]
    }

    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Id => &["ID", "id"],
            Self::Name => &["Название товара", "name"],
            Self::Description => &["Описание", "description"],
            Self::Price => &["Цена", "price"],
            Self::Stock => &["Количество на складе", "stock"],
            Self::Category => &["Каталог", "Категория", "category"],
            Self::Image => &[
                "Ссылки на изображение",
                "Ссылка на изображение",
                "image_url",
            ],
        }
    }

    const REQUIRED: [Self; 3] = [Self::Name, Self::Price, Self::Category];
    const EXPORT: [Self; 7] = [
        Self::Id,
        Self::Name,
        Self::Description,
        Self::Price,
        Self::Stock,
        Self::Category,
        Self::Image,
    ];
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid CSV file: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV file has no header row")]
    NoHeader,
}

/// One input row with its position for error messages.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub number: usize,
    fields: HashMap<String, String>,
}

impl RawRow {
    #[must_use]
    pub fn new(number: usize, fields: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            number,
            fields: fields
                .into_iter()
                .map(|(k, v)| (normalize_header(&k), v.trim().to_string()))
                .collect(),
        }
    }

    /// First non-blank value under any alias of `column`.
    #[must_use]
    pub fn get(&self, column: Column) -> Option<&str> {
        column
            .aliases()
            .iter()
            .filter_map(|alias| self.fields.get(&normalize_header(alias)))
            .map(String::as_str)
            .find(|v| !v.is_empty())
    }
}

fn normalize_header(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').to_lowercase()
}

/// A row with every required column present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub id: Option<ProductId>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i64,
    pub category: String,
    pub image_url: Option<String>,
}

/// Check required columns and coerce numbers.
///
/// Non-numeric price or stock become zero; a zero price is then rejected by
/// product validation.
///
/// # Errors
///
/// Returns the headers of every missing required column.
pub fn parse_row(row: &RawRow) -> Result<ParsedRow, Vec<&'static str>> {
    let missing: Vec<&'static str> = Column::REQUIRED
        .iter()
        .filter(|c| row.get(**c).is_none())
        .map(|c| c.header())
        .collect();
    if !missing.is_empty() {
        return Err(missing);
    }

    let text = |c: Column| row.get(c).map(ToString::to_string);

    Ok(ParsedRow {
        id: row
            .get(Column::Id)
            .and_then(|v| v.parse::<i32>().ok())
            .filter(|id| *id > 0)
            .map(ProductId::new),
        name: text(Column::Name).unwrap_or_default(),
        description: text(Column::Description),
        price: row.get(Column::Price).map_or(Decimal::ZERO, parse_decimal),
        stock: row
            .get(Column::Stock)
            .and_then(|v| v.split(['.', ',']).next())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0),
        category: text(Column::Category).unwrap_or_default(),
        image_url: text(Column::Image),
    })
}

fn parse_decimal(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '₽')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse().unwrap_or(Decimal::ZERO)
}

/// Convert JSON objects (as sent by the admin UI) into rows.
#[must_use]
pub fn rows_from_json(objects: Vec<Map<String, Value>>) -> Vec<RawRow> {
    objects
        .into_iter()
        .enumerate()
        .map(|(i, object)| {
            let fields = object.into_iter().filter_map(|(k, v)| {
                let v = match v {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => return None,
                };
                Some((k, v))
            });
            RawRow::new(i + 1, fields)
        })
        .collect()
}

/// Read CSV bytes into rows. Semicolon-separated files are detected from the
/// header line.
///
/// # Errors
///
/// Returns an error if the file is not valid CSV or has no header.
pub fn rows_from_csv(bytes: &[u8]) -> Result<Vec<RawRow>, ImportError> {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    let delimiter = if semicolons > commas { b';' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(ImportError::NoHeader);
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()));
        // Header is line 1.
        rows.push(RawRow::new(i + 2, fields));
    }
    Ok(rows)
}

/// Counters and messages returned to the admin UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub success: u32,
    pub failed: u32,
    pub replaced: u32,
    pub created: u32,
    pub errors: Vec<String>,
}

impl ImportReport {
    fn fail(&mut self, message: String) {
        self.failed += 1;
        self.errors.push(message);
    }

    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Import finished: {} product(s) processed, {} created, {} replaced, {} failed",
            self.success, self.created, self.replaced, self.failed
        )
    }
}

/// Applies parsed rows to the catalog.
pub struct ProductImporter<'a> {
    categories: CategoryRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> ProductImporter<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            categories: CategoryRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Import every row, collecting failures instead of stopping.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` only for failures not tied to a row.
    pub async fn import(&self, rows: &[RawRow]) -> Result<ImportReport, RepositoryError> {
        let mut report = ImportReport::default();

        for row in rows {
            let parsed = match parse_row(row) {
                Ok(parsed) => parsed,
                Err(missing) => {
                    report.fail(format!(
                        "Row {}: missing columns: {}",
                        row.number,
                        missing.join(", ")
                    ));
                    continue;
                }
            };

            match self.apply(&parsed).await {
                Ok(Applied::Created) => {
                    report.success += 1;
                    report.created += 1;
                }
                Ok(Applied::Replaced) => {
                    report.success += 1;
                    report.replaced += 1;
                }
                Err(RowFailure::Invalid(message)) => {
                    report.fail(format!("Row {} \"{}\": {message}", row.number, parsed.name));
                }
                Err(RowFailure::Repository(RepositoryError::Database(e))) if is_data_error(&e) => {
                    tracing::warn!(row = row.number, error = %e, "Row rejected by the database");
                    report.fail(format!(
                        "Row {} \"{}\": value out of range",
                        row.number, parsed.name
                    ));
                }
                Err(RowFailure::Repository(RepositoryError::Database(e))) => {
                    tracing::error!(row = row.number, error = %e, "Database error during import");
                    return Err(RepositoryError::Database(e));
                }
                Err(RowFailure::Repository(e)) => {
                    report.fail(format!("Row {} \"{}\": {e}", row.number, parsed.name));
                }
            }
        }

        tracing::info!(
            success = report.success,
            created = report.created,
            replaced = report.replaced,
            failed = report.failed,
            "Product import finished"
        );
        Ok(report)
    }

    async fn apply(&self, row: &ParsedRow) -> Result<Applied, RowFailure> {
        // Reject a bad price before an unknown category gets created for it.
        Price::positive(row.price).map_err(|e| RowFailure::Invalid(e.to_string()))?;

        let (category_id, created) = self
            .categories
            .find_or_create(&row.category, CategoryType::Other)
            .await?;
        if created {
            tracing::info!(category = %row.category, "Category created by import");
        }

        let input = ProductInput::new(
            &row.name,
            row.description.as_deref(),
            row.price,
            row.stock,
            Some(category_id),
            row.image_url.as_deref(),
        )
        .map_err(|e| RowFailure::Invalid(e.to_string()))?;

        match row.id {
            Some(id) if self.products.exists(id).await? => {
                self.products.update(id, &input).await?;
                Ok(Applied::Replaced)
            }
            Some(id) => {
                self.products.create_with_id(id, &input).await?;
                Ok(Applied::Created)
            }
            None => {
                self.products.create(&input).await?;
                Ok(Applied::Created)
            }
        }
    }
}

/// Postgres data exceptions (SQLSTATE class 22) come from the row's values,
/// not from the database being unavailable.
fn is_data_error(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code.starts_with("22"))
}

enum Applied {
    Created,
    Replaced,
}

enum RowFailure {
    Invalid(String),
    Repository(RepositoryError),
}

impl From<RepositoryError> for RowFailure {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

/// Write products as CSV with the headers the importer reads.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export_csv(products: &[Product]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(Column::EXPORT.iter().map(|c| c.header()))?;

    for p in products {
        writer.write_record([
            p.id.to_string(),
            p.name.clone(),
            p.description.clone().unwrap_or_default(),
            p.price.amount().to_string(),
            p.stock.to_string(),
            p.category_name.clone(),
            p.image_url.clone().unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use acsess_core::{CategoryId, Price};

    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        RawRow::new(
            1,
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())),
        )
    }

    #[test]
    fn test_parse_row_with_russian_headers() {
        let parsed = parse_row(&row(&[
            ("Название товара", "Кольцо"),
            ("Цена", "1 500,50"),
            ("Каталог", "Украшения"),
            ("Количество на складе", "7"),
            ("Ссылка на изображение", "https://cdn.test/ring.png"),
        ]))
        .unwrap();
        assert_eq!(parsed.name, "Кольцо");
        assert_eq!(parsed.price, Decimal::new(150_050, 2));
        assert_eq!(parsed.stock, 7);
        assert_eq!(parsed.category, "Украшения");
        assert_eq!(parsed.image_url.as_deref(), Some("https://cdn.test/ring.png"));
        assert_eq!(parsed.id, None);
    }

    #[test]
    fn test_parse_row_english_headers_any_case() {
        let parsed = parse_row(&row(&[
            ("ID", "12"),
            ("Name", "Ring"),
            ("price", "10"),
            ("Category", "Jewelry"),
        ]))
        .unwrap();
        assert_eq!(parsed.id, Some(ProductId::new(12)));
        assert_eq!(parsed.stock, 0);
    }

    #[test]
    fn test_non_positive_id_is_ignored() {
        for id in ["0", "-4", "abc"] {
            let parsed = parse_row(&row(&[
                ("ID", id),
                ("name", "Ring"),
                ("price", "10"),
                ("category", "Jewelry"),
            ]))
            .unwrap();
            assert_eq!(parsed.id, None, "{id}");
        }
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let missing = parse_row(&row(&[("Название товара", "Кольцо"), ("Цена", " ")])).unwrap_err();
        assert_eq!(missing, vec!["Цена", "Каталог"]);
    }

    #[test]
    fn test_non_numeric_values_default_to_zero() {
        let parsed = parse_row(&row(&[
            ("name", "Ring"),
            ("price", "free"),
            ("category", "Jewelry"),
            ("stock", "many"),
        ]))
        .unwrap();
        assert_eq!(parsed.price, Decimal::ZERO);
        assert_eq!(parsed.stock, 0);
    }

    #[test]
    fn test_rows_from_json() {
        let objects = vec![
            json!({"Название товара": "Кольцо", "Цена": 1500, "Каталог": "Украшения", "Описание": null}),
            json!({"name": "Серьги"}),
        ]
        .into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();

        let rows = rows_from_json(objects);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(Column::Price), Some("1500"));
        assert_eq!(rows[0].get(Column::Description), None);
        assert_eq!(rows[1].number, 2);
        assert!(parse_row(&rows[1]).is_err());
    }

    #[test]
    fn test_rows_from_csv_semicolon_with_bom() {
        let data = "\u{feff}Название товара;Цена;Каталог\nКольцо;1500;Украшения\n;;\nСерьги;900;\n";
        let rows = rows_from_csv(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(Column::Name), Some("Кольцо"));
        assert_eq!(rows[1].number, 4);
        assert_eq!(parse_row(&rows[1]).unwrap_err(), vec!["Каталог"]);
    }

    #[test]
    fn test_rows_from_csv_quoted_commas() {
        let data = "name,price,category,description\n\"Ring, gold\",10,Jewelry,\"Nice, shiny\"\n";
        let rows = rows_from_csv(data.as_bytes()).unwrap();
        assert_eq!(rows[0].get(Column::Name), Some("Ring, gold"));
        assert_eq!(rows[0].get(Column::Description), Some("Nice, shiny"));
    }

    #[test]
    fn test_export_reimports() {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(3),
            name: "Кольцо, золото".to_string(),
            description: None,
            price: Price::new(Decimal::new(150_000, 2)).unwrap(),
            stock: 2,
            image_url: None,
            category_id: CategoryId::new(1),
            category_name: "Украшения".to_string(),
            created_at: now,
            updated_at: now,
        };
        let bytes = export_csv(&[product]).unwrap();
        let rows = rows_from_csv(&bytes).unwrap();
        let parsed = parse_row(&rows[0]).unwrap();
        assert_eq!(parsed.id, Some(ProductId::new(3)));
        assert_eq!(parsed.name, "Кольцо, золото");
        assert_eq!(parsed.price, Decimal::new(150_000, 2));
        assert_eq!(parsed.stock, 2);
    }

    #[test]
    fn test_report_summary() {
        let mut report = ImportReport::default();
        report.fail("Row 1: missing columns: Цена".to_string());
        assert_eq!(report.failed, 1);
        assert!(report.summary().contains("1 failed"));
    }
}
