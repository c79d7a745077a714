//! Category repository.

use sqlx::PgPool;

use acsess_core::{CategoryId, CategoryType};

use super::RepositoryError;
use crate::models::Category;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    description: Option<String>,
    #[sqlx(rename = "type")]
    kind: CategoryType,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
            kind: row.kind,
        }
    }
}

/// Repository for product categories.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, type FROM category ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, description, type FROM category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    /// Whether a category with this id exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM category WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is already used.
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        kind: CategoryType,
    ) -> Result<Category, RepositoryError> {
        insert(self.pool, name, description, kind).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist, or
    /// `RepositoryError::Conflict` if the new name is already used.
    pub async fn update(
        &self,
        id: CategoryId,
        name: &str,
        description: Option<&str>,
        kind: CategoryType,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE category
            SET name = $2, description = $3, type = $4, updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, type
            ",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(kind)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "category name already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Find a category by case-insensitive name, creating it when absent.
    /// The flag is `true` when a new category was created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_or_create(
        &self,
        name: &str,
        kind: CategoryType,
    ) -> Result<(CategoryId, bool), RepositoryError> {
        let existing =
            sqlx::query_scalar::<_, i32>("SELECT id FROM category WHERE lower(name) = lower($1)")
                .bind(name)
                .fetch_optional(self.pool)
                .await?;

        if let Some(id) = existing {
            return Ok((CategoryId::new(id), false));
        }

        let created = insert(self.pool, name, None, kind).await?;
        Ok((created.id, true))
    }

    /// Delete a category that no product references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when products still belong to the
    /// category, `RepositoryError::NotFound` when it does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let products = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM product WHERE category_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if products > 0 {
            return Err(RepositoryError::Conflict(format!(
                "category has {products} product(s)"
            )));
        }

        let result = sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_foreign_key(e, "category has products"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn insert(
    pool: &PgPool,
    name: &str,
    description: Option<&str>,
    kind: CategoryType,
) -> Result<Category, RepositoryError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        r"
        INSERT INTO category (name, description, type)
        VALUES ($1, $2, $3)
        RETURNING id, name, description, type
        ",
    )
    .bind(name)
    .bind(description)
    .bind(kind)
    .fetch_one(pool)
    .await
    .map_err(|e| RepositoryError::from_unique(e, "category name already exists"))?;

    Ok(row.into())
}
