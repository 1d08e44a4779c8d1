use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::Catalog;
use crate::domain::aggregates::{
    Category, CategoryTranslation, NewCategory, NewProduct, Product, ProductEdit, ProductFilter,
    ProductTranslation,
};
use crate::domain::value_objects::{CategoryId, Price, ProductId};
use crate::{Result, ShopError};

// $1 = requested language, $2 = default language.
const PRODUCT_SELECT: &str = "SELECT p.id, p.category_id, p.price, p.available, p.created_at, p.updated_at, \
    COALESCE(t.language_code, d.language_code, $1) AS language_code, \
    COALESCE(t.name, d.name, '') AS name, COALESCE(t.slug, d.slug, '') AS slug, \
    COALESCE(t.description, d.description, '') AS description \
    FROM products p \
    LEFT JOIN product_translations t ON t.product_id = p.id AND t.language_code = $1 \
    LEFT JOIN product_translations d ON d.product_id = p.id AND d.language_code = $2";

const CATEGORY_SELECT: &str = "SELECT c.id, c.created_at, \
    COALESCE(t.language_code, d.language_code, $1) AS language_code, \
    COALESCE(t.name, d.name, '') AS name, COALESCE(t.slug, d.slug, '') AS slug \
    FROM categories c \
    LEFT JOIN category_translations t ON t.category_id = c.id AND t.language_code = $1 \
    LEFT JOIN category_translations d ON d.category_id = c.id AND d.language_code = $2";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid, category_id: Uuid, price: Decimal, available: bool, created_at: DateTime<Utc>, updated_at: DateTime<Utc>,
    language_code: String, name: String, slug: String, description: String,
}

#[derive(sqlx::FromRow)]
struct CategoryRow { id: Uuid, created_at: DateTime<Utc>, language_code: String, name: String, slug: String }

impl TryFrom<ProductRow> for Product {
    type Error = ShopError;
    fn try_from(r: ProductRow) -> Result<Self> {
        let price = Price::new(r.price).map_err(|e| ShopError::Validation(format!("product {}: {}", r.id, e)))?;
        Ok(Product {
            id: r.id.into(), category: r.category_id.into(), language_code: r.language_code, name: r.name,
            slug: r.slug, description: r.description, price, available: r.available,
            created: r.created_at, updated: r.updated_at,
        })
    }
}

/// A unique-violation on `category_translations (language_code, slug)` is a
/// client error, anything else stays a database failure.
fn slug_conflict(err: sqlx::Error, language: &str, slug: &str) -> ShopError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ShopError::Validation(format!("category slug '{}' already exists for '{}'", slug, language))
        }
        _ => ShopError::Database(err),
    }
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Category { id: r.id.into(), language_code: r.language_code, name: r.name, slug: r.slug, created: r.created_at }
    }
}

/// Catalog tables in PostgreSQL, one translation row per language.
#[derive(Clone)]
pub struct PgCatalog { pool: PgPool, default_language: String }

impl PgCatalog {
    pub fn new(pool: PgPool, default_language: impl Into<String>) -> Self {
        Self { pool, default_language: default_language.into() }
    }

    fn rows_to_products(rows: Vec<ProductRow>) -> Result<Vec<Product>> {
        rows.into_iter().map(Product::try_from).collect()
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn products_by_ids(&self, ids: &[ProductId], language: &str) -> Result<Vec<Product>> {
        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = ANY($3)"))
            .bind(language).bind(&self.default_language).bind(&ids)
            .fetch_all(&self.pool).await?;
        Self::rows_to_products(rows)
    }

    async fn product(&self, id: ProductId, language: &str) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $3"))
            .bind(language).bind(&self.default_language).bind(id.as_uuid())
            .fetch_optional(&self.pool).await?
            .map(Product::try_from)
            .transpose()
    }

    async fn list_products(&self, filter: &ProductFilter, language: &str) -> Result<Vec<Product>> {
        let sql = format!(
            "{PRODUCT_SELECT} WHERE ($3::bool IS NULL OR p.available = $3) \
             AND ($4::uuid IS NULL OR p.category_id = $4) \
             AND ($5::timestamptz IS NULL OR p.created_at >= $5) ORDER BY name"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(language).bind(&self.default_language)
            .bind(filter.available).bind(filter.category.map(|c| c.as_uuid())).bind(filter.created_since)
            .fetch_all(&self.pool).await?;
        Self::rows_to_products(rows)
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product> {
        let mut tx = self.pool.begin().await?;
        let category_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
            .bind(new.category.as_uuid()).fetch_optional(&mut *tx).await?;
        if category_exists.is_none() {
            return Err(ShopError::CategoryNotFound(new.category));
        }
        let id = ProductId::new();
        sqlx::query("INSERT INTO products (id, category_id, price, available, created_at, updated_at) VALUES ($1, $2, $3, $4, NOW(), NOW())")
            .bind(id.as_uuid()).bind(new.category.as_uuid()).bind(new.price.amount()).bind(new.available)
            .execute(&mut *tx).await?;
        sqlx::query("INSERT INTO product_translations (product_id, language_code, name, slug, description) VALUES ($1, $2, $3, $4, $5)")
            .bind(id.as_uuid()).bind(&new.language_code).bind(&new.translation.name).bind(&new.translation.slug).bind(&new.translation.description)
            .execute(&mut *tx).await?;
        tx.commit().await?;
        tracing::info!(product_id = %id, "product created");
        self.product(id, &new.language_code).await?.ok_or(ShopError::ProductNotFound(id))
    }

    async fn edit_product(&self, id: ProductId, edit: ProductEdit, language: &str) -> Result<Option<Product>> {
        let done = sqlx::query("UPDATE products SET price = COALESCE($2, price), available = COALESCE($3, available), updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid()).bind(edit.price.map(|p| p.amount())).bind(edit.available)
            .execute(&self.pool).await?;
        if done.rows_affected() == 0 {
            return Ok(None);
        }
        self.product(id, language).await
    }

    async fn translate_product(&self, id: ProductId, language: &str, translation: ProductTranslation) -> Result<Option<Product>> {
        let mut tx = self.pool.begin().await?;
        let touched = sqlx::query("UPDATE products SET updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid()).execute(&mut *tx).await?;
        if touched.rows_affected() == 0 {
            return Ok(None);
        }
        sqlx::query("INSERT INTO product_translations (product_id, language_code, name, slug, description) VALUES ($1, $2, $3, $4, $5) \
                     ON CONFLICT (product_id, language_code) DO UPDATE SET name = EXCLUDED.name, slug = EXCLUDED.slug, description = EXCLUDED.description")
            .bind(id.as_uuid()).bind(language).bind(&translation.name).bind(&translation.slug).bind(&translation.description)
            .execute(&mut *tx).await?;
        tx.commit().await?;
        self.product(id, language).await
    }

    async fn list_categories(&self, language: &str) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} ORDER BY name"))
            .bind(language).bind(&self.default_language)
            .fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category> {
        let id = CategoryId::new();
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO categories (id, created_at) VALUES ($1, NOW())")
            .bind(id.as_uuid()).execute(&mut *tx).await?;
        sqlx::query("INSERT INTO category_translations (category_id, language_code, name, slug) VALUES ($1, $2, $3, $4)")
            .bind(id.as_uuid()).bind(&new.language_code).bind(&new.translation.name).bind(&new.translation.slug)
            .execute(&mut *tx).await
            .map_err(|e| slug_conflict(e, &new.language_code, &new.translation.slug))?;
        tx.commit().await?;
        tracing::info!(category_id = %id, "category created");
        self.category(id, &new.language_code).await?.ok_or(ShopError::CategoryNotFound(id))
    }

    async fn translate_category(&self, id: CategoryId, language: &str, translation: CategoryTranslation) -> Result<Option<Category>> {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM categories WHERE id = $1")
            .bind(id.as_uuid()).fetch_optional(&self.pool).await?;
        if exists.is_none() {
            return Ok(None);
        }
        sqlx::query("INSERT INTO category_translations (category_id, language_code, name, slug) VALUES ($1, $2, $3, $4) \
                     ON CONFLICT (category_id, language_code) DO UPDATE SET name = EXCLUDED.name, slug = EXCLUDED.slug")
            .bind(id.as_uuid()).bind(language).bind(&translation.name).bind(&translation.slug)
            .execute(&self.pool).await
            .map_err(|e| slug_conflict(e, language, &translation.slug))?;
        self.category(id, language).await
    }
}

impl PgCatalog {
    async fn category(&self, id: CategoryId, language: &str) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.id = $3"))
            .bind(language).bind(&self.default_language).bind(id.as_uuid())
            .fetch_optional(&self.pool).await?;
        Ok(row.map(Category::from))
    }
}
