//! Product catalog
//!
//! The cart only needs [`Catalog::products_by_ids`]; the remaining
//! operations back the admin screens. Every read takes the language to
//! resolve translations in and falls back to the store's default language.

mod memory;
mod postgres;

pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;

use async_trait::async_trait;

use crate::domain::aggregates::{
    Category, CategoryTranslation, NewCategory, NewProduct, Product, ProductEdit, ProductFilter,
    ProductTranslation,
};
use crate::domain::value_objects::{CategoryId, ProductId};
use crate::Result;

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Bulk lookup; unknown ids are left out of the result.
    async fn products_by_ids(&self, ids: &[ProductId], language: &str) -> Result<Vec<Product>>;
    async fn product(&self, id: ProductId, language: &str) -> Result<Option<Product>>;
    /// Products matching `filter`, ordered by name.
    async fn list_products(&self, filter: &ProductFilter, language: &str) -> Result<Vec<Product>>;
    async fn create_product(&self, new: NewProduct) -> Result<Product>;
    async fn edit_product(&self, id: ProductId, edit: ProductEdit, language: &str) -> Result<Option<Product>>;
    /// Insert or replace the translation for `language`.
    async fn translate_product(&self, id: ProductId, language: &str, translation: ProductTranslation) -> Result<Option<Product>>;
    /// Categories ordered by name.
    async fn list_categories(&self, language: &str) -> Result<Vec<Category>>;
    async fn create_category(&self, new: NewCategory) -> Result<Category>;
    async fn translate_category(&self, id: CategoryId, language: &str, translation: CategoryTranslation) -> Result<Option<Category>>;
}
