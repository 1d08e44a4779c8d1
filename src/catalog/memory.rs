use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::Catalog;
use crate::domain::aggregates::{
    Category, CategoryTranslation, NewCategory, NewProduct, Product, ProductEdit, ProductFilter,
    ProductTranslation,
};
use crate::domain::value_objects::{CategoryId, Price, ProductId};
use crate::{Result, ShopError};

struct CategoryRecord {
    id: CategoryId,
    created: DateTime<Utc>,
    translations: BTreeMap<String, CategoryTranslation>,
}

struct ProductRecord {
    id: ProductId,
    category: CategoryId,
    price: Price,
    available: bool,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    translations: BTreeMap<String, ProductTranslation>,
}

/// Requested language, then the default, then whatever exists.
fn pick<'a, T>(translations: &'a BTreeMap<String, T>, language: &str, default: &str) -> Option<(&'a String, &'a T)> {
    translations
        .get_key_value(language)
        .or_else(|| translations.get_key_value(default))
        .or_else(|| translations.iter().next())
}

/// Category slugs are unique per language.
fn ensure_unique_slug(categories: &[CategoryRecord], except: Option<CategoryId>, language: &str, slug: &str) -> Result<()> {
    let taken = categories
        .iter()
        .filter(|c| Some(c.id) != except)
        .any(|c| c.translations.get(language).is_some_and(|t| t.slug == slug));
    if taken {
        return Err(ShopError::Validation(format!("category slug '{}' already exists for '{}'", slug, language)));
    }
    Ok(())
}

impl CategoryRecord {
    fn resolve(&self, language: &str, default: &str) -> Category {
        let (code, t) = match pick(&self.translations, language, default) {
            Some((code, t)) => (code.clone(), t.clone()),
            None => (language.to_string(), CategoryTranslation { name: String::new(), slug: String::new() }),
        };
        Category { id: self.id, language_code: code, name: t.name, slug: t.slug, created: self.created }
    }
}

impl ProductRecord {
    fn resolve(&self, language: &str, default: &str) -> Product {
        let (code, t) = match pick(&self.translations, language, default) {
            Some((code, t)) => (code.clone(), t.clone()),
            None => (
                language.to_string(),
                ProductTranslation { name: String::new(), slug: String::new(), description: String::new() },
            ),
        };
        Product {
            id: self.id, category: self.category, language_code: code, name: t.name, slug: t.slug,
            description: t.description, price: self.price, available: self.available,
            created: self.created, updated: self.updated,
        }
    }
}

/// Catalog held in process memory. Used for local runs and tests.
pub struct MemoryCatalog {
    default_language: String,
    categories: RwLock<Vec<CategoryRecord>>,
    products: RwLock<Vec<ProductRecord>>,
}

impl MemoryCatalog {
    pub fn new(default_language: impl Into<String>) -> Self {
        Self { default_language: default_language.into(), categories: RwLock::new(vec![]), products: RwLock::new(vec![]) }
    }

    /// Delete a product outright, as if removed from the catalog by another system.
    pub fn remove_product(&self, id: ProductId) -> bool {
        let mut products = self.products.write();
        let before = products.len();
        products.retain(|p| p.id != id);
        products.len() != before
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn products_by_ids(&self, ids: &[ProductId], language: &str) -> Result<Vec<Product>> {
        let products = self.products.read();
        Ok(products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| p.resolve(language, &self.default_language))
            .collect())
    }

    async fn product(&self, id: ProductId, language: &str) -> Result<Option<Product>> {
        let products = self.products.read();
        Ok(products.iter().find(|p| p.id == id).map(|p| p.resolve(language, &self.default_language)))
    }

    async fn list_products(&self, filter: &ProductFilter, language: &str) -> Result<Vec<Product>> {
        let mut rows: Vec<Product> = self
            .products
            .read()
            .iter()
            .map(|p| p.resolve(language, &self.default_language))
            .filter(|p| filter.matches(p))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product> {
        if !self.categories.read().iter().any(|c| c.id == new.category) {
            return Err(ShopError::CategoryNotFound(new.category));
        }
        let now = Utc::now();
        let record = ProductRecord {
            id: ProductId::new(), category: new.category, price: new.price, available: new.available,
            created: now, updated: now,
            translations: BTreeMap::from([(new.language_code.clone(), new.translation)]),
        };
        let product = record.resolve(&new.language_code, &self.default_language);
        self.products.write().push(record);
        Ok(product)
    }

    async fn edit_product(&self, id: ProductId, edit: ProductEdit, language: &str) -> Result<Option<Product>> {
        let mut products = self.products.write();
        let Some(record) = products.iter_mut().find(|p| p.id == id) else { return Ok(None) };
        if let Some(price) = edit.price { record.price = price; }
        if let Some(available) = edit.available { record.available = available; }
        record.updated = Utc::now();
        Ok(Some(record.resolve(language, &self.default_language)))
    }

    async fn translate_product(&self, id: ProductId, language: &str, translation: ProductTranslation) -> Result<Option<Product>> {
        let mut products = self.products.write();
        let Some(record) = products.iter_mut().find(|p| p.id == id) else { return Ok(None) };
        record.translations.insert(language.to_string(), translation);
        record.updated = Utc::now();
        Ok(Some(record.resolve(language, &self.default_language)))
    }

    async fn list_categories(&self, language: &str) -> Result<Vec<Category>> {
        let mut rows: Vec<Category> =
            self.categories.read().iter().map(|c| c.resolve(language, &self.default_language)).collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn create_category(&self, new: NewCategory) -> Result<Category> {
        let mut categories = self.categories.write();
        ensure_unique_slug(&categories, None, &new.language_code, &new.translation.slug)?;
        let record = CategoryRecord {
            id: CategoryId::new(),
            created: Utc::now(),
            translations: BTreeMap::from([(new.language_code.clone(), new.translation)]),
        };
        let category = record.resolve(&new.language_code, &self.default_language);
        categories.push(record);
        Ok(category)
    }

    async fn translate_category(&self, id: CategoryId, language: &str, translation: CategoryTranslation) -> Result<Option<Category>> {
        let mut categories = self.categories.write();
        if !categories.iter().any(|c| c.id == id) {
            return Ok(None);
        }
        ensure_unique_slug(&categories, Some(id), language, &translation.slug)?;
        let Some(record) = categories.iter_mut().find(|c| c.id == id) else { return Ok(None) };
        record.translations.insert(language.to_string(), translation);
        Ok(Some(record.resolve(language, &self.default_language)))
    }
}
