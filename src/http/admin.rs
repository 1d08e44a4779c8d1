//! Catalog admin handlers, driven by the descriptors in [`crate::admin`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, instrument};
use validator::Validate;

use super::cart::LanguageParams;
use super::{ApiError, AppState};
use crate::admin::{ModelAdmin, CATEGORY_ADMIN, PRODUCT_ADMIN};
use crate::domain::aggregates::{
    Category, CategoryTranslation, CreatedFilter, NewCategory, NewProduct, Product, ProductEdit, ProductFilter,
    ProductTranslation,
};
use crate::domain::value_objects::{CategoryId, Price, ProductId};
use crate::{Result, ShopError};

type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/categories", get(list_categories).post(create_category))
        .route("/admin/categories/:id/translations/:language", put(translate_category))
        .route("/admin/products", get(list_products).post(create_product))
        .route("/admin/products/:id", patch(edit_product))
        .route("/admin/products/:id/translations/:language", put(translate_product))
}

#[derive(Debug, Serialize)]
pub struct AdminListing {
    pub admin: ModelAdmin,
    pub language: String,
    pub count: usize,
    pub results: Vec<Map<String, Value>>,
}

impl AdminListing {
    fn build<T: Serialize>(admin: ModelAdmin, language: String, rows: &[T]) -> Result<Self> {
        let results = rows.iter().map(|r| admin.project(r)).collect::<Result<Vec<_>>>()?;
        Ok(Self { admin, language, count: results.len(), results })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductListParams {
    pub language: Option<String>,
    pub available: Option<bool>,
    pub category: Option<CategoryId>,
    pub created: Option<CreatedFilter>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    pub language: Option<String>,
}

fn default_available() -> bool { true }

#[derive(Debug, Deserialize, Validate)]
pub struct ProductForm {
    pub category: CategoryId,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default = "default_available")]
    pub available: bool,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductTranslationForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 200))]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Slug from the form, or prepopulated from the name.
fn slug_for(admin: &ModelAdmin, slug: Option<&str>, name: &str) -> Result<String> {
    admin
        .prepopulate("slug", slug, &[("name", name)])
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ShopError::Validation(format!("cannot derive a slug from '{}'", name)))
}

/// Writes must target a configured language; reads fall back instead.
fn supported_language(state: &AppState, language: &str) -> Result<String> {
    let language = language.trim().to_lowercase();
    if state.config.languages.contains(&language) {
        Ok(language)
    } else {
        Err(ShopError::Validation(format!("unsupported language '{}'", language)))
    }
}

fn parse_edit(fields: &Map<String, Value>) -> Result<ProductEdit> {
    PRODUCT_ADMIN.check_editable(fields.keys().map(String::as_str))?;
    let mut edit = ProductEdit::default();
    if let Some(v) = fields.get("price") {
        let price = Price::deserialize(v).map_err(|e| ShopError::Validation(format!("price: {}", e)))?;
        edit.price = Some(price);
    }
    if let Some(v) = fields.get("available") {
        let available = v.as_bool().ok_or_else(|| ShopError::Validation("available must be a boolean".to_string()))?;
        edit.available = Some(available);
    }
    if edit.is_empty() {
        return Err(ShopError::Validation("no editable fields given".to_string()));
    }
    Ok(edit)
}

#[instrument(name = "admin::list_categories", skip_all)]
async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<LanguageParams>,
) -> ApiResult<Json<AdminListing>> {
    let language = state.config.resolve_language(params.language.as_deref());
    let categories = state.catalog.list_categories(&language).await?;
    Ok(Json(AdminListing::build(CATEGORY_ADMIN, language, &categories)?))
}

#[instrument(name = "admin::create_category", skip_all, fields(name = %form.name))]
async fn create_category(
    State(state): State<AppState>,
    Json(form): Json<CategoryForm>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    form.validate().map_err(ShopError::from)?;
    let language = match form.language.as_deref() {
        Some(l) => supported_language(&state, l)?,
        None => state.config.default_language.clone(),
    };
    let slug = slug_for(&CATEGORY_ADMIN, form.slug.as_deref(), &form.name)?;
    let category = state
        .catalog
        .create_category(NewCategory { language_code: language, translation: CategoryTranslation { name: form.name, slug } })
        .await?;
    info!(category_id = %category.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(name = "admin::translate_category", skip_all, fields(category_id = %id, language = %language))]
async fn translate_category(
    State(state): State<AppState>,
    Path((id, language)): Path<(CategoryId, String)>,
    Json(form): Json<CategoryForm>,
) -> ApiResult<Json<Category>> {
    form.validate().map_err(ShopError::from)?;
    let language = supported_language(&state, &language)?;
    let slug = slug_for(&CATEGORY_ADMIN, form.slug.as_deref(), &form.name)?;
    let category = state
        .catalog
        .translate_category(id, &language, CategoryTranslation { name: form.name, slug })
        .await?
        .ok_or(ShopError::CategoryNotFound(id))?;
    Ok(Json(category))
}

#[instrument(name = "admin::list_products", skip_all)]
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListParams>,
) -> ApiResult<Json<AdminListing>> {
    let language = state.config.resolve_language(params.language.as_deref());
    let filter = ProductFilter {
        available: params.available,
        category: params.category,
        created_since: params.created.map(|c| c.since(Utc::now())),
    };
    let products = state.catalog.list_products(&filter, &language).await?;
    Ok(Json(AdminListing::build(PRODUCT_ADMIN, language, &products)?))
}

#[instrument(name = "admin::create_product", skip_all, fields(name = %form.name))]
async fn create_product(
    State(state): State<AppState>,
    Json(form): Json<ProductForm>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    form.validate().map_err(ShopError::from)?;
    let language = match form.language.as_deref() {
        Some(l) => supported_language(&state, l)?,
        None => state.config.default_language.clone(),
    };
    let slug = slug_for(&PRODUCT_ADMIN, form.slug.as_deref(), &form.name)?;
    let product = state
        .catalog
        .create_product(NewProduct {
            category: form.category,
            price: form.price,
            available: form.available,
            language_code: language,
            translation: ProductTranslation { name: form.name, slug, description: form.description },
        })
        .await?;
    info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(name = "admin::edit_product", skip_all, fields(product_id = %id))]
async fn edit_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Query(params): Query<LanguageParams>,
    Json(fields): Json<Map<String, Value>>,
) -> ApiResult<Json<Product>> {
    let edit = parse_edit(&fields)?;
    let language = state.config.resolve_language(params.language.as_deref());
    let product = state
        .catalog
        .edit_product(id, edit, &language)
        .await?
        .ok_or(ShopError::ProductNotFound(id))?;
    Ok(Json(product))
}

#[instrument(name = "admin::translate_product", skip_all, fields(product_id = %id, language = %language))]
async fn translate_product(
    State(state): State<AppState>,
    Path((id, language)): Path<(ProductId, String)>,
    Json(form): Json<ProductTranslationForm>,
) -> ApiResult<Json<Product>> {
    form.validate().map_err(ShopError::from)?;
    let language = supported_language(&state, &language)?;
    let slug = slug_for(&PRODUCT_ADMIN, form.slug.as_deref(), &form.name)?;
    let translation = ProductTranslation { name: form.name, slug, description: form.description };
    let product = state
        .catalog
        .translate_product(id, &language, translation)
        .await?
        .ok_or(ShopError::ProductNotFound(id))?;
    Ok(Json(product))
}
