//! Storefront
//!
//! Session-backed shopping cart with catalog administration.
//!
//! ## Features
//! - Cart stored in the visitor's session, with captured unit prices
//! - Percentage coupons applied to the cart total
//! - Catalog admin for categories and products
//! - Per-language catalog translations with default-language fallback
//! - In-memory or PostgreSQL backed stores

pub mod admin;
pub mod catalog;
pub mod config;
pub mod coupons;
pub mod domain;
pub mod http;
pub mod session;

use thiserror::Error;

use crate::domain::aggregates::CartError;
use crate::domain::value_objects::{CategoryId, ProductId};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum ShopError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("Malformed session entry '{key}': {source}")]
    MalformedSession {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid session id")]
    InvalidSessionId,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<validator::ValidationErrors> for ShopError {
    fn from(err: validator::ValidationErrors) -> Self {
        ShopError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShopError>;
