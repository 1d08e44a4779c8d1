//! HTTP surface: cart, coupon entry and catalog admin.

pub mod admin;
pub mod cart;
pub mod error;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::{Catalog, MemoryCatalog, PgCatalog};
use crate::config::AppConfig;
use crate::coupons::{CouponStore, MemoryCouponStore, PgCouponStore};
use crate::session::{MemorySessionStore, PgSessionStore, SessionStore};

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<dyn SessionStore>,
    pub catalog: Arc<dyn Catalog>,
    pub coupons: Arc<dyn CouponStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        sessions: Arc<dyn SessionStore>,
        catalog: Arc<dyn Catalog>,
        coupons: Arc<dyn CouponStore>,
    ) -> Self {
        Self { config: Arc::new(config), sessions, catalog, coupons }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        let catalog = Arc::new(MemoryCatalog::new(config.default_language.clone()));
        Self::new(config, Arc::new(MemorySessionStore::new()), catalog, Arc::new(MemoryCouponStore::new()))
    }

    pub fn postgres(pool: PgPool, config: AppConfig) -> Self {
        let catalog = Arc::new(PgCatalog::new(pool.clone(), config.default_language.clone()));
        Self::new(config, Arc::new(PgSessionStore::new(pool.clone())), catalog, Arc::new(PgCouponStore::new(pool)))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .merge(cart::routes())
        .merge(admin::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
