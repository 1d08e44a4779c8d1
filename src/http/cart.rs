//! Cart and coupon-entry handlers.
//!
//! Every route names its session in the path. The session is loaded (or
//! started), a [`Cart`] is bound to it for the request, and the session is
//! written back only when the cart marked it modified.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use validator::Validate;

use super::{ApiError, AppState};
use crate::domain::aggregates::{Cart, CartEntry, CartError};
use crate::domain::value_objects::ProductId;
use crate::session::{load_or_create, Session};
use crate::{Result, ShopError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/cart/:session", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/:session/items", post(add_item))
        .route("/api/v1/cart/:session/items/:product_id", delete(remove_item))
        .route("/api/v1/cart/:session/coupon", post(apply_coupon))
}

#[derive(Debug, Deserialize)]
pub struct LanguageParams { pub language: Option<String> }

fn one() -> u32 { 1 }

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
    #[serde(default)]
    pub override_quantity: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyCouponRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct CouponView { pub code: String, pub discount: i32 }

#[derive(Debug, Serialize)]
pub struct CartView {
    pub session: String,
    pub language: String,
    pub items: Vec<CartEntry>,
    pub len: u64,
    pub total_price: Decimal,
    pub coupon: Option<CouponView>,
    pub discount: Decimal,
    pub total_price_after_discount: Decimal,
}

async fn cart_view(state: &AppState, cart: &Cart<'_>, session_id: &str, language: &str) -> Result<CartView> {
    let items = cart.items(state.catalog.as_ref(), language).await?;
    let coupon = cart.coupon(state.coupons.as_ref()).await?;
    let discount = cart.discount_with(coupon.as_ref())?;
    let total_price = cart.total_price()?;
    let total_price_after_discount =
        total_price.checked_sub(discount).ok_or(ShopError::Cart(CartError::AmountOverflow))?;
    Ok(CartView {
        session: session_id.to_string(),
        language: language.to_string(),
        items,
        len: cart.len(),
        total_price,
        coupon: coupon.map(|c| CouponView { code: c.code, discount: c.discount }),
        discount,
        total_price_after_discount,
    })
}

async fn persist(state: &AppState, session: &mut Session) -> Result<()> {
    if session.is_modified() {
        session.extend(state.config.session_ttl);
        state.sessions.save(session).await?;
    }
    Ok(())
}

#[instrument(name = "handler::get_cart", skip_all, fields(session = %session_id))]
async fn get_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<LanguageParams>,
) -> std::result::Result<Json<CartView>, ApiError> {
    let language = state.config.resolve_language(params.language.as_deref());
    let mut session = load_or_create(state.sessions.as_ref(), &session_id, state.config.session_ttl).await?;
    let view = {
        let cart = Cart::new(&mut session, &state.config.cart)?;
        cart_view(&state, &cart, &session_id, &language).await?
    };
    persist(&state, &mut session).await?;
    Ok(Json(view))
}

#[instrument(name = "handler::add_to_cart", skip_all, fields(session = %session_id, product_id = %req.product_id, quantity = req.quantity))]
async fn add_item(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<LanguageParams>,
    Json(req): Json<AddItemRequest>,
) -> std::result::Result<Json<CartView>, ApiError> {
    let language = state.config.resolve_language(params.language.as_deref());
    let product = state
        .catalog
        .product(req.product_id, &language)
        .await?
        .ok_or(ShopError::ProductNotFound(req.product_id))?;

    let mut session = load_or_create(state.sessions.as_ref(), &session_id, state.config.session_ttl).await?;
    let view = {
        let mut cart = Cart::new(&mut session, &state.config.cart)?;
        cart.add(&product, req.quantity, req.override_quantity)?;
        info!(cart_len = cart.len(), "product added to cart");
        cart_view(&state, &cart, &session_id, &language).await?
    };
    persist(&state, &mut session).await?;
    Ok(Json(view))
}

#[instrument(name = "handler::remove_from_cart", skip_all, fields(session = %session_id, product_id = %product_id))]
async fn remove_item(
    State(state): State<AppState>,
    Path((session_id, product_id)): Path<(String, ProductId)>,
    Query(params): Query<LanguageParams>,
) -> std::result::Result<Json<CartView>, ApiError> {
    let language = state.config.resolve_language(params.language.as_deref());
    let mut session = load_or_create(state.sessions.as_ref(), &session_id, state.config.session_ttl).await?;
    let view = {
        let mut cart = Cart::new(&mut session, &state.config.cart)?;
        let removed = cart.remove(&product_id)?;
        info!(removed, "remove from cart");
        cart_view(&state, &cart, &session_id, &language).await?
    };
    persist(&state, &mut session).await?;
    Ok(Json(view))
}

#[instrument(name = "handler::clear_cart", skip_all, fields(session = %session_id))]
async fn clear_cart(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> std::result::Result<StatusCode, ApiError> {
    let mut session = load_or_create(state.sessions.as_ref(), &session_id, state.config.session_ttl).await?;
    Cart::new(&mut session, &state.config.cart)?.clear()?;
    persist(&state, &mut session).await?;
    info!("cart cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// Store the coupon id when the code is redeemable now; otherwise drop any
/// coupon the session carried.
#[instrument(name = "handler::apply_coupon", skip_all, fields(session = %session_id))]
async fn apply_coupon(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<LanguageParams>,
    Json(req): Json<ApplyCouponRequest>,
) -> std::result::Result<Json<CartView>, ApiError> {
    req.validate().map_err(ShopError::from)?;
    let language = state.config.resolve_language(params.language.as_deref());
    let coupon = state.coupons.redeemable(&req.code, Utc::now()).await?;

    let mut session = load_or_create(state.sessions.as_ref(), &session_id, state.config.session_ttl).await?;
    let key = &state.config.cart.coupon_session_key;
    match &coupon {
        Some(c) => session.insert(key, &c.id)?,
        None => {
            session.remove(key);
        }
    }
    info!(applied = coupon.is_some(), "coupon entry");

    let view = {
        let cart = Cart::new(&mut session, &state.config.cart)?;
        cart_view(&state, &cart, &session_id, &language).await?
    };
    persist(&state, &mut session).await?;
    Ok(Json(view))
}
