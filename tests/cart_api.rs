//! End-to-end tests driving the router over in-memory stores.

use std::str::FromStr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront::catalog::{Catalog, MemoryCatalog};
use storefront::config::AppConfig;
use storefront::coupons::MemoryCouponStore;
use storefront::domain::aggregates::{Coupon, CategoryTranslation, NewCategory, NewProduct, Product, ProductTranslation};
use storefront::domain::value_objects::{CouponId, ProductId};
use storefront::http::{router, AppState};
use storefront::session::MemorySessionStore;

struct Harness {
    app: Router,
    catalog: Arc<MemoryCatalog>,
    coupons: Arc<MemoryCouponStore>,
}

fn harness() -> Harness {
    let config = AppConfig::from_lookup(|_| None).unwrap();
    let catalog = Arc::new(MemoryCatalog::new("en"));
    let coupons = Arc::new(MemoryCouponStore::new());
    let state = AppState::new(config, Arc::new(MemorySessionStore::new()), catalog.clone(), coupons.clone());
    Harness { app: router(state), catalog, coupons }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

fn dec(v: &Value) -> Decimal {
    Decimal::from_str(v.as_str().expect("decimal string")).unwrap()
}

async fn seed_product(catalog: &MemoryCatalog, name: &str, price: &str) -> Product {
    let category = catalog
        .create_category(NewCategory {
            language_code: "en".into(),
            translation: CategoryTranslation { name: format!("{} tins", name), slug: format!("{}-tins", name.to_lowercase()) },
        })
        .await
        .unwrap();
    catalog
        .create_product(NewProduct {
            category: category.id,
            price: price.parse().unwrap(),
            available: true,
            language_code: "en".into(),
            translation: ProductTranslation { name: name.into(), slug: name.to_lowercase(), description: String::new() },
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn add_accumulates_and_override_sets() {
    let h = harness();
    let a = seed_product(&h.catalog, "Sencha", "10.00").await;

    let (status, cart) = send(&h.app, "POST", "/api/v1/cart/visitor-1/items", Some(json!({"product_id": a.id, "quantity": 2}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&cart["total_price"]), Decimal::new(2000, 2));

    let (_, cart) = send(&h.app, "POST", "/api/v1/cart/visitor-1/items", Some(json!({"product_id": a.id, "quantity": 3}))).await;
    assert_eq!(cart["len"], json!(5));
    assert_eq!(dec(&cart["total_price"]), Decimal::new(5000, 2));

    let (_, cart) = send(
        &h.app, "POST", "/api/v1/cart/visitor-1/items",
        Some(json!({"product_id": a.id, "quantity": 1, "override_quantity": true})),
    ).await;
    assert_eq!(cart["len"], json!(1));
    assert_eq!(dec(&cart["items"][0]["total_price"]), Decimal::new(1000, 2));
    assert_eq!(dec(&cart["total_price"]), Decimal::new(1000, 2));
}

#[tokio::test]
async fn quantity_defaults_to_one_and_sessions_are_isolated() {
    let h = harness();
    let a = seed_product(&h.catalog, "Assam", "3.00").await;

    let (_, cart) = send(&h.app, "POST", "/api/v1/cart/alice/items", Some(json!({"product_id": a.id}))).await;
    assert_eq!(cart["len"], json!(1));

    let (_, other) = send(&h.app, "GET", "/api/v1/cart/bob", None).await;
    assert_eq!(other["len"], json!(0));
    assert_eq!(other["items"], json!([]));
}

#[tokio::test]
async fn coupon_discount_applies_to_total() {
    let h = harness();
    let a = seed_product(&h.catalog, "Sencha", "10.00").await;
    let now = Utc::now();
    h.coupons.insert(Coupon {
        id: CouponId::new(), code: "TEN".into(), valid_from: now - Duration::days(1),
        valid_to: now + Duration::days(1), discount: 10, active: true,
    });

    send(&h.app, "POST", "/api/v1/cart/v2/items", Some(json!({"product_id": a.id, "quantity": 2}))).await;
    let (status, cart) = send(&h.app, "POST", "/api/v1/cart/v2/coupon", Some(json!({"code": "ten"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["coupon"]["code"], json!("TEN"));
    assert_eq!(dec(&cart["total_price"]), Decimal::new(2000, 2));
    assert_eq!(dec(&cart["discount"]), Decimal::new(200, 2));
    assert_eq!(dec(&cart["total_price_after_discount"]), Decimal::new(1800, 2));

    let (_, cart) = send(&h.app, "GET", "/api/v1/cart/v2", None).await;
    assert_eq!(dec(&cart["discount"]), Decimal::new(200, 2));
}

#[tokio::test]
async fn unknown_coupon_code_clears_coupon() {
    let h = harness();
    let now = Utc::now();
    h.coupons.insert(Coupon {
        id: CouponId::new(), code: "HALF".into(), valid_from: now - Duration::days(1),
        valid_to: now + Duration::days(1), discount: 50, active: true,
    });

    let (_, cart) = send(&h.app, "POST", "/api/v1/cart/v3/coupon", Some(json!({"code": "HALF"}))).await;
    assert_eq!(cart["coupon"]["discount"], json!(50));

    let (status, cart) = send(&h.app, "POST", "/api/v1/cart/v3/coupon", Some(json!({"code": "BOGUS"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["coupon"], Value::Null);
    assert_eq!(dec(&cart["discount"]), Decimal::ZERO);

    let (status, _) = send(&h.app, "POST", "/api/v1/cart/v3/coupon", Some(json!({"code": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn removing_absent_product_is_noop() {
    let h = harness();
    let a = seed_product(&h.catalog, "Oolong", "6.00").await;
    send(&h.app, "POST", "/api/v1/cart/v4/items", Some(json!({"product_id": a.id, "quantity": 2}))).await;

    let uri = format!("/api/v1/cart/v4/items/{}", ProductId::new());
    let (status, cart) = send(&h.app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["len"], json!(2));

    let (_, cart) = send(&h.app, "DELETE", &format!("/api/v1/cart/v4/items/{}", a.id), None).await;
    assert_eq!(cart["len"], json!(0));
}

#[tokio::test]
async fn product_gone_from_catalog_still_counts_in_total() {
    let h = harness();
    let kept = seed_product(&h.catalog, "Assam", "10.00").await;
    let gone = seed_product(&h.catalog, "Darjeeling", "5.00").await;
    send(&h.app, "POST", "/api/v1/cart/v5/items", Some(json!({"product_id": kept.id, "quantity": 2}))).await;
    send(&h.app, "POST", "/api/v1/cart/v5/items", Some(json!({"product_id": gone.id, "quantity": 1}))).await;

    assert!(h.catalog.remove_product(gone.id));
    let (_, cart) = send(&h.app, "GET", "/api/v1/cart/v5", None).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["product"]["name"], json!("Assam"));
    assert_eq!(dec(&cart["total_price"]), Decimal::new(2500, 2));
    assert_eq!(cart["len"], json!(3));
}

#[tokio::test]
async fn clear_empties_cart() {
    let h = harness();
    let a = seed_product(&h.catalog, "Chai", "3.50").await;
    send(&h.app, "POST", "/api/v1/cart/v6/items", Some(json!({"product_id": a.id, "quantity": 4}))).await;

    let (status, _) = send(&h.app, "DELETE", "/api/v1/cart/v6", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, cart) = send(&h.app, "GET", "/api/v1/cart/v6", None).await;
    assert_eq!(cart["len"], json!(0));
}

#[tokio::test]
async fn bad_requests() {
    let h = harness();
    let (status, body) = send(&h.app, "POST", "/api/v1/cart/v7/items", Some(json!({"product_id": ProductId::new()}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Product not found"));

    let (status, _) = send(&h.app, "GET", "/api/v1/cart/bad%20id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_category_and_product_flow() {
    let h = harness();

    let (status, category) = send(&h.app, "POST", "/admin/categories", Some(json!({"name": "Herbal Infusions"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(category["slug"], json!("herbal-infusions"));
    let category_id = category["id"].as_str().unwrap().to_string();

    let (status, product) = send(
        &h.app, "POST", "/admin/products",
        Some(json!({"category": category_id, "name": "Lemon Balm", "price": "7.25"})),
    ).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["slug"], json!("lemon-balm"));
    assert_eq!(product["available"], json!(true));
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, listing) = send(&h.app, "GET", "/admin/products?available=true&created=today", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["count"], json!(1));
    assert_eq!(listing["admin"]["list_editable"], json!(["price", "available"]));
    let row = listing["results"][0].as_object().unwrap();
    assert!(row.contains_key("category"));
    assert!(!row.contains_key("description"));

    let (status, edited) = send(&h.app, "PATCH", &format!("/admin/products/{}", product_id), Some(json!({"price": "8.00", "available": false}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["available"], json!(false));
    assert_eq!(dec(&edited["price"]), Decimal::new(800, 2));

    let (status, _) = send(&h.app, "PATCH", &format!("/admin/products/{}", product_id), Some(json!({"name": "Renamed"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listing) = send(&h.app, "GET", "/admin/products?available=true", None).await;
    assert_eq!(listing["count"], json!(0));

    let (status, translated) = send(
        &h.app, "PUT", &format!("/admin/products/{}/translations/es", product_id),
        Some(json!({"name": "Melisa"})),
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(translated["slug"], json!("melisa"));

    let (_, listing) = send(&h.app, "GET", "/admin/products?language=es", None).await;
    assert_eq!(listing["language"], json!("es"));
    assert_eq!(listing["results"][0]["name"], json!("Melisa"));

    let (status, body) = send(&h.app, "POST", "/admin/categories", Some(json!({"name": "Herbal infusions"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("herbal-infusions"));

    let (status, _) = send(
        &h.app, "PUT", &format!("/admin/products/{}/translations/xx", product_id),
        Some(json!({"name": "Nope"})),
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, categories) = send(&h.app, "GET", "/admin/categories?language=es", None).await;
    assert_eq!(categories["results"][0]["name"], json!("Herbal Infusions"));
}

#[tokio::test]
async fn prices_outside_column_domain_are_rejected() {
    let h = harness();
    let (_, category) = send(&h.app, "POST", "/admin/categories", Some(json!({"name": "Tea"}))).await;
    let category_id = category["id"].as_str().unwrap().to_string();

    for price in ["79228162514264337593543950335", "100000000.00", "1.005"] {
        let (status, _) = send(
            &h.app, "POST", "/admin/products",
            Some(json!({"category": category_id, "name": "Gold leaf", "price": price})),
        ).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "price {}", price);
    }

    let (status, product) = send(
        &h.app, "POST", "/admin/products",
        Some(json!({"category": category_id, "name": "Gold leaf", "price": "99999999.99"})),
    ).await;
    assert_eq!(status, StatusCode::CREATED);
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, _) = send(&h.app, "PATCH", &format!("/admin/products/{}", product_id), Some(json!({"price": "1.005"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, cart) = send(
        &h.app, "POST", "/api/v1/cart/rich/items",
        Some(json!({"product_id": product_id, "quantity": u32::MAX})),
    ).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&cart["total_price"]), Decimal::new(9_999_999_999, 2) * Decimal::from(u32::MAX));
}

#[tokio::test]
async fn health() {
    let h = harness();
    let (status, body) = send(&h.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
}
