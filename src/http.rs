//! JSON HTTP surface the storefront views talk to.
//!
//! Every request goes through the single shared [`CartStore`], held behind one
//! async mutex so cart operations run one at a time.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use validator::Validate;

use crate::catalog::{Catalog, CatalogFacets, CatalogFilter};
use crate::config::StorefrontConfig;
use crate::domain::aggregates::{Cart, Product, Selection};
use crate::domain::events::CartEvent;
use crate::domain::value_objects::{Price, Quantity};
use crate::storage::{FileStore, KeyValueStore};
use crate::store::{CartPersistence, CartSnapshot, CartStore};

type ApiError = (StatusCode, String);

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub cart: Arc<Mutex<CartStore>>,
}

impl AppState {
    pub fn new(catalog: Catalog, cart: CartStore) -> Self {
        Self { catalog: Arc::new(catalog), cart: Arc::new(Mutex::new(cart)) }
    }

    /// Seeded catalog plus a cart restored from, and persisted to, the
    /// file-backed slot named in `config`.
    pub fn from_config(config: &StorefrontConfig) -> crate::Result<Self> {
        let catalog = Catalog::seeded()?;
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir)?);
        let mut cart = CartStore::restore(&*storage, &config.cart_slot);
        cart.subscribe(CartPersistence::new(storage, config.cart_slot.clone()));
        cart.subscribe(|event: &CartEvent, cart: &Cart| {
            info!(event = ?event.kind, total_quantity = cart.total_quantity(), subtotal = %cart.subtotal(), "cart changed");
        });
        info!(products = catalog.len(), lines = cart.items().len(), "storefront state ready");
        Ok(Self::new(catalog, cart))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "luxe-storefront"})) }))
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/:id", get(get_product))
        .route("/api/v1/catalog/facets", get(facets))
        .route("/api/v1/cart", get(get_cart).delete(clear_cart))
        .route("/api/v1/cart/items", post(add_item).put(update_quantity).delete(remove_item))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Product as the views render it, with the markdown badge precomputed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub discount_percent: Option<u32>,
}

impl<'a> From<&'a Product> for ProductView<'a> {
    fn from(product: &'a Product) -> Self { Self { product, discount_percent: product.discount_percent() } }
}

/// Comma-separated value lists, e.g. `?category=Denim,Basics&maxPrice=150`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

impl ProductQuery {
    fn into_filter(self) -> Result<CatalogFilter, ApiError> {
        let split = |v: Option<String>| -> std::collections::BTreeSet<String> {
            v.map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect()).unwrap_or_default()
        };
        let price_range = match (parse_price(self.min_price)?, parse_price(self.max_price)?) {
            (None, None) => None,
            (min, max) => Some((min.unwrap_or(Price::ZERO), max.unwrap_or(Price::MAX))),
        };
        Ok(CatalogFilter { categories: split(self.category), sizes: split(self.size), colors: split(self.color), price_range })
    }
}

fn parse_price(raw: Option<String>) -> Result<Option<Price>, ApiError> {
    raw.map(|s| Decimal::from_str(s.trim()).map_err(bad_request).and_then(|d| Price::new(d).map_err(bad_request))).transpose()
}

fn bad_request(e: impl std::fmt::Display) -> ApiError { (StatusCode::BAD_REQUEST, e.to_string()) }

async fn list_products(State(s): State<AppState>, Query(q): Query<ProductQuery>) -> Result<Response, ApiError> {
    let filter = q.into_filter()?;
    let views: Vec<ProductView<'_>> = s.catalog.filter(&filter).into_iter().map(ProductView::from).collect();
    Ok(Json(views).into_response())
}

async fn get_product(State(s): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let product = s.catalog.get_by_id(&id).ok_or((StatusCode::NOT_FOUND, "Not found".to_string()))?;
    Ok(Json(ProductView::from(product)).into_response())
}

async fn facets(State(s): State<AppState>) -> Json<CatalogFacets> { Json(s.catalog.facets()) }

async fn get_cart(State(s): State<AppState>) -> Json<CartSnapshot> { Json(s.cart.lock().await.snapshot()) }

fn one() -> u32 { 1 }

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[validate(length(min = 1))]
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
    #[serde(default = "one")]
    #[validate(range(min = 1))]
    pub quantity: u32,
}

async fn add_item(State(s): State<AppState>, Json(r): Json<AddToCartRequest>) -> Result<(StatusCode, Json<CartSnapshot>), ApiError> {
    r.validate().map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    let product = s.catalog.get_by_id(&r.product_id).ok_or((StatusCode::NOT_FOUND, "Not found".to_string()))?;
    let quantity = Quantity::new(r.quantity).map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    let line = product
        .to_line_item(Selection { size: non_blank(r.size), color: non_blank(r.color) }, quantity)
        .ok_or((StatusCode::UNPROCESSABLE_ENTITY, "Size or color not offered".to_string()))?;
    let mut cart = s.cart.lock().await;
    cart.add_item(line);
    Ok((StatusCode::CREATED, Json(cart.snapshot())))
}

fn non_blank(v: Option<String>) -> Option<String> { v.filter(|s| !s.is_empty()) }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i64,
}

async fn update_quantity(State(s): State<AppState>, Json(r): Json<UpdateQuantityRequest>) -> Json<CartSnapshot> {
    let mut cart = s.cart.lock().await;
    cart.update_quantity(&r.product_id, r.size.as_deref(), r.color.as_deref(), r.quantity);
    Json(cart.snapshot())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineParams {
    pub product_id: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

async fn remove_item(State(s): State<AppState>, Query(p): Query<LineParams>) -> Json<CartSnapshot> {
    let mut cart = s.cart.lock().await;
    cart.remove_item(&p.product_id, p.size.as_deref(), p.color.as_deref());
    Json(cart.snapshot())
}

async fn clear_cart(State(s): State<AppState>) -> Json<CartSnapshot> {
    let mut cart = s.cart.lock().await;
    cart.clear_cart();
    Json(cart.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let mut cart = CartStore::new();
        cart.subscribe(CartPersistence::new(storage.clone(), crate::DEFAULT_CART_SLOT));
        (router(AppState::new(Catalog::seeded().unwrap(), cart)), storage)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder.header("content-type", "application/json").body(Body::from(b.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, value)
    }

    #[tokio::test]
    async fn test_filter_products() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/api/v1/products?category=Denim&minPrice=100&maxPrice=150", None).await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], "3");
        assert_eq!(list[0]["discountPercent"], 19);

        let (status, _) = send(&app, Method::GET, "/api/v1/products?maxPrice=cheap", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_product_not_found() {
        let (app, _) = app();
        let (status, _) = send(&app, Method::GET, "/api/v1/products/404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = send(&app, Method::GET, "/api/v1/products/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Premium Black Leather Jacket");
        let (_, body) = send(&app, Method::GET, "/api/v1/catalog/facets", None).await;
        assert_eq!(body["categories"].as_array().unwrap().len(), 4);
        assert_eq!(body["minPrice"], 49.99);
        assert!(body.get("min_price").is_none());
    }

    #[tokio::test]
    async fn test_cart_flow() {
        let (app, storage) = app();
        let add = json!({"productId": "1", "size": "M", "color": "Black", "quantity": 2});
        let (status, _) = send(&app, Method::POST, "/api/v1/cart/items", Some(add.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, body) = send(&app, Method::POST, "/api/v1/cart/items", Some(json!({"productId": "1", "size": "M", "color": "Black"}))).await;
        assert_eq!(body["totalQuantity"], 3);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);

        let update = json!({"productId": "1", "size": "M", "color": "Black", "quantity": -2});
        let (_, body) = send(&app, Method::PUT, "/api/v1/cart/items", Some(update)).await;
        assert_eq!(body["items"][0]["quantity"], 1);

        let (_, body) = send(&app, Method::DELETE, "/api/v1/cart/items?productId=1&size=M&color=Black", None).await;
        assert_eq!(body["totalQuantity"], 0);
        assert_eq!(storage.get(crate::DEFAULT_CART_SLOT).unwrap().as_deref(), Some("[]"));

        send(&app, Method::POST, "/api/v1/cart/items", Some(add)).await;
        let (_, body) = send(&app, Method::DELETE, "/api/v1/cart", None).await;
        assert_eq!(body["subtotal"], 0.0);
        let (_, body) = send(&app, Method::GET, "/api/v1/cart", None).await;
        assert!(body["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_size_and_color_address_plain_line() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::POST, "/api/v1/cart/items", Some(json!({"productId": "2", "size": "", "color": ""}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["items"][0].get("size").is_none());
        let (_, body) = send(&app, Method::POST, "/api/v1/cart/items", Some(json!({"productId": "2"}))).await;
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["totalQuantity"], 2);
        let (_, body) = send(&app, Method::DELETE, "/api/v1/cart/items?productId=2&size=&color=", None).await;
        assert_eq!(body["totalQuantity"], 0);
        assert!(body["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_rejects_bad_requests() {
        let (app, _) = app();
        let (status, _) = send(&app, Method::POST, "/api/v1/cart/items", Some(json!({"productId": "1", "quantity": 0}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (status, _) = send(&app, Method::POST, "/api/v1/cart/items", Some(json!({"productId": "1", "size": "XXXL"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let (status, _) = send(&app, Method::POST, "/api/v1/cart/items", Some(json!({"productId": "99"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorefrontConfig { data_dir: dir.path().to_path_buf(), ..StorefrontConfig::default() };
        let app = router(AppState::from_config(&config).unwrap());
        let add = json!({"productId": "3", "size": "32", "color": "Indigo", "quantity": 2});
        let (status, _) = send(&app, Method::POST, "/api/v1/cart/items", Some(add)).await;
        assert_eq!(status, StatusCode::CREATED);

        let restarted = AppState::from_config(&config).unwrap();
        let cart = restarted.cart.lock().await;
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal(), Price::from_cents(25998));
    }
}
