//! In-memory imitation of the store REST API for tests and local runs.
//!
//! Serves `/wp-json/wc/v3/orders` with list/create/get/update/delete and an
//! OPTIONS route description. Every route sits behind authentication that
//! accepts Basic, query-string credentials, or OAuth 1.0a HMAC-SHA256.

pub mod auth;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, warn};

pub use auth::{AuthFailure, AuthMode, Authenticator, Credentials};

pub const API_ROOT: &str = "/wp-json/wc/v3";
const ORDERS: &str = "/wp-json/wc/v3/orders";
const ORDER: &str = "/wp-json/wc/v3/orders/{id}";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: u64,
    pub status: String,
    pub currency: String,
    pub total: String,
}

#[derive(Deserialize)]
pub struct NewOrder {
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_total")]
    pub total: String,
}

fn default_status() -> String {
    "pending".to_string()
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_total() -> String {
    "0.00".to_string()
}

#[derive(Deserialize)]
pub struct OrderUpdate {
    pub status: Option<String>,
    pub total: Option<String>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub per_page: Option<usize>,
}

#[derive(Clone)]
pub struct AppState {
    orders: Arc<RwLock<BTreeMap<u64, Order>>>,
    next_id: Arc<AtomicU64>,
    auth: Arc<Authenticator>,
}

pub fn app(credentials: Credentials) -> Router {
    let state = AppState {
        orders: Arc::new(RwLock::new(BTreeMap::new())),
        next_id: Arc::new(AtomicU64::new(1)),
        auth: Arc::new(Authenticator::new(credentials)),
    };
    Router::new()
        .route(ORDERS, get(list_orders).post(create_order).options(describe_orders))
        .route(ORDER, get(get_order).put(update_order).delete(delete_order))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

pub async fn run(listener: TcpListener, credentials: Credentials) -> Result<(), std::io::Error> {
    axum::serve(listener, app(credentials)).await
}

fn error_body(status: StatusCode, code: &str, message: &str) -> Response {
    let body = json!({"code": code, "message": message, "data": {"status": status.as_u16()}});
    (status, Json(body)).into_response()
}

fn invalid_id() -> Response {
    error_body(StatusCode::NOT_FOUND, "woocommerce_rest_shop_order_invalid_id", "Invalid ID.")
}

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let outcome = {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| request.uri().authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());
        let incoming = auth::IncomingRequest {
            method: request.method().as_str(),
            base_url: format!("http://{host}{}", request.uri().path()),
            raw_query: request.uri().query(),
            authorization: request.headers().get(header::AUTHORIZATION).and_then(|h| h.to_str().ok()),
        };
        state.auth.authenticate(&incoming)
    };

    match outcome {
        Ok(mode) => {
            debug!(?mode, path = request.uri().path(), "authenticated");
            next.run(request).await
        }
        Err(failure) => {
            warn!(?failure, path = request.uri().path(), "authentication failed");
            error_body(
                StatusCode::UNAUTHORIZED,
                "woocommerce_rest_authentication_error",
                &failure.message(),
            )
        }
    }
}

async fn list_orders(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Json<Vec<Order>> {
    let orders = state.orders.read().await;
    let matching = orders
        .values()
        .filter(|o| query.status.as_ref().map_or(true, |s| &o.status == s))
        .take(query.per_page.unwrap_or(10))
        .cloned()
        .collect();
    Json(matching)
}

async fn create_order(State(state): State<AppState>, Json(input): Json<NewOrder>) -> (StatusCode, Json<Order>) {
    let order = Order {
        id: state.next_id.fetch_add(1, Ordering::Relaxed),
        status: input.status,
        currency: input.currency,
        total: input.total,
    };
    state.orders.write().await.insert(order.id, order.clone());
    (StatusCode::CREATED, Json(order))
}

async fn get_order(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.orders.read().await.get(&id) {
        Some(order) => Json(order.clone()).into_response(),
        None => invalid_id(),
    }
}

async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<OrderUpdate>,
) -> Response {
    let mut orders = state.orders.write().await;
    let Some(order) = orders.get_mut(&id) else {
        return invalid_id();
    };
    if let Some(status) = input.status {
        order.status = status;
    }
    if let Some(total) = input.total {
        order.total = total;
    }
    Json(order.clone()).into_response()
}

async fn delete_order(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.orders.write().await.remove(&id) {
        Some(order) => Json(order).into_response(),
        None => invalid_id(),
    }
}

async fn describe_orders() -> Json<serde_json::Value> {
    Json(json!({
        "namespace": "wc/v3",
        "methods": ["GET", "POST"],
        "endpoints": [{"methods": ["GET"]}, {"methods": ["POST"]}],
    }))
}
