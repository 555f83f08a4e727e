//! End-to-end calls against the live mock store.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client verb
//! over real HTTP with `ReqwestTransport`. The server checks OAuth
//! signatures with its own implementation, so a passing run means the
//! client's canonical URL and signature base string match an independent
//! verifier.

use std::net::SocketAddr;

use mock_server::{Credentials, Order};
use serde_json::json;
use woocommerce_rest::{ApiError, ClientOptions, ParameterSet, ReqwestTransport, TransportError, WooCommerce};

const KEY: &str = "ck_integration";
const SECRET: &str = "cs_integration";

async fn start_store() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let credentials = Credentials {
        consumer_key: KEY.to_string(),
        consumer_secret: SECRET.to_string(),
    };
    tokio::spawn(mock_server::run(listener, credentials));
    addr
}

fn client(addr: SocketAddr, secret: &str) -> WooCommerce {
    WooCommerce::new(ClientOptions::new(format!("http://{addr}"), KEY, secret)).unwrap()
}

#[tokio::test]
async fn order_lifecycle_over_oauth() {
    let addr = start_store().await;
    let api = client(addr, SECRET);
    assert!(!api.is_encrypted());

    // Step 1: list, empty store.
    let response = api.get("orders", &ParameterSet::new()).await.unwrap();
    let orders: Vec<Order> = serde_json::from_str(&response.body).unwrap();
    assert!(orders.is_empty());

    // Step 2: create.
    let response = api
        .post("orders", &json!({"status": "processing", "total": "42.00"}), &ParameterSet::new())
        .await
        .unwrap();
    assert_eq!(response.status, 201);
    let created: Order = serde_json::from_str(&response.body).unwrap();
    assert_eq!(created.status, "processing");
    let id = created.id;

    // Step 3: fetch it back.
    let response = api.get(&format!("orders/{id}"), &ParameterSet::new()).await.unwrap();
    let fetched: Order = serde_json::from_str(&response.body).unwrap();
    assert_eq!(fetched, created);

    // Step 4: update.
    let response = api
        .put(&format!("orders/{id}"), &json!({"status": "completed"}), &ParameterSet::new())
        .await
        .unwrap();
    let updated: Order = serde_json::from_str(&response.body).unwrap();
    assert_eq!(updated.status, "completed");
    assert_eq!(updated.total, "42.00");

    // Step 5: delete.
    let params = ParameterSet::new().with("force", true);
    let response = api.delete(&format!("orders/{id}"), &params).await.unwrap();
    assert_eq!(response.status, 200);

    // Step 6: gone.
    let err = api.get(&format!("orders/{id}"), &ParameterSet::new()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn signed_query_with_nested_and_spaced_params_is_accepted() {
    let addr = start_store().await;
    let api = client(addr, SECRET);

    let params = ParameterSet::new()
        .with_nested("filter", [("q", "Woo Album"), ("limit", "1")])
        .with("status", "pending")
        .with("per_page", 5u32);
    let response = api.get("orders", &params).await.unwrap();
    assert_eq!(response.status, 200);
    assert!(response.json().unwrap().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn endpoint_with_its_own_query_is_signed() {
    let addr = start_store().await;
    let api = client(addr, SECRET);

    let params = ParameterSet::new().with("per_page", 2u32);
    let response = api.get("orders?status=pending&fields=id", &params).await.unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn options_returns_route_description() {
    let addr = start_store().await;
    let api = client(addr, SECRET);

    let response = api.options("orders", &ParameterSet::new()).await.unwrap();
    assert_eq!(response.json().unwrap()["namespace"], "wc/v3");
}

#[tokio::test]
async fn wrong_secret_surfaces_401() {
    let addr = start_store().await;
    let api = client(addr, "cs_wrong");

    let err = api.get("orders", &ParameterSet::new()).await.unwrap_err();
    match err {
        ApiError::Transport(TransportError::Status { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("woocommerce_rest_authentication_error"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn accept_all_statuses_returns_error_bodies_as_data() {
    let addr = start_store().await;
    let options = ClientOptions::new(format!("http://{addr}"), KEY, SECRET);
    let api = WooCommerce::with_transport(options, ReqwestTransport::new().accept_all_statuses()).unwrap();

    let response = api.get("orders/999", &ParameterSet::new()).await.unwrap();
    assert_eq!(response.status, 404);
    assert!(!response.is_success());
    assert_eq!(response.json().unwrap()["code"], "woocommerce_rest_shop_order_invalid_id");
}

#[tokio::test]
async fn concurrent_requests_share_one_client() {
    let addr = start_store().await;
    let api = std::sync::Arc::new(client(addr, SECRET));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let api = api.clone();
            tokio::spawn(async move {
                api.post("orders", &json!({"total": format!("{i}.00")}), &ParameterSet::new())
                    .await
                    .map(|r| r.status)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 201);
    }

    let response = api.get("orders", &ParameterSet::new().with("per_page", 20u32)).await.unwrap();
    let orders: Vec<Order> = serde_json::from_str(&response.body).unwrap();
    assert_eq!(orders.len(), 8);
}
