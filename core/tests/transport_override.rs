//! Transport overrides seen from the outside: what actually reaches the
//! transport when `transport_override` is configured.

use std::collections::BTreeMap;
use std::sync::Arc;

use woocommerce_rest::transport::mock::RecordingTransport;
use woocommerce_rest::{Auth, BasicCredentials, ClientOptions, ParameterSet, TransportOverride, WooCommerce};

fn client(url: &str, overrides: TransportOverride) -> WooCommerce<Arc<RecordingTransport>> {
    let options = ClientOptions::new(url, "ck_test", "cs_test").transport_override(overrides);
    WooCommerce::with_transport(options, Arc::new(RecordingTransport::new())).unwrap()
}

#[tokio::test]
async fn params_override_replaces_the_signed_query() {
    let overrides = TransportOverride {
        params: Some(BTreeMap::from([("page".to_string(), "2".to_string())])),
        ..TransportOverride::default()
    };
    let api = client("http://test.dev", overrides);

    api.get("orders", &ParameterSet::new().with("page", 1u32)).await.unwrap();

    let sent = api.transport().last_request().unwrap();
    assert_eq!(sent.auth, Auth::None);
    assert_eq!(sent.query_pairs(), vec![("page".to_string(), "2".to_string())]);
    // The URL itself still carries the canonical query it was built with.
    assert_eq!(sent.url, "http://test.dev/wp-json/wc/v3/orders?page=1");
}

#[tokio::test]
async fn auth_override_replaces_basic_credentials() {
    let overrides = TransportOverride {
        auth: Some(BasicCredentials {
            username: "gateway".to_string(),
            password: "gw_secret".to_string(),
        }),
        ..TransportOverride::default()
    };
    let api = client("https://test.dev", overrides);

    api.get("orders", &ParameterSet::new().with("status", "pending")).await.unwrap();

    let sent = api.transport().last_request().unwrap();
    assert_eq!(sent.auth.basic_credentials(), Some(("gateway", "gw_secret")));
    assert_eq!(sent.query_pairs(), vec![("status".to_string(), "pending".to_string())]);
}

#[tokio::test]
async fn empty_override_sends_the_built_request() {
    let api = client("https://test.dev", TransportOverride::default());

    api.delete("orders/3", &ParameterSet::new().with("force", true)).await.unwrap();

    let requests = api.transport().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].auth.kind(), "basic");
    assert_eq!(requests[0].params, vec![("force".to_string(), "true".to_string())]);
}
