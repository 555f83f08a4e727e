//! Check canonicalization and signing against JSON vectors in `test-vectors/`.
//!
//! The vectors were produced by a separate implementation, so they pin the
//! exact bytes a server sees rather than whatever this crate happens to emit.
//!
//! One case records a local decision rather than an independent result:
//! "trailing question mark adds nothing". The JavaScript `oauth-1.0a`
//! library turns the empty query after a bare `?` into an `("", "")` pair,
//! so its base string would carry a leading `%3D%26` in the parameter part.
//! This crate skips empty query pieces, which matches what a server parses,
//! and the vector was generated with that rule.

use serde_json::Value;
use woocommerce_rest::oauth::signature_base_string;
use woocommerce_rest::query::normalize_query_string;
use woocommerce_rest::{HttpMethod, OAuthSigner, ParameterSet};

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

fn parse_method(s: &str) -> HttpMethod {
    serde_json::from_value(Value::String(s.to_string())).unwrap_or_else(|_| panic!("unknown method: {s}"))
}

// ---------------------------------------------------------------------------
// Canonical query
// ---------------------------------------------------------------------------

#[test]
fn canonical_query_vectors() {
    for case in load(include_str!("../../test-vectors/canonical_query.json")) {
        let name = case["name"].as_str().unwrap();
        let url = case["url"].as_str().unwrap();
        let params = ParameterSet::try_from(case["params"].clone()).unwrap();
        let expected = case["expected"].as_str().unwrap();

        let actual = normalize_query_string(url, &params);
        assert_eq!(actual, expected, "[{name}] canonical URL");

        // Canonical output is a fixed point.
        assert_eq!(
            normalize_query_string(&actual, &ParameterSet::new()),
            actual,
            "[{name}] canonical URL is stable"
        );
    }
}

// ---------------------------------------------------------------------------
// OAuth signature
// ---------------------------------------------------------------------------

#[test]
fn oauth_signature_vectors() {
    for case in load(include_str!("../../test-vectors/oauth_signature.json")) {
        let name = case["name"].as_str().unwrap();
        let method = parse_method(case["method"].as_str().unwrap());
        let url = case["url"].as_str().unwrap();
        let signer = OAuthSigner::new(
            case["consumer_key"].as_str().unwrap(),
            case["consumer_secret"].as_str().unwrap(),
        );
        let nonce = case["nonce"].as_str().unwrap();
        let timestamp = case["timestamp"].as_u64().unwrap();

        let params = signer.sign_with(method.as_str(), url, nonce, timestamp).unwrap();

        assert_eq!(
            signature_base_string(method.as_str(), url, &params),
            case["expected_base_string"].as_str().unwrap(),
            "[{name}] base string"
        );
        assert_eq!(params.signature, case["expected_signature"].as_str().unwrap(), "[{name}] signature");
        assert_eq!(params.nonce, nonce, "[{name}] nonce");
        assert_eq!(params.timestamp, timestamp, "[{name}] timestamp");
        assert_eq!(params.signature_method, "HMAC-SHA256", "[{name}] method");
        assert_eq!(params.version, "1.0", "[{name}] version");
    }
}
