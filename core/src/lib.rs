//! Signed-request client for the WooCommerce REST API.
//!
//! # Overview
//! Builds requests against `{url}/{prefix}/{version}/{endpoint}` and hands
//! them to an injected HTTP transport. Authentication depends on transport
//! security: HTTP Basic (or credentials in the query string) over TLS, and
//! one-legged OAuth 1.0a HMAC-SHA256 signing over plain HTTP.
//!
//! # Design
//! - `ClientConfig` is validated once and never mutated afterwards.
//! - Query strings are canonicalized (flattened, sorted, encoded) so the URL
//!   and the OAuth signature base string agree byte for byte with the server.
//! - Request assembly (`WooCommerce::build_request`) is pure; the
//!   `Transport` trait is the only I/O boundary, which keeps the core
//!   testable without a network.
//!
//! ```no_run
//! use woocommerce_rest::{ClientOptions, ParameterSet, WooCommerce};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let api = WooCommerce::new(ClientOptions::new("https://shop.example", "ck_...", "cs_..."))?;
//! let params = ParameterSet::new().with("per_page", 20u32);
//! let response = api.get("products", &params).await?;
//! println!("{}", response.json()?);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod overrides;
pub mod params;
pub mod query;
pub mod transport;
pub mod url_builder;

pub use client::WooCommerce;
pub use config::{ClientConfig, ClientOptions};
pub use error::{ApiError, ConfigError, ParamError, SigningError, TransportError};
pub use http::{Auth, Encoding, HttpMethod, HttpRequest, HttpResponse};
pub use oauth::{OAuthParameters, OAuthSigner};
pub use overrides::{BasicCredentials, TransportOverride};
pub use params::{ParamValue, ParameterSet};
pub use transport::{ReqwestTransport, Transport};
pub use url_builder::UrlBuilder;
