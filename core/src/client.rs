//! Request dispatch for the store REST API.
//!
//! # Design
//! `WooCommerce` holds an immutable `ClientConfig`, the URL builder and the
//! OAuth signer derived from it, and an injected `Transport`. No call mutates
//! shared state, so one client can serve many concurrent requests.
//!
//! Every request is assembled by `build_request` first, which performs no
//! I/O, then handed to the transport. The auth channel follows transport
//! security:
//! - TLS: Basic credentials, or `consumer_key`/`consumer_secret` query
//!   parameters when `query_string_auth` is set; caller parameters are sent
//!   as query parameters next to them.
//! - plain HTTP: the caller parameters are folded into the canonical URL and
//!   the only auth channel is the signed OAuth parameter set.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::{ClientConfig, ClientOptions};
use crate::error::{ApiError, ConfigError};
use crate::http::{Auth, HttpMethod, HttpRequest, HttpResponse};
use crate::oauth::OAuthSigner;
use crate::params::ParameterSet;
use crate::transport::{ReqwestTransport, Transport};
use crate::url_builder::UrlBuilder;

pub const USER_AGENT: &str = concat!("WooCommerce REST API - Rust Client/", env!("CARGO_PKG_VERSION"));
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

/// Client for the store REST API.
#[derive(Debug)]
pub struct WooCommerce<T = ReqwestTransport> {
    config: ClientConfig,
    urls: UrlBuilder,
    signer: OAuthSigner,
    transport: T,
}

impl WooCommerce<ReqwestTransport> {
    /// Build a client that sends requests with `reqwest`.
    ///
    /// # Errors
    /// Returns `ConfigError` if a required option is missing or invalid.
    pub fn new(options: ClientOptions) -> Result<Self, ConfigError> {
        Self::with_transport(options, ReqwestTransport::new())
    }
}

impl<T: Transport> WooCommerce<T> {
    /// Build a client on top of an existing transport.
    ///
    /// # Errors
    /// Returns `ConfigError` if a required option is missing or invalid.
    pub fn with_transport(options: ClientOptions, transport: T) -> Result<Self, ConfigError> {
        let config = ClientConfig::new(options)?;
        let urls = UrlBuilder::new(config.url(), config.api_prefix(), config.version(), config.port());
        let signer = OAuthSigner::new(config.consumer_key(), config.consumer_secret());
        Ok(Self {
            config,
            urls,
            signer,
            transport,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_encrypted(&self) -> bool {
        self.urls.is_encrypted()
    }

    /// Fully-qualified URL for `endpoint`, canonicalized on plain HTTP.
    pub fn url_for(&self, endpoint: &str, params: &ParameterSet) -> String {
        self.urls.build(endpoint, params)
    }

    /// Assemble the request for one call without sending it.
    ///
    /// A `None` or JSON `null` body sends no body and no content type.
    ///
    /// # Errors
    /// `ApiError::Signing` if OAuth signing fails, `ApiError::Serialization`
    /// if the body cannot be written as JSON.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        params: &ParameterSet,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.urls.build(endpoint, params);

        let mut headers = vec![
            ("User-Agent".to_string(), USER_AGENT.to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];

        let (auth, query) = if self.urls.is_encrypted() {
            let auth = if self.config.query_string_auth() {
                Auth::QueryString {
                    consumer_key: self.config.consumer_key().to_string(),
                    consumer_secret: self.config.consumer_secret().to_string(),
                }
            } else {
                Auth::Basic {
                    username: self.config.consumer_key().to_string(),
                    password: self.config.consumer_secret().to_string(),
                }
            };
            (auth, params.flatten())
        } else {
            (Auth::OAuth(self.signer.sign(method.as_str(), &url)?), Vec::new())
        };

        let body = match body {
            None | Some(Value::Null) => None,
            Some(value) => {
                headers.push(("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()));
                Some(serde_json::to_string(value)?)
            }
        };

        let request = HttpRequest {
            method,
            url,
            headers,
            auth,
            params: query,
            body,
            timeout: self.config.timeout(),
            encoding: self.config.encoding(),
        };
        Ok(self.config.transport_override().apply(request))
    }

    /// Build and send one request.
    ///
    /// # Errors
    /// Anything `build_request` rejects, plus transport failures passed
    /// through unchanged as `ApiError::Transport`.
    #[instrument(skip(self, body, params))]
    pub async fn request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<&Value>,
        params: &ParameterSet,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(method, endpoint, body, params)?;
        debug!(url = %request.url, auth = request.auth.kind(), "dispatching request");
        let response = self.transport.send(request).await?;
        debug!(status = response.status, "request completed");
        Ok(response)
    }

    pub async fn get(&self, endpoint: &str, params: &ParameterSet) -> Result<HttpResponse, ApiError> {
        self.request(HttpMethod::Get, endpoint, None, params).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        data: &B,
        params: &ParameterSet,
    ) -> Result<HttpResponse, ApiError> {
        let data = serde_json::to_value(data)?;
        self.request(HttpMethod::Post, endpoint, Some(&data), params).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        data: &B,
        params: &ParameterSet,
    ) -> Result<HttpResponse, ApiError> {
        let data = serde_json::to_value(data)?;
        self.request(HttpMethod::Put, endpoint, Some(&data), params).await
    }

    pub async fn delete(&self, endpoint: &str, params: &ParameterSet) -> Result<HttpResponse, ApiError> {
        self.request(HttpMethod::Delete, endpoint, None, params).await
    }

    pub async fn options(&self, endpoint: &str, params: &ParameterSet) -> Result<HttpResponse, ApiError> {
        self.request(HttpMethod::Options, endpoint, None, params).await
    }
}
