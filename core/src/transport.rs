//! The HTTP transport seam.
//!
//! The client never performs I/O itself: it builds an `HttpRequest` and
//! hands it to a `Transport`. `ReqwestTransport` is the production
//! implementation; `mock::RecordingTransport` captures requests for tests.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one request and returns the raw response.
///
/// Implementations decide which statuses count as failures. Whatever they
/// return is passed to the caller unchanged.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// `reqwest`-backed transport.
///
/// By default any non-2xx status is returned as `TransportError::Status`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    status_as_error: bool,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Use a preconfigured `reqwest::Client` (proxies, TLS roots, pools).
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            status_as_error: true,
        }
    }

    /// Return 4xx/5xx responses as data instead of errors.
    pub fn accept_all_statuses(mut self) -> Self {
        self.status_as_error = false;
        self
    }
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(reqwest_method(request.method), &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some((username, password)) = request.auth.basic_credentials() {
            builder = builder.basic_auth(username, Some(password));
        }
        let pairs = request.query_pairs();
        if !pairs.is_empty() {
            builder = builder.query(&pairs);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response.bytes().await?;
        let body = request.encoding.decode(&bytes);
        debug!(status, bytes = bytes.len(), "response received");

        if self.status_as_error && !(200..300).contains(&status) {
            return Err(TransportError::Status { status, body });
        }

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(clippy::unwrap_used, clippy::missing_panics_doc)]
pub mod mock {
    //! In-memory transport for tests.

    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::Transport;
    use crate::error::TransportError;
    use crate::http::{HttpRequest, HttpResponse};

    /// Records every request and answers with a canned response.
    #[derive(Debug)]
    pub struct RecordingTransport {
        response: Mutex<HttpResponse>,
        failure: Mutex<Option<(u16, String)>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl Default for RecordingTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RecordingTransport {
        /// Answers `200 {"ok":true}` until told otherwise.
        pub fn new() -> Self {
            Self {
                response: Mutex::new(HttpResponse {
                    status: 200,
                    headers: vec![("content-type".to_string(), "application/json".to_string())],
                    body: r#"{"ok":true}"#.to_string(),
                }),
                failure: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn respond_with(&self, response: HttpResponse) {
            *self.response.lock().unwrap() = response;
        }

        /// Fail subsequent calls with `TransportError::Status`.
        pub fn fail_with_status(&self, status: u16, body: impl Into<String>) {
            *self.failure.lock().unwrap() = Some((status, body.into()));
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn last_request(&self) -> Option<HttpRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            if let Some((status, body)) = self.failure.lock().unwrap().clone() {
                return Err(TransportError::Status { status, body });
            }
            Ok(self.response.lock().unwrap().clone())
        }
    }
}
