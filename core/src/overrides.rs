//! Raw request overrides applied after the client has assembled a request.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::{merge_pairs, Auth, Encoding, HttpMethod, HttpRequest};

/// Passthrough settings merged last into every request.
///
/// The merge is shallow: a field that is set replaces the whole
/// corresponding request field (setting `headers` drops the default
/// `User-Agent`/`Accept` headers unless they are repeated here).
///
/// `params` replaces the entire outgoing query, including the OAuth or
/// `consumer_key`/`consumer_secret` pairs; only a Basic header survives it.
/// `auth` replaces the Basic credentials; on a channel that authenticates
/// through the query the existing pairs stay in the query next to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportOverride {
    pub method: Option<HttpMethod>,
    pub url: Option<String>,
    pub headers: Option<BTreeMap<String, String>>,
    pub params: Option<BTreeMap<String, String>>,
    /// Milliseconds.
    pub timeout: Option<u64>,
    pub encoding: Option<Encoding>,
    pub body: Option<String>,
    pub auth: Option<BasicCredentials>,
}

/// Username and password for an HTTP Basic header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl TransportOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce a new request with every set field replaced.
    pub fn apply(&self, request: HttpRequest) -> HttpRequest {
        let mut auth = request.auth;
        let mut params = request.params;

        if let Some(replacement) = &self.params {
            params = pairs(replacement);
            if !matches!(auth, Auth::Basic { .. }) {
                auth = Auth::None;
            }
        }
        if let Some(basic) = &self.auth {
            params = merge_pairs(auth.query_pairs(), &params);
            auth = Auth::Basic {
                username: basic.username.clone(),
                password: basic.password.clone(),
            };
        }

        HttpRequest {
            method: self.method.unwrap_or(request.method),
            url: self.url.clone().unwrap_or(request.url),
            headers: self.headers.as_ref().map_or(request.headers, pairs),
            auth,
            params,
            body: self.body.clone().or(request.body),
            timeout: self.timeout.map(Duration::from_millis).or(request.timeout),
            encoding: self.encoding.unwrap_or(request.encoding),
        }
    }
}

fn pairs(map: &BTreeMap<String, String>) -> Vec<(String, String)> {
    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}
