//! One-legged OAuth 1.0a request signing with HMAC-SHA256.
//!
//! # Design
//! Only consumer credentials take part; there is no token, so the signing
//! key is always `enc(consumer_secret) + "&"`. The resulting parameters ride
//! in the query string, never in an `Authorization` header.
//!
//! Signature base string:
//!
//! ```text
//! METHOD & enc(url without query) & enc(k1=v1&k2=v2...)
//! ```
//!
//! where the parameter list is the OAuth parameters (minus the signature)
//! merged with the pairs already on the URL, each key and value encoded with
//! the RFC 3986 unreserved set and sorted by encoded key.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::SigningError;
use crate::query::split_query;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA256";
pub const OAUTH_VERSION: &str = "1.0";

/// RFC 3986 unreserved characters: `A-Z a-z 0-9 - . _ ~`.
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, RFC3986).to_string()
}

/// The full OAuth parameter set attached to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthParameters {
    pub consumer_key: String,
    pub nonce: String,
    pub signature: String,
    pub signature_method: String,
    pub timestamp: u64,
    pub version: String,
}

impl OAuthParameters {
    /// Query pairs in the order they are sent.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), self.nonce.clone()),
            ("oauth_signature_method".to_string(), self.signature_method.clone()),
            ("oauth_timestamp".to_string(), self.timestamp.to_string()),
            ("oauth_version".to_string(), self.version.clone()),
            ("oauth_signature".to_string(), self.signature.clone()),
        ]
    }
}

/// Signs requests with a consumer key/secret pair.
///
/// Holds no mutable state; one signer can serve concurrent requests.
#[derive(Clone)]
pub struct OAuthSigner {
    consumer_key: String,
    consumer_secret: String,
}

impl std::fmt::Debug for OAuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSigner")
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

impl OAuthSigner {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Sign `method url` with a fresh nonce and the current time.
    ///
    /// # Errors
    /// `SigningError::Clock` if the system clock reads before the epoch,
    /// `SigningError::InvalidKey` if HMAC rejects the key.
    pub fn sign(&self, method: &str, url: &str) -> Result<OAuthParameters, SigningError> {
        self.sign_with(method, url, &generate_nonce(), unix_timestamp()?)
    }

    /// Sign with a caller-chosen nonce and timestamp.
    pub fn sign_with(
        &self,
        method: &str,
        url: &str,
        nonce: &str,
        timestamp: u64,
    ) -> Result<OAuthParameters, SigningError> {
        let mut params = OAuthParameters {
            consumer_key: self.consumer_key.clone(),
            nonce: nonce.to_string(),
            signature: String::new(),
            signature_method: SIGNATURE_METHOD.to_string(),
            timestamp,
            version: OAUTH_VERSION.to_string(),
        };
        let base = signature_base_string(method, url, &params);
        params.signature = self.hmac_base64(&base)?;
        Ok(params)
    }

    /// `enc(consumer_secret)&` followed by the empty token secret.
    pub fn signing_key(&self) -> String {
        format!("{}&", percent_encode(&self.consumer_secret))
    }

    fn hmac_base64(&self, base: &str) -> Result<String, SigningError> {
        let mut mac = HmacSha256::new_from_slice(self.signing_key().as_bytes())
            .map_err(|_| SigningError::InvalidKey)?;
        mac.update(base.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

/// Build the string that gets signed. `oauth.signature` is ignored.
pub fn signature_base_string(method: &str, url: &str, oauth: &OAuthParameters) -> String {
    let (base_url, query) = split_query(url);
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(base_url),
        percent_encode(&parameter_string(oauth, query))
    )
}

fn parameter_string(oauth: &OAuthParameters, query: Option<&str>) -> String {
    let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in oauth.to_pairs() {
        if key != "oauth_signature" {
            merged.insert(key, vec![value]);
        }
    }
    // URL pairs replace OAuth pairs of the same name, and accumulate among themselves.
    let mut from_url: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in query.map(deparam).unwrap_or_default() {
        from_url.entry(key).or_default().push(value);
    }
    merged.extend(from_url);

    let mut encoded: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, mut values) in merged {
        values.sort();
        encoded
            .entry(percent_encode(&key))
            .or_default()
            .extend(values.iter().map(|v| percent_encode(v)));
    }

    encoded
        .iter()
        .flat_map(|(key, values)| values.iter().map(move |value| format!("{key}={value}")))
        .collect::<Vec<_>>()
        .join("&")
}

/// Split a raw query into pairs: key verbatim, value percent-decoded.
/// Empty pieces (a bare trailing `?` or `&&`) contribute nothing.
fn deparam(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
            let value = percent_decode_str(value).decode_utf8_lossy().into_owned();
            (key.to_string(), value)
        })
        .collect()
}

/// 32 lowercase hex characters from a v4 UUID.
pub fn generate_nonce() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn unix_timestamp() -> Result<u64, SigningError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|_| SigningError::Clock)
}
