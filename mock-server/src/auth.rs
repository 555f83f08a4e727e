//! Request authentication for the mock store.
//!
//! Accepts the three channels a real store accepts: HTTP Basic, credentials
//! in the query string, and one-legged OAuth 1.0a HMAC-SHA256 parameters in
//! the query string. The OAuth check is written independently of the client
//! crate so integration tests catch any drift between the two.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Accepted clock skew for `oauth_timestamp`, in seconds.
pub const TIMESTAMP_WINDOW_SECS: u64 = 15 * 60;

const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

#[derive(Clone, Debug)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

/// Which channel authenticated a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    Basic,
    QueryString,
    OAuth,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthFailure {
    MissingCredentials,
    InvalidCredentials,
    UnsupportedSignatureMethod(String),
    StaleTimestamp,
    NonceReused,
    InvalidSignature,
}

impl AuthFailure {
    pub fn message(&self) -> String {
        match self {
            AuthFailure::MissingCredentials => "Consumer key is missing.".to_string(),
            AuthFailure::InvalidCredentials => "Consumer key or secret is invalid.".to_string(),
            AuthFailure::UnsupportedSignatureMethod(m) => format!("Invalid signature method: {m}"),
            AuthFailure::StaleTimestamp => "Invalid timestamp.".to_string(),
            AuthFailure::NonceReused => "Invalid nonce - nonce has already been used.".to_string(),
            AuthFailure::InvalidSignature => "Invalid signature - provided signature does not match.".to_string(),
        }
    }
}

/// What the verifier needs to know about an incoming request.
pub struct IncomingRequest<'a> {
    pub method: &'a str,
    /// Scheme, host and path, without query.
    pub base_url: String,
    pub raw_query: Option<&'a str>,
    pub authorization: Option<&'a str>,
}

pub struct Authenticator {
    credentials: Credentials,
    seen_nonces: Mutex<HashSet<String>>,
}

impl Authenticator {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            seen_nonces: Mutex::new(HashSet::new()),
        }
    }

    pub fn authenticate(&self, request: &IncomingRequest<'_>) -> Result<AuthMode, AuthFailure> {
        if let Some((user, pass)) = request.authorization.and_then(basic_credentials) {
            return self.check_pair(&user, &pass).map(|()| AuthMode::Basic);
        }

        let pairs = request.raw_query.map(form_pairs).unwrap_or_default();
        let lookup = |name: &str| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());

        if let (Some(key), Some(secret)) = (lookup("consumer_key"), lookup("consumer_secret")) {
            return self.check_pair(key, secret).map(|()| AuthMode::QueryString);
        }
        if lookup("oauth_signature").is_some() {
            return self.verify_oauth(request, &pairs).map(|()| AuthMode::OAuth);
        }
        Err(AuthFailure::MissingCredentials)
    }

    fn check_pair(&self, key: &str, secret: &str) -> Result<(), AuthFailure> {
        if key == self.credentials.consumer_key && secret == self.credentials.consumer_secret {
            Ok(())
        } else {
            Err(AuthFailure::InvalidCredentials)
        }
    }

    fn verify_oauth(&self, request: &IncomingRequest<'_>, pairs: &[(String, String)]) -> Result<(), AuthFailure> {
        let lookup = |name: &str| pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str());

        if lookup("oauth_consumer_key") != Some(self.credentials.consumer_key.as_str()) {
            return Err(AuthFailure::InvalidCredentials);
        }
        let method = lookup("oauth_signature_method").unwrap_or_default();
        if method != "HMAC-SHA256" {
            return Err(AuthFailure::UnsupportedSignatureMethod(method.to_string()));
        }

        let timestamp: u64 = lookup("oauth_timestamp")
            .and_then(|t| t.parse().ok())
            .ok_or(AuthFailure::StaleTimestamp)?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        if now.abs_diff(timestamp) > TIMESTAMP_WINDOW_SECS {
            return Err(AuthFailure::StaleTimestamp);
        }

        let provided = lookup("oauth_signature")
            .and_then(|s| STANDARD.decode(s).ok())
            .ok_or(AuthFailure::InvalidSignature)?;
        let base = base_string(request.method, &request.base_url, pairs);
        let key = format!("{}&", encode(&self.credentials.consumer_secret));
        let mut mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|_| AuthFailure::InvalidSignature)?;
        mac.update(base.as_bytes());
        mac.verify_slice(&provided).map_err(|_| AuthFailure::InvalidSignature)?;

        let nonce = lookup("oauth_nonce").unwrap_or_default().to_string();
        let mut seen = self.seen_nonces.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !seen.insert(format!("{timestamp}:{nonce}")) {
            return Err(AuthFailure::NonceReused);
        }
        Ok(())
    }
}

/// `METHOD&enc(base_url)&enc(sorted encoded pairs)`, `oauth_signature` excluded.
pub fn base_string(method: &str, base_url: &str, pairs: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = pairs
        .iter()
        .filter(|(k, _)| k != "oauth_signature")
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    encoded.sort();
    let params = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}&{}&{}", method.to_uppercase(), encode(base_url), encode(&params))
}

fn encode(input: &str) -> String {
    utf8_percent_encode(input, UNRESERVED).to_string()
}

/// Decode an `application/x-www-form-urlencoded` query into pairs.
pub fn form_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            let (k, v) = piece.split_once('=').unwrap_or((piece, ""));
            (form_decode(k), form_decode(v))
        })
        .collect()
}

fn form_decode(input: &str) -> String {
    percent_decode_str(&input.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

fn basic_credentials(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
