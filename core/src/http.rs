//! HTTP request and response descriptions passed to and from the transport.
//!
//! # Design
//! These types describe requests as plain data. The client assembles an
//! `HttpRequest` and hands it to a `Transport`; nothing here touches the
//! network. Every request carries exactly one auth channel in `auth`, chosen
//! by transport security and configuration.
//!
//! All fields use owned types so a request can be moved into an async
//! transport without lifetime concerns.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;
use crate::oauth::OAuthParameters;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Charset used to decode response bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

impl Encoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin1",
        }
    }

    /// Decode raw body bytes. Invalid sequences become U+FFFD.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
                .collect(),
            Encoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }
}

impl FromStr for Encoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "ascii" => Ok(Encoding::Ascii),
            "latin1" | "latin-1" | "iso-8859-1" | "binary" => Ok(Encoding::Latin1),
            other => Err(ConfigError::InvalidOption {
                option: "encoding",
                reason: format!("unsupported charset '{other}'"),
            }),
        }
    }
}

impl Serialize for Encoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Encoding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// How a request authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// HTTP Basic credentials (TLS only).
    Basic { username: String, password: String },
    /// `consumer_key`/`consumer_secret` query parameters (TLS only).
    QueryString { consumer_key: String, consumer_secret: String },
    /// Signed OAuth 1.0a parameters (plain HTTP).
    OAuth(OAuthParameters),
    /// Nothing beyond what the caller put in `params`.
    None,
}

impl Auth {
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::Basic { .. } => "basic",
            Auth::QueryString { .. } => "query-string",
            Auth::OAuth(_) => "oauth1",
            Auth::None => "none",
        }
    }

    /// Query pairs this channel contributes. Basic contributes none.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self {
            Auth::Basic { .. } | Auth::None => Vec::new(),
            Auth::QueryString {
                consumer_key,
                consumer_secret,
            } => vec![
                ("consumer_key".to_string(), consumer_key.clone()),
                ("consumer_secret".to_string(), consumer_secret.clone()),
            ],
            Auth::OAuth(oauth) => oauth.to_pairs(),
        }
    }

    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match self {
            Auth::Basic { username, password } => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `WooCommerce::build_request`. Constructed per call, consumed
/// once by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub auth: Auth,
    /// Caller parameters sent next to the auth pairs (encrypted connections only).
    pub params: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
    pub encoding: Encoding,
}

impl HttpRequest {
    /// Auth pairs followed by `params`; a later pair replaces an earlier one
    /// with the same key, keeping the earlier position.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        merge_pairs(self.auth.query_pairs(), &self.params)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Append `later` to `pairs`; a later pair replaces an earlier one with the
/// same key, keeping the earlier position.
pub(crate) fn merge_pairs(mut pairs: Vec<(String, String)>, later: &[(String, String)]) -> Vec<(String, String)> {
    for (key, value) in later {
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.clone(),
            None => pairs.push((key.clone(), value.clone())),
        }
    }
    pairs
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The body as opaque JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(auth: Auth, params: Vec<(&str, &str)>) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: "https://test.dev/wp-json/wc/v3/orders".to_string(),
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            auth,
            params: params.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            body: None,
            timeout: None,
            encoding: Encoding::Utf8,
        }
    }

    #[test]
    fn query_string_auth_comes_first() {
        let req = request(
            Auth::QueryString {
                consumer_key: "ck".to_string(),
                consumer_secret: "cs".to_string(),
            },
            vec![("page", "2")],
        );
        assert_eq!(
            req.query_pairs(),
            vec![
                ("consumer_key".to_string(), "ck".to_string()),
                ("consumer_secret".to_string(), "cs".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn later_params_replace_same_key() {
        let req = request(
            Auth::QueryString {
                consumer_key: "ck".to_string(),
                consumer_secret: "cs".to_string(),
            },
            vec![("consumer_key", "other")],
        );
        assert_eq!(req.query_pairs()[0], ("consumer_key".to_string(), "other".to_string()));
        assert_eq!(req.query_pairs().len(), 2);
    }

    #[test]
    fn basic_auth_adds_no_pairs() {
        let req = request(
            Auth::Basic {
                username: "ck".to_string(),
                password: "cs".to_string(),
            },
            vec![],
        );
        assert!(req.query_pairs().is_empty());
        assert_eq!(req.auth.basic_credentials(), Some(("ck", "cs")));
        assert_eq!(req.header("accept"), Some("application/json"));
    }

    #[test]
    fn encoding_parses_known_charsets() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("utf8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("ascii".parse::<Encoding>().unwrap(), Encoding::Ascii);
        assert_eq!("Latin1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert_eq!("ISO-8859-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert!("shift_jis".parse::<Encoding>().is_err());
    }

    #[test]
    fn latin1_decoding_maps_bytes_to_code_points() {
        assert_eq!(Encoding::Latin1.decode(&[0x63, 0x61, 0x66, 0xE9]), "café");
        assert_eq!(Encoding::Latin1.decode("é".as_bytes()), "Ã©");
        let parsed: Encoding = serde_json::from_str(r#""latin1""#).unwrap();
        assert_eq!(parsed, Encoding::Latin1);
    }

    #[test]
    fn ascii_decoding_replaces_high_bytes() {
        assert_eq!(Encoding::Ascii.decode("é!".as_bytes()), "\u{FFFD}\u{FFFD}!");
        assert_eq!(Encoding::Utf8.decode("é!".as_bytes()), "é!");
    }

    #[test]
    fn response_body_is_opaque_json() {
        let response = HttpResponse {
            status: 201,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: r#"{"ok":true}"#.to_string(),
        };
        assert!(response.is_success());
        assert_eq!(response.json().unwrap()["ok"], true);
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn method_names_are_uppercase() {
        assert_eq!(HttpMethod::Options.to_string(), "OPTIONS");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }
}
